use serde::{Deserialize, Serialize};

/// CSS hooks into the configurator widget.
///
/// Every control is a `group` element holding a `label`, a `toggle` that
/// opens a `menu` of `item`s, each wrapping an `option` link, and a `display`
/// element that shows the current value. Numeric items carry their value in
/// `id_attr`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WidgetSelectors {
    pub group: String,
    pub label: String,
    pub toggle: String,
    pub menu: String,
    pub item: String,
    pub option: String,
    pub id_attr: String,
    pub display: String,
    pub price_button: String,
    /// Fallback when `price_button` matches nothing: any link or button with this text.
    pub price_button_text: String,
    pub price_display: String,
    /// Clicked to close any open menu.
    pub dismiss: String,
}

impl Default for WidgetSelectors {
    fn default() -> Self {
        Self {
            group: ".control-group".into(),
            label: "label.control-label".into(),
            toggle: "a.dropdown-toggle".into(),
            menu: "ul.dropdown-menu".into(),
            item: "li".into(),
            option: "a.filter-option".into(),
            id_attr: "data-value".into(),
            display: ".filter-text".into(),
            price_button: "a.filter-price-button".into(),
            price_button_text: "Select Quantity & Get Price".into(),
            price_display: ".product-price .price1".into(),
            dismiss: "body".into(),
        }
    }
}
