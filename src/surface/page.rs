use super::ControlSurface;
use crate::config::WidgetSelectors;
use crate::model::OptionEntry;
use crate::{Error, Result};
use async_trait::async_trait;
use eoka::Page;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use tracing::debug;

/// Locates a control group by its label: exact label text first, then contains.
const FIND_GROUP_JS: &str = r#"
    const findGroup = (arg) => {
        const groups = Array.from(document.querySelectorAll(arg.w.group));
        const labelOf = (g) => ((g.querySelector(arg.w.label) || {}).textContent || '').trim();
        return groups.find(g => labelOf(g) === arg.control)
            || groups.find(g => labelOf(g).includes(arg.control))
            || null;
    };
"#;

const OPEN_JS: &str = r#"
    const g = findGroup(arg);
    if (!g) return 'group_not_found';
    const toggle = g.querySelector(arg.w.toggle);
    if (!toggle) return 'toggle_not_found';
    toggle.scrollIntoView({ block: 'center' });
    toggle.click();
    return 'ok';
"#;

const OPTIONS_JS: &str = r#"
    const g = findGroup(arg);
    if (!g) return null;
    const menu = g.querySelector(arg.w.menu);
    if (!menu) return '[]';
    const links = Array.from(menu.querySelectorAll(arg.w.option));
    return JSON.stringify(links.map(a => {
        const item = a.closest(arg.w.item);
        const id = (item && item.getAttribute(arg.w.id_attr)) || a.getAttribute(arg.w.id_attr);
        return { id: id, text: (a.textContent || '').trim() };
    }));
"#;

const ACTIVATE_JS: &str = r#"
    const g = findGroup(arg);
    if (!g) return 'group_not_found';
    const menu = g.querySelector(arg.w.menu);
    if (!menu) return 'menu_not_found';
    const link = menu.querySelectorAll(arg.w.option)[arg.index];
    if (!link) return 'option_missing';
    link.click();
    return 'ok';
"#;

const DISPLAY_JS: &str = r#"
    const g = findGroup(arg);
    if (!g) return null;
    const d = g.querySelector(arg.w.display);
    return d ? (d.innerText || d.textContent || '') : null;
"#;

const DISMISS_JS: &str = r#"
    const el = document.querySelector(arg.w.dismiss);
    if (el) el.click();
    return true;
"#;

const CLEAR_PRICE_JS: &str = r#"
    document.querySelectorAll(arg.w.price_display).forEach(el => { el.textContent = ''; });
    return true;
"#;

const REQUEST_PRICE_JS: &str = r#"
    const btn = document.querySelector(arg.w.price_button)
        || Array.from(document.querySelectorAll('a, button'))
            .find(el => (el.textContent || '').trim() === arg.w.price_button_text);
    if (!btn) return false;
    btn.scrollIntoView({ block: 'center' });
    btn.click();
    return true;
"#;

const PRICE_TEXT_JS: &str = r#"
    const el = document.querySelector(arg.w.price_display);
    if (!el) return null;
    const text = (el.innerText || el.textContent || '').trim();
    return text.length ? text : null;
"#;

#[derive(Deserialize)]
struct RawEntry {
    id: Option<String>,
    text: String,
}

/// A [`ControlSurface`] over a live browser page.
pub struct PageSurface<'a> {
    page: &'a Page,
    widget: WidgetSelectors,
}

impl<'a> PageSurface<'a> {
    pub fn new(page: &'a Page, widget: WidgetSelectors) -> Self {
        Self { page, widget }
    }

    /// Wrap a script body so it runs with `findGroup` and `arg` in scope.
    fn script(&self, body: &str, control: Option<&str>, index: Option<usize>) -> Result<String> {
        let arg = json!({
            "w": self.widget,
            "control": control,
            "index": index,
        });
        Ok(format!(
            "(() => {{ {prelude} const arg = {arg}; {body} }})()",
            prelude = FIND_GROUP_JS,
            arg = serde_json::to_string(&arg)?,
            body = body,
        ))
    }

    fn status(control: &str, status: &str) -> Result<()> {
        match status {
            "ok" => Ok(()),
            "group_not_found" => Err(Error::ControlNotFound(control.to_string())),
            other => Err(Error::Browser(eoka::Error::ElementNotFound(format!(
                "{} ({})",
                control, other
            )))),
        }
    }
}

#[async_trait(?Send)]
impl ControlSurface for PageSurface<'_> {
    async fn is_alive(&self) -> bool {
        let alive: eoka::Result<bool> = self.page.evaluate("true").await;
        alive.unwrap_or(false)
    }

    async fn wait(&self, ms: u64) {
        if ms > 0 {
            self.page.wait(ms).await;
        }
    }

    async fn settle(&self) -> Result<()> {
        self.page.wait_for_network_idle(500, 10_000).await?;
        Ok(())
    }

    async fn dismiss(&self) -> Result<()> {
        let js = self.script(DISMISS_JS, None, None)?;
        let _: bool = self.page.evaluate(&js).await?;
        Ok(())
    }

    async fn open(&self, control: &str) -> Result<()> {
        let js = self.script(OPEN_JS, Some(control), None)?;
        let status: String = self.page.evaluate(&js).await?;
        Self::status(control, &status)
    }

    async fn options(&self, control: &str) -> Result<Vec<OptionEntry>> {
        let js = self.script(OPTIONS_JS, Some(control), None)?;
        let json: Option<String> = self.page.evaluate(&js).await?;
        let json = json.ok_or_else(|| Error::ControlNotFound(control.to_string()))?;
        let raw: Vec<RawEntry> = serde_json::from_str(&json)?;
        debug!("{}: {} options", control, raw.len());
        Ok(raw
            .into_iter()
            .map(|r| OptionEntry {
                id: r.id,
                text: r.text,
            })
            .collect())
    }

    async fn activate(&self, control: &str, index: usize) -> Result<()> {
        let js = self.script(ACTIVATE_JS, Some(control), Some(index))?;
        let status: String = self.page.evaluate(&js).await?;
        Self::status(control, &status)
    }

    async fn displayed_value(&self, control: &str) -> Result<String> {
        let js = self.script(DISPLAY_JS, Some(control), None)?;
        let text: Option<String> = self.page.evaluate(&js).await?;
        text.ok_or_else(|| Error::ControlNotFound(control.to_string()))
    }

    async fn clear_price(&self) -> Result<()> {
        let js = self.script(CLEAR_PRICE_JS, None, None)?;
        let _: bool = self.page.evaluate(&js).await?;
        Ok(())
    }

    async fn request_price(&self) -> Result<()> {
        let js = self.script(REQUEST_PRICE_JS, None, None)?;
        let clicked: bool = self.page.evaluate(&js).await?;
        if !clicked {
            return Err(Error::ReadFailed(format!(
                "price button '{}' not found",
                self.widget.price_button_text
            )));
        }
        Ok(())
    }

    async fn price_text(&self) -> Result<Option<String>> {
        let js = self.script(PRICE_TEXT_JS, None, None)?;
        Ok(self.page.evaluate(&js).await?)
    }

    async fn reload(&self) -> Result<()> {
        self.page.reload().await?;
        self.settle().await
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        let data = self.page.screenshot().await?;
        std::fs::write(path, data)?;
        Ok(())
    }
}
