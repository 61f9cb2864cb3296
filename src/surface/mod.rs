//! The page as the selector, reader and driver see it.

mod page;
#[cfg(test)]
pub(crate) mod scripted;

pub use page::PageSurface;

use crate::model::OptionEntry;
use crate::Result;
use async_trait::async_trait;
use std::path::Path;

/// Named controls with open/list/activate/read semantics, plus the price
/// action and display. One implementation per page session; calls are
/// never issued concurrently.
#[async_trait(?Send)]
pub trait ControlSurface {
    /// Whether the page session is still usable.
    async fn is_alive(&self) -> bool;

    /// Sleep on the page clock.
    async fn wait(&self, ms: u64);

    /// Wait for pending network activity to finish.
    async fn settle(&self) -> Result<()>;

    /// Close any open option list.
    async fn dismiss(&self) -> Result<()>;

    /// Open the option list of `control`.
    async fn open(&self, control: &str) -> Result<()>;

    /// Entries of the option list of `control`, in page order.
    async fn options(&self, control: &str) -> Result<Vec<OptionEntry>>;

    /// Click the `index`th entry of `control`'s option list.
    async fn activate(&self, control: &str, index: usize) -> Result<()>;

    /// Text the control currently shows as its value.
    async fn displayed_value(&self, control: &str) -> Result<String>;

    /// Blank the price display so a stale price cannot be read back.
    async fn clear_price(&self) -> Result<()>;

    /// Trigger the price computation.
    async fn request_price(&self) -> Result<()>;

    /// Current price text, `None` while nothing is shown.
    async fn price_text(&self) -> Result<Option<String>>;

    /// Reload the page.
    async fn reload(&self) -> Result<()>;

    async fn screenshot(&self, path: &Path) -> Result<()>;
}
