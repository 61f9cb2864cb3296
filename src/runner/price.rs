use crate::config::Timing;
use crate::surface::ControlSurface;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static PRICE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("invalid price regex"));

/// Parse a displayed price: currency symbols and thousands separators are
/// dropped, `.` is the decimal point.
pub fn parse_price(text: &str) -> Option<f64> {
    let m = PRICE_RE.find(text)?;
    m.as_str().replace(',', "").parse().ok()
}

/// Triggers the price action and reads the result.
#[derive(Debug, Clone)]
pub struct PriceReader {
    pub timeout_ms: u64,
    pub poll_ms: u64,
}

impl PriceReader {
    pub fn new(timing: &Timing) -> Self {
        Self {
            timeout_ms: timing.price_timeout_ms,
            poll_ms: timing.poll_ms,
        }
    }

    /// Price for whatever configuration and quantity the page currently shows.
    pub async fn read_price<S>(&self, surface: &S) -> Result<f64>
    where
        S: ControlSurface + ?Sized,
    {
        surface.clear_price().await?;
        surface.request_price().await?;

        let mut waited = 0;
        loop {
            if let Some(text) = surface.price_text().await? {
                debug!("price text after {}ms: {}", waited, text);
                return parse_price(&text)
                    .ok_or_else(|| Error::ReadFailed(format!("unparseable price \"{}\"", text)));
            }
            if waited >= self.timeout_ms {
                return Err(Error::ReadFailed(format!(
                    "no price shown within {}ms",
                    self.timeout_ms
                )));
            }
            let step = self.poll_ms.max(1).min(self.timeout_ms - waited);
            surface.wait(step).await;
            waited += step;
        }
    }
}
