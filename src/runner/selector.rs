use crate::config::{RetryConfig, Timing};
use crate::model::{display_confirms, match_option, MatchKind};
use crate::surface::ControlSurface;
use crate::{Error, Result};
use tracing::{debug, info, warn};

/// Pause before a failed liveness check is taken at its word.
const LIVENESS_RECHECK_MS: u64 = 500;

/// True only if the page fails two liveness checks around a pause. A single
/// failure is common while the widget rebuilds its DOM.
pub(crate) async fn page_gone<S>(surface: &S) -> bool
where
    S: ControlSurface + ?Sized,
{
    if surface.is_alive().await {
        return false;
    }
    debug!("liveness check failed, checking again");
    surface.wait(LIVENESS_RECHECK_MS).await;
    !surface.is_alive().await
}

/// Outcome of a verified selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Activations it took, 1-based.
    pub attempts: u32,
    pub kind: MatchKind,
    /// Display text that confirmed the selection.
    pub displayed: String,
}

/// Open a control, pick the matching option, confirm the display, retry.
#[derive(Debug, Clone)]
pub struct OptionSelector {
    /// Pause between failed attempts.
    pub backoff_ms: u64,
    /// Pause after opening a menu.
    pub open_ms: u64,
    /// Pause after activating an option.
    pub settle_ms: u64,
}

impl OptionSelector {
    pub fn new(retry: &RetryConfig, timing: &Timing) -> Self {
        Self {
            backoff_ms: retry.delay_ms,
            open_ms: timing.open_ms,
            settle_ms: timing.settle_ms,
        }
    }

    /// Select `value` on `control`, making at most `max_attempts` activations.
    pub async fn select<S>(
        &self,
        surface: &S,
        control: &str,
        value: &str,
        max_attempts: u32,
    ) -> Result<Selection>
    where
        S: ControlSurface + ?Sized,
    {
        self.run(surface, control, value, max_attempts, false).await
    }

    /// Lock a control that later selections are known to reset.
    ///
    /// Same contract as [`select`](Self::select), but open menus are cleared
    /// before every attempt and the page is left to go idle once it sticks.
    pub async fn force<S>(
        &self,
        surface: &S,
        control: &str,
        value: &str,
        max_attempts: u32,
    ) -> Result<Selection>
    where
        S: ControlSurface + ?Sized,
    {
        info!("forcing \"{}\" = \"{}\"", control, value);
        let selection = self.run(surface, control, value, max_attempts, true).await?;
        if let Err(e) = surface.settle().await {
            debug!("settle after forcing {}: {}", control, e);
        }
        info!("\"{}\" locked after {} attempt(s)", control, selection.attempts);
        Ok(selection)
    }

    async fn run<S>(
        &self,
        surface: &S,
        control: &str,
        value: &str,
        max_attempts: u32,
        forced: bool,
    ) -> Result<Selection>
    where
        S: ControlSurface + ?Sized,
    {
        let max_attempts = max_attempts.max(1);
        let mut last = None;

        for attempt in 1..=max_attempts {
            if page_gone(surface).await {
                return Err(page_lost(control, value));
            }
            debug!(
                "selecting \"{}\" for \"{}\" (attempt {}/{})",
                value, control, attempt, max_attempts
            );
            if forced {
                if let Err(e) = surface.dismiss().await {
                    debug!("dismiss before {}: {}", control, e);
                }
            }

            match self.attempt(surface, control, value).await {
                Ok((kind, displayed)) => {
                    return Ok(Selection {
                        attempts: attempt,
                        kind,
                        displayed,
                    });
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(
                        "\"{}\" = \"{}\": attempt {}/{} failed: {}",
                        control, value, attempt, max_attempts, e
                    );
                    last = Some(e);
                    if page_gone(surface).await {
                        return Err(page_lost(control, value));
                    }
                    if attempt < max_attempts {
                        if let Err(e) = surface.dismiss().await {
                            debug!("dismiss after failed attempt on {}: {}", control, e);
                        }
                        surface.wait(self.backoff_ms).await;
                    }
                }
            }
        }

        Err(Error::SelectionFailed {
            control: control.to_string(),
            value: value.to_string(),
            attempts: max_attempts,
            last: Box::new(last.unwrap_or_else(|| Error::ControlNotFound(control.to_string()))),
        })
    }

    /// One open, match, activate, verify pass.
    async fn attempt<S>(&self, surface: &S, control: &str, value: &str) -> Result<(MatchKind, String)>
    where
        S: ControlSurface + ?Sized,
    {
        surface.open(control).await?;
        surface.wait(self.open_ms).await;

        let entries = surface.options(control).await?;
        let found = match_option(&entries, value).ok_or_else(|| Error::OptionNotFound {
            control: control.to_string(),
            value: value.to_string(),
            available: entries.iter().map(|e| e.text.clone()).collect(),
        })?;

        surface.activate(control, found.index).await?;
        surface.wait(self.settle_ms).await;

        let displayed = surface.displayed_value(control).await?;
        if display_confirms(found.kind, &displayed, value) {
            Ok((found.kind, displayed))
        } else {
            Err(Error::NotApplied {
                control: control.to_string(),
                value: value.to_string(),
                displayed,
            })
        }
    }
}

fn page_lost(control: &str, value: &str) -> Error {
    Error::PageLost(format!("while selecting \"{}\" for \"{}\"", value, control))
}
