use super::plan::SweepPlan;
use super::price::PriceReader;
use super::selector::{page_gone, OptionSelector};
use crate::config::{Config, OnFailure};
use crate::model::{Configuration, Outcome, Quote, Setting};
use crate::output::QuoteSink;
use crate::surface::ControlSurface;
use crate::{Error, Result};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Totals for a finished (or aborted) sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Configurations visited.
    pub configurations: usize,
    /// Configurations that could not be applied.
    pub failed_configurations: usize,
    /// Records written.
    pub quotes: usize,
    /// Records carrying a price.
    pub priced: usize,
    /// Records carrying `ERROR` or `CONFIG ERROR`.
    pub errors: usize,
    pub duration_ms: u64,
}

impl SweepReport {
    fn tally(&mut self, outcome: &Outcome) {
        self.quotes += 1;
        if outcome.is_price() {
            self.priced += 1;
        } else {
            self.errors += 1;
        }
    }
}

/// Walks every configuration and quantity of a sweep over one surface.
pub struct SweepDriver<'a, S: ControlSurface + ?Sized> {
    surface: &'a S,
    plan: SweepPlan,
    selector: OptionSelector,
    reader: PriceReader,
    attempts: u32,
    forced_attempts: u32,
    nudge_rounds: u32,
    between_ms: u64,
    reload_settle_ms: u64,
    on_failure: OnFailure,
}

impl<'a, S: ControlSurface + ?Sized> SweepDriver<'a, S> {
    pub fn new(surface: &'a S, config: &Config) -> Self {
        Self {
            surface,
            plan: SweepPlan::from_config(config),
            selector: OptionSelector::new(&config.retry, &config.timing),
            reader: PriceReader::new(&config.timing),
            attempts: config.retry.attempts,
            forced_attempts: config.retry.forced_attempts,
            nudge_rounds: config.retry.nudge_rounds,
            between_ms: config.timing.between_ms,
            reload_settle_ms: config.target.settle_ms,
            on_failure: config.on_failure.clone(),
        }
    }

    pub fn plan(&self) -> &SweepPlan {
        &self.plan
    }

    /// Select the fixed values that hold for the whole sweep.
    pub async fn apply_presets(&self) -> Result<()> {
        for (control, value) in &self.plan.presets {
            info!("Preset \"{}\" = \"{}\"", control, value);
            self.selector
                .select(self.surface, control, value, self.attempts)
                .await?;
            self.surface.wait(self.between_ms).await;
        }
        Ok(())
    }

    /// Put every control of `configuration` into its value, in order.
    ///
    /// Forced settings are re-locked whenever a later control that resets
    /// them is selected.
    pub async fn apply(&self, configuration: &Configuration) -> Result<()> {
        if let Err(e) = self.surface.dismiss().await {
            debug!("dismiss before configuration: {}", e);
        }

        for (i, setting) in configuration.settings.iter().enumerate() {
            self.set_on_axis(i, setting).await?;

            let resets = &self.plan.axes[i].resets;
            for earlier in configuration.settings[..i]
                .iter()
                .filter(|s| s.forced && resets.contains(&s.control))
            {
                debug!(
                    "\"{}\" resets \"{}\", locking it again",
                    setting.control, earlier.control
                );
                self.set(&earlier.control, &earlier.value, true).await?;
            }

            self.surface.wait(self.between_ms).await;
        }
        Ok(())
    }

    /// Set one axis. A `nudge` axis that fails gets another of its values
    /// selected before the next round.
    async fn set_on_axis(&self, i: usize, setting: &Setting) -> Result<()> {
        let axis = &self.plan.axes[i];
        let rounds = if axis.nudge { self.nudge_rounds.max(1) } else { 1 };

        let mut round = 1;
        loop {
            let err = match self
                .set(&setting.control, &setting.value, setting.forced)
                .await
            {
                Ok(()) => return Ok(()),
                Err(e) if e.is_fatal() || round >= rounds => return Err(e),
                Err(e) => e,
            };
            let Some(other) = axis.settings.iter().find(|s| s.value != setting.value) else {
                return Err(err);
            };

            warn!(
                "\"{}\" = \"{}\" did not stick (round {}/{}), nudging via \"{}\"",
                setting.control, setting.value, round, rounds, other.value
            );
            match self
                .selector
                .select(self.surface, &setting.control, &other.value, 1)
                .await
            {
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => debug!("nudge to \"{}\" failed: {}", other.value, e),
                Ok(_) => {}
            }
            self.surface.wait(self.between_ms).await;
            round += 1;
        }
    }

    async fn set(&self, control: &str, value: &str, forced: bool) -> Result<()> {
        if forced {
            self.selector
                .force(self.surface, control, value, self.forced_attempts)
                .await?;
        } else {
            self.selector
                .select(self.surface, control, value, self.attempts)
                .await?;
        }
        Ok(())
    }

    /// Select `quantity` and read the price shown for it.
    pub async fn quote(&self, quantity: &str) -> Result<f64> {
        self.selector
            .select(self.surface, &self.plan.quantity_control, quantity, self.attempts)
            .await?;
        self.reader.read_price(self.surface).await
    }

    /// Run the whole sweep, writing one record per (configuration, quantity).
    ///
    /// Only page loss aborts; the sink is finished either way.
    pub async fn run<W>(&self, sink: &mut W) -> Result<SweepReport>
    where
        W: QuoteSink + ?Sized,
    {
        let start = Instant::now();
        let total = self.plan.configuration_count();
        let mut report = SweepReport::default();

        let result = self.sweep(sink, total, &mut report).await;
        sink.finish()?;
        report.duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(()) => {
                info!(
                    "Sweep done: {} configurations, {} priced, {} errors",
                    report.configurations, report.priced, report.errors
                );
                Ok(report)
            }
            Err(e) => {
                warn!(
                    "Sweep aborted after {} of {} configurations: {}",
                    report.configurations, total, e
                );
                Err(e)
            }
        }
    }

    async fn sweep<W>(&self, sink: &mut W, total: usize, report: &mut SweepReport) -> Result<()>
    where
        W: QuoteSink + ?Sized,
    {
        for configuration in self.plan.configurations() {
            info!(
                "[{}/{}] {}",
                configuration.index + 1,
                total,
                configuration
            );
            report.configurations += 1;
            sink.begin(&configuration)?;
            let result = self.visit(&configuration, sink, report).await;
            sink.end(&configuration)?;
            result?;
        }
        Ok(())
    }

    async fn visit<W>(
        &self,
        configuration: &Configuration,
        sink: &mut W,
        report: &mut SweepReport,
    ) -> Result<()>
    where
        W: QuoteSink + ?Sized,
    {
        if let Err(e) = self.apply(configuration).await {
            if e.is_fatal() {
                return Err(e);
            }
            warn!("{}: configuration not applied: {}", configuration, e);
            report.failed_configurations += 1;
            for quantity in &self.plan.quantities {
                let quote = Quote {
                    quantity: quantity.clone(),
                    outcome: Outcome::ConfigError(e.to_string()),
                };
                sink.record(configuration, &quote)?;
                report.tally(&quote.outcome);
            }
            return self.recover(configuration).await;
        }

        for quantity in &self.plan.quantities {
            let outcome = match self.quote(quantity).await {
                Ok(price) => Outcome::Price(price - self.plan.price_adjustment),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("{} qty {}: {}", configuration, quantity, e);
                    Outcome::Error(e.to_string())
                }
            };
            info!("{} qty {} -> {}", configuration, quantity, outcome.marker());
            let quote = Quote {
                quantity: quantity.clone(),
                outcome,
            };
            sink.record(configuration, &quote)?;
            report.tally(&quote.outcome);
            self.surface.wait(self.between_ms).await;
        }
        Ok(())
    }

    /// Screenshot, then reload and re-apply presets so the next
    /// configuration starts from a known page.
    async fn recover(&self, configuration: &Configuration) -> Result<()> {
        if let Some(ref template) = self.on_failure.screenshot {
            let path = screenshot_path(template, &configuration.label());
            info!("Saving failure screenshot to: {}", path.display());
            if let Err(e) = self.surface.screenshot(&path).await {
                warn!("Failed to save screenshot: {}", e);
            }
        }

        if !self.on_failure.reload {
            return Ok(());
        }

        info!("Reloading page");
        if let Err(e) = self.surface.reload().await {
            if page_gone(self.surface).await {
                return Err(Error::PageLost(format!("reload failed: {}", e)));
            }
            warn!("Reload failed: {}", e);
            return Ok(());
        }
        self.surface.wait(self.reload_settle_ms).await;

        match self.apply_presets().await {
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!("Presets not restored after reload: {}", e);
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    }
}

fn screenshot_path(template: &str, label: &str) -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
    PathBuf::from(
        template
            .replace("{label}", label)
            .replace("{timestamp}", &timestamp),
    )
}
