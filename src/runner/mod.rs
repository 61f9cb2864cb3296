pub(crate) mod plan;
pub(crate) mod price;
pub(crate) mod selector;
pub(crate) mod sweep;

use crate::config::{BrowserConfig, Config};
use crate::output;
use crate::surface::PageSurface;
use crate::Result;
use eoka::{Browser, Page};
use sweep::{SweepDriver, SweepReport};
use tracing::{debug, info, warn};

/// Owns the browser session a sweep runs in.
pub struct Runner {
    browser: Browser,
    page: Page,
}

impl Runner {
    /// Launch a browser with the given config.
    pub async fn new(config: &BrowserConfig) -> Result<Self> {
        let stealth = eoka::StealthConfig {
            headless: config.headless,
            proxy: config.proxy.clone(),
            user_agent: config.user_agent.clone(),
            viewport_width: config.viewport.as_ref().map(|v| v.width).unwrap_or(1280),
            viewport_height: config.viewport.as_ref().map(|v| v.height).unwrap_or(720),
            ..Default::default()
        };

        debug!(
            "Launching browser (headless: {}, proxy: {:?})",
            config.headless, config.proxy
        );
        let browser = Browser::launch_with_config(stealth).await?;
        let page = browser.new_page("about:blank").await?;

        Ok(Self { browser, page })
    }

    /// Load the target, apply presets and sweep into the configured output.
    ///
    /// The output file exists once this returns, even when the sweep never
    /// got past navigation or presets.
    pub async fn run(&self, config: &Config) -> Result<SweepReport> {
        let surface = PageSurface::new(&self.page, config.widget.clone());
        let driver = SweepDriver::new(&surface, config);
        info!(
            "{} configurations x {} quantities",
            driver.plan().configuration_count(),
            driver.plan().quantities.len()
        );

        let mut sink = output::create(&config.output, &driver.plan().columns())?;
        if let Err(e) = self.prepare(config, &driver).await {
            sink.finish()?;
            return Err(e);
        }
        driver.run(sink.as_mut()).await
    }

    async fn prepare(
        &self,
        config: &Config,
        driver: &SweepDriver<'_, PageSurface<'_>>,
    ) -> Result<()> {
        info!("Navigating to: {}", config.target.url);
        self.page.goto(&config.target.url).await?;
        if let Err(e) = self.page.wait_for_network_idle(500, 10_000).await {
            warn!("Page did not go idle: {}", e);
        }
        self.page.wait(config.target.settle_ms).await;
        driver.apply_presets().await
    }

    /// Close the browser.
    pub async fn close(self) -> Result<()> {
        self.browser.close().await?;
        Ok(())
    }
}
