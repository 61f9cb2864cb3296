//! # quote-sweep
//!
//! Sweep a print-product pricing configurator: set every combination of
//! options, verify each selection actually took, read the price, and write
//! one record per (configuration, quantity) to a text or CSV file.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quote_sweep::{Config, Runner};
//!
//! # #[tokio::main]
//! # async fn main() -> quote_sweep::Result<()> {
//! let config = Config::load("configs/a5-perfect-bound.yaml")?;
//! let runner = Runner::new(&config.browser).await?;
//! let report = runner.run(&config).await?;
//! println!("{} priced, {} errors", report.priced, report.errors);
//! runner.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod model;
pub mod output;
pub mod surface;

mod runner;

pub use config::{
    BrowserConfig, Config, Dimension, OptionSpec, OutputFormat, ParamDef, Params, WidgetSelectors,
};
pub use model::{Configuration, MatchKind, OptionEntry, Outcome, Quote, Setting};
pub use runner::plan::{Axis, Configurations, SweepPlan};
pub use runner::price::{parse_price, PriceReader};
pub use runner::selector::{OptionSelector, Selection};
pub use runner::sweep::{SweepDriver, SweepReport};
pub use runner::Runner;
pub use surface::{ControlSurface, PageSurface};

/// Result type for quote-sweep operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading a sweep or driving the page.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("browser error: {0}")]
    Browser(#[from] eoka::Error),

    #[error("control \"{0}\" not found")]
    ControlNotFound(String),

    #[error("option \"{value}\" not found for \"{control}\" (available: {available:?})")]
    OptionNotFound {
        control: String,
        value: String,
        available: Vec<String>,
    },

    #[error("\"{control}\" shows \"{displayed}\" after selecting \"{value}\"")]
    NotApplied {
        control: String,
        value: String,
        displayed: String,
    },

    #[error("failed selecting \"{value}\" for \"{control}\" after {attempts} attempts: {last}")]
    SelectionFailed {
        control: String,
        value: String,
        attempts: u32,
        #[source]
        last: Box<Error>,
    },

    #[error("price read failed: {0}")]
    ReadFailed(String),

    #[error("page lost: {0}")]
    PageLost(String),
}

impl Error {
    /// Errors that end the whole run rather than one configuration or quote.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::PageLost(_) => true,
            Self::SelectionFailed { last, .. } => last.is_fatal(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
name: "Test"
target:
  url: "https://example.com"
dimensions:
  - control: "Cover Stock"
    options: ["250gsm Gloss Artboard"]
quantity:
  values: [5, 10]
output:
  path: "out.txt"
"#;

    #[test]
    fn test_parse_minimal_config() {
        let config = Config::parse(MINIMAL).unwrap();
        assert_eq!(config.name, "Test");
        assert_eq!(config.target.url, "https://example.com");
        assert_eq!(config.quantity.control, "Quantity");
        assert_eq!(config.quantity.values(), vec!["5", "10"]);
        assert!(!config.browser.headless);
        assert!(config.presets.is_empty());
        assert_eq!(config.output.format, OutputFormat::Text);
        assert_eq!(config.output.price_adjustment, 0.0);
    }

    #[test]
    fn test_default_values() {
        let config = Config::parse(MINIMAL).unwrap();
        assert_eq!(config.retry.attempts, 3);
        assert_eq!(config.retry.forced_attempts, 3);
        assert_eq!(config.retry.delay_ms, 600);
        assert_eq!(config.timing.settle_ms, 400);
        assert_eq!(config.timing.price_timeout_ms, 20_000);
        assert_eq!(config.target.settle_ms, 2000);
        assert!(config.on_failure.reload);
        assert!(config.on_failure.screenshot.is_none());
        assert_eq!(config.widget.id_attr, "data-value");
        assert_eq!(config.widget.price_display, ".product-price .price1");
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
name: "A5 perfect bound"
browser:
  headless: true
  viewport: { width: 1400, height: 900 }
target:
  url: "https://example.com/perfect-bound"
  settle_ms: 500
widget:
  toggle: "a.dropdown-toggle.filter-button"
presets:
  - control: "Finished Size (mm)"
    value: "A5 Portrait - 148x210"
label_prefix: "A5P"
dimensions:
  - control: "Cover Printing"
    options:
      - { value: "Full Colour (CMYK) one side", code: "ones" }
  - control: "Internal/Text Pages Printing"
    forced: true
    options:
      - { value: "Full Colour (CMYK) two sides", code: "FC" }
  - control: "Internal/Text Pages Stock"
    resets: ["Internal/Text Pages Printing"]
    options:
      - { value: "100gsm Uncoated Bond", code: "100LU" }
  - control: "Internal/Text Pages (pp) Excluding Cover"
    column: "Pages"
    code_prefix: "pp"
    range: { from: 48, to: 64, step: 2 }
quantity:
  control: "Quantity"
  values: [5, 10, 15]
retry:
  attempts: 10
  forced_attempts: 4
  delay_ms: 250
output:
  path: "A5P.csv"
  format: csv
  price_adjustment: 10
on_failure:
  screenshot: "fail-{label}.png"
  reload: false
"#;
        let config = Config::parse(yaml).unwrap();
        assert!(config.browser.headless);
        assert_eq!(config.browser.viewport.as_ref().unwrap().width, 1400);
        assert_eq!(config.widget.toggle, "a.dropdown-toggle.filter-button");
        assert_eq!(config.widget.menu, "ul.dropdown-menu");
        assert_eq!(config.presets[0].value.0, "A5 Portrait - 148x210");
        assert_eq!(config.dimensions.len(), 4);
        assert!(config.dimensions[1].forced);
        assert_eq!(config.dimensions[2].resets, vec!["Internal/Text Pages Printing"]);
        assert_eq!(config.dimensions[3].column(), "Pages");
        assert_eq!(config.configuration_count(), 9);
        assert_eq!(config.quote_count(), 27);
        assert_eq!(config.retry.attempts, 10);
        assert_eq!(config.retry.forced_attempts, 4);
        assert_eq!(config.output.format, OutputFormat::Csv);
        assert_eq!(config.output.price_adjustment, 10.0);
        assert!(!config.on_failure.reload);
    }

    #[test]
    fn test_validation_missing_name() {
        let yaml = MINIMAL.replace("name: \"Test\"\n", "");
        assert!(Config::parse(&yaml).is_err());
    }

    #[test]
    fn test_validation_empty_name() {
        let yaml = MINIMAL.replace("name: \"Test\"", "name: \"\"");
        let err = Config::parse(&yaml).unwrap_err();
        assert!(err.to_string().contains("name is required"));
    }

    #[test]
    fn test_validation_missing_url() {
        let yaml = MINIMAL.replace("https://example.com", "");
        let err = Config::parse(&yaml).unwrap_err();
        assert!(err.to_string().contains("target.url"));
    }

    #[test]
    fn test_validation_options_and_range() {
        let yaml = MINIMAL.replace(
            "options: [\"250gsm Gloss Artboard\"]",
            "options: [\"a\"]\n    range: { from: 1, to: 2 }",
        );
        let err = Config::parse(&yaml).unwrap_err();
        assert!(err.to_string().contains("either 'options' or 'range'"));
    }

    #[test]
    fn test_validation_empty_options() {
        let yaml = MINIMAL.replace("[\"250gsm Gloss Artboard\"]", "[]");
        let err = Config::parse(&yaml).unwrap_err();
        assert!(err.to_string().contains("has no values"));
    }

    #[test]
    fn test_validation_backwards_range() {
        let yaml = MINIMAL.replace(
            "options: [\"250gsm Gloss Artboard\"]",
            "range: { from: 300, to: 48, step: 2 }",
        );
        let err = Config::parse(&yaml).unwrap_err();
        assert!(err.to_string().contains("is above"));
    }

    #[test]
    fn test_validation_zero_step() {
        let yaml = MINIMAL.replace(
            "options: [\"250gsm Gloss Artboard\"]",
            "range: { from: 48, to: 300, step: 0 }",
        );
        let err = Config::parse(&yaml).unwrap_err();
        assert!(err.to_string().contains("step must be at least 1"));
    }

    #[test]
    fn test_validation_duplicate_dimension() {
        let yaml = MINIMAL.replace(
            "quantity:",
            "  - control: \"Cover Stock\"\n    options: [\"x\"]\nquantity:",
        );
        let err = Config::parse(&yaml).unwrap_err();
        assert!(err.to_string().contains("declared twice"));
    }

    #[test]
    fn test_validation_reset_must_name_forced_dimension() {
        let yaml = MINIMAL.replace(
            "options: [\"250gsm Gloss Artboard\"]",
            "options: [\"250gsm Gloss Artboard\"]\n    resets: [\"Cover Printing\"]",
        );
        let err = Config::parse(&yaml).unwrap_err();
        assert!(err.to_string().contains("not a forced dimension"));
    }

    #[test]
    fn test_validation_empty_quantities() {
        let yaml = MINIMAL.replace("[5, 10]", "[]");
        let err = Config::parse(&yaml).unwrap_err();
        assert!(err.to_string().contains("quantity.values"));
    }

    #[test]
    fn test_validation_zero_retry_attempts() {
        let yaml = format!("{}retry:\n  attempts: 0\n", MINIMAL);
        let err = Config::parse(&yaml).unwrap_err();
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn test_validation_zero_nudge_rounds() {
        let yaml = format!("{}retry:\n  nudge_rounds: 0\n", MINIMAL);
        let err = Config::parse(&yaml).unwrap_err();
        assert!(err.to_string().contains("nudge_rounds"));
    }

    #[test]
    fn test_validation_nudge_needs_two_values() {
        let yaml = MINIMAL.replace(
            "options: [\"250gsm Gloss Artboard\"]",
            "options: [\"250gsm Gloss Artboard\"]\n    nudge: true",
        );
        let err = Config::parse(&yaml).unwrap_err();
        assert!(err.to_string().contains("nudge needs at least two values"));
    }

    #[test]
    fn test_validation_unknown_format() {
        let yaml = MINIMAL.replace("path: \"out.txt\"", "path: \"out.txt\"\n  format: xml");
        assert!(Config::parse(&yaml).is_err());
    }

    #[test]
    fn test_params_substitution() {
        let yaml = r#"
name: "Sized"
params:
  size:
    default: "A5 Portrait - 148x210"
  prefix:
    required: true
target:
  url: "https://example.com"
presets:
  - control: "Finished Size (mm)"
    value: "${size}"
label_prefix: "${prefix}"
dimensions:
  - control: "Cover Stock"
    options: ["250gsm Gloss Artboard"]
quantity:
  values: [5]
output:
  path: "${prefix}.txt"
"#;
        let params = Params::new().set("prefix", "A4P");
        let config = Config::parse_with_params(yaml, &params).unwrap();
        assert_eq!(config.presets[0].value.0, "A5 Portrait - 148x210");
        assert_eq!(config.label_prefix.as_deref(), Some("A4P"));
        assert_eq!(config.output.path.to_str(), Some("A4P.txt"));

        let err = Config::parse(yaml).unwrap_err();
        assert!(err.to_string().contains("prefix"));
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!("txt".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_load_bundled_config() {
        let config = Config::load("configs/a5-perfect-bound.yaml").unwrap();
        assert_eq!(config.name, "A5 perfect bound booklet");
        assert_eq!(config.dimensions.len(), 6);
        assert_eq!(config.quantity.values.len(), 27);
        assert_eq!(config.configuration_count(), 127);
    }

    #[test]
    fn test_selection_failed_fatality_follows_cause() {
        let lost = Error::SelectionFailed {
            control: "Quantity".into(),
            value: "5".into(),
            attempts: 1,
            last: Box::new(Error::PageLost("closed".into())),
        };
        assert!(lost.is_fatal());

        let stuck = Error::SelectionFailed {
            control: "Quantity".into(),
            value: "5".into(),
            attempts: 3,
            last: Box::new(Error::NotApplied {
                control: "Quantity".into(),
                value: "5".into(),
                displayed: "10".into(),
            }),
        };
        assert!(!stuck.is_fatal());
        assert!(stuck.to_string().contains("after 3 attempts"));
    }
}
