pub mod dimension;
pub mod params;
pub mod schema;
pub mod widget;

pub use dimension::{Dimension, OptionSpec, Preset, QuantitySpec, RangeSpec, Scalar};
pub use params::{ParamDef, Params};
pub use schema::{
    BrowserConfig, Config, OnFailure, OutputConfig, OutputFormat, RetryConfig, TargetUrl, Timing,
    Viewport,
};
pub use widget::WidgetSelectors;
