use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;

/// A YAML scalar read as a string. Quantities and page counts are usually
/// written as bare numbers, labels as strings; both end up as option text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scalar(pub String);

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ScalarVisitor)
    }
}

struct ScalarVisitor;

impl<'de> Visitor<'de> for ScalarVisitor {
    type Value = Scalar;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a string or number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(Scalar(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Scalar(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Scalar(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Scalar(v.to_string()))
    }
}

/// One selectable value of a dimension.
///
/// Written either as a bare scalar (`"Gloss Laminate"`, `48`) or as a map
/// with a short `code` used in configuration labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    pub value: String,
    pub code: Option<String>,
}

impl OptionSpec {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            code: None,
        }
    }

    pub fn coded(value: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            code: Some(code.into()),
        }
    }

    /// Label code, falling back to the value itself.
    pub fn code(&self) -> &str {
        self.code.as_deref().unwrap_or(&self.value)
    }
}

impl<'de> Deserialize<'de> for OptionSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(OptionSpecVisitor)
    }
}

struct OptionSpecVisitor;

impl<'de> Visitor<'de> for OptionSpecVisitor {
    type Value = OptionSpec;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an option value (scalar, or map with 'value' and optional 'code')")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(OptionSpec::new(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(OptionSpec::new(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(OptionSpec::new(v.to_string()))
    }

    fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
    where
        M: MapAccess<'de>,
    {
        let mut value: Option<Scalar> = None;
        let mut code: Option<Scalar> = None;
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "value" => value = Some(map.next_value()?),
                "code" => code = Some(map.next_value()?),
                other => return Err(de::Error::unknown_field(other, &["value", "code"])),
            }
        }
        let value = value.ok_or_else(|| de::Error::missing_field("value"))?;
        Ok(OptionSpec {
            value: value.0,
            code: code.map(|c| c.0),
        })
    }
}

/// Inclusive numeric range, e.g. page counts `48..=300` in steps of 2.
#[derive(Debug, Clone, Deserialize)]
pub struct RangeSpec {
    pub from: u32,
    pub to: u32,
    #[serde(default = "RangeSpec::default_step")]
    pub step: u32,
}

impl RangeSpec {
    fn default_step() -> u32 {
        1
    }

    /// Expand into option values. Empty if the range is malformed; validation
    /// reports that case before a sweep starts.
    pub fn expand(&self) -> Vec<OptionSpec> {
        if self.step == 0 || self.from > self.to {
            return Vec::new();
        }
        (self.from..=self.to)
            .step_by(self.step as usize)
            .map(|n| OptionSpec::new(n.to_string()))
            .collect()
    }
}

/// One axis of the sweep: a control and the values it takes.
#[derive(Debug, Clone, Deserialize)]
pub struct Dimension {
    /// Control label as shown on the page.
    pub control: String,

    /// CSV header for this dimension. Defaults to the control label.
    pub column: Option<String>,

    /// Prepended to each option code in configuration labels (`pp` -> `pp48`).
    #[serde(default)]
    pub code_prefix: String,

    /// Re-lock this control with its own retry bound; see `resets`.
    #[serde(default)]
    pub forced: bool,

    /// Forced controls that selecting this one is known to reset.
    #[serde(default)]
    pub resets: Vec<String>,

    /// When selection fails, select another value of this dimension and try
    /// again. Unsticks controls that ignore re-selection.
    #[serde(default)]
    pub nudge: bool,

    #[serde(default)]
    pub options: Option<Vec<OptionSpec>>,

    #[serde(default)]
    pub range: Option<RangeSpec>,
}

impl Dimension {
    pub fn column(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.control)
    }

    /// All values in declaration order.
    pub fn values(&self) -> Vec<OptionSpec> {
        match (&self.options, &self.range) {
            (Some(opts), _) => opts.clone(),
            (None, Some(range)) => range.expand(),
            (None, None) => Vec::new(),
        }
    }

    /// Label fragment for one of this dimension's values.
    pub fn label_code(&self, option: &OptionSpec) -> String {
        format!("{}{}", self.code_prefix, option.code())
    }
}

/// The quantity control and the quantities requested under each configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct QuantitySpec {
    #[serde(default = "QuantitySpec::default_control")]
    pub control: String,
    pub values: Vec<Scalar>,
}

impl QuantitySpec {
    fn default_control() -> String {
        "Quantity".into()
    }

    pub fn values(&self) -> Vec<String> {
        self.values.iter().map(|s| s.0.clone()).collect()
    }
}

/// A control fixed once for the whole sweep.
#[derive(Debug, Clone, Deserialize)]
pub struct Preset {
    pub control: String,
    pub value: Scalar,
}
