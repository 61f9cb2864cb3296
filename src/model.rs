use std::fmt;

/// One entry of an open option list, as read from the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionEntry {
    /// Identifier attribute (`data-value`), present on numeric entries.
    pub id: Option<String>,
    /// Visible text.
    pub text: String,
}

impl OptionEntry {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
        }
    }

    pub fn with_id(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            text: text.into(),
        }
    }
}

/// How an option entry was matched to a requested value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Identifier attribute equal to the value.
    Identifier,
    /// Trimmed text equal to the value.
    ExactText,
    /// Text containing the value.
    Contains,
}

/// A matched entry and its position in the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionMatch {
    pub index: usize,
    pub kind: MatchKind,
}

/// Locate `desired` among `entries`.
///
/// Identifier matches win over exact text, which wins over substring, so
/// `"20"` never lands on `"200"` when `"20"` is present. Numeric values
/// never fall back to substring matching.
pub fn match_option(entries: &[OptionEntry], desired: &str) -> Option<OptionMatch> {
    let desired = desired.trim();
    let numeric = !desired.is_empty() && desired.bytes().all(|b| b.is_ascii_digit());
    let found = |kind: MatchKind, index: Option<usize>| index.map(|index| OptionMatch { index, kind });

    found(
        MatchKind::Identifier,
        entries
            .iter()
            .position(|e| e.id.as_deref().map(str::trim) == Some(desired)),
    )
    .or_else(|| {
        found(
            MatchKind::ExactText,
            entries.iter().position(|e| e.text.trim() == desired),
        )
    })
    .or_else(|| {
        if numeric {
            return None;
        }
        found(
            MatchKind::Contains,
            entries.iter().position(|e| e.text.contains(desired)),
        )
    })
}

/// Does `displayed` show `desired`? Only substring matches are confirmed by
/// containment; everything else must show the value exactly.
pub fn display_confirms(kind: MatchKind, displayed: &str, desired: &str) -> bool {
    let desired = desired.trim();
    match kind {
        MatchKind::Identifier | MatchKind::ExactText => displayed.trim() == desired,
        MatchKind::Contains => displayed.contains(desired),
    }
}

/// One (control, value) pair of a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting {
    pub control: String,
    pub value: String,
    /// Label fragment, e.g. `250GA` or `pp48`.
    pub code: String,
    pub forced: bool,
}

/// One full sweep point: every dimension set to one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    /// Zero-based position in sweep order.
    pub index: usize,
    pub settings: Vec<Setting>,
    label_prefix: Option<String>,
}

impl Configuration {
    pub fn new(index: usize, settings: Vec<Setting>, label_prefix: Option<String>) -> Self {
        Self {
            index,
            settings,
            label_prefix,
        }
    }

    /// `A5P_ones_250GA_G_FC_100LU_pp48`
    pub fn label(&self) -> String {
        self.label_prefix
            .iter()
            .map(String::as_str)
            .chain(self.settings.iter().map(|s| s.code.as_str()))
            .collect::<Vec<_>>()
            .join("_")
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.settings.iter().map(|s| s.value.as_str())
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// What was observed for one quantity.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Price(f64),
    /// Quantity selection or price read failed.
    Error(String),
    /// The configuration itself could not be applied.
    ConfigError(String),
}

impl Outcome {
    /// Marker written in place of a price.
    pub fn marker(&self) -> String {
        match self {
            Self::Price(p) => format!("{:.2}", p),
            Self::Error(_) => "ERROR".into(),
            Self::ConfigError(_) => "CONFIG ERROR".into(),
        }
    }

    pub fn is_price(&self) -> bool {
        matches!(self, Self::Price(_))
    }
}

/// A (configuration, quantity) pair and its outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub quantity: String,
    pub outcome: Outcome,
}
