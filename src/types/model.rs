use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Represents a Gemini model identifier.
///
/// This can be a predefined model or a custom string for models this crate
/// does not know about yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Model {
    /// Known model versions
    Known(KnownModel),

    /// Custom model identifier (for preview or tuned models)
    Custom(String),
}

/// Known Gemini model versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownModel {
    /// Gemini 3 Flash (preview)
    Gemini3FlashPreview,

    /// Gemini 3 Pro (preview)
    Gemini3ProPreview,

    /// Gemini 2.5 Flash
    Gemini25Flash,

    /// Gemini 2.5 Pro
    Gemini25Pro,
}

impl KnownModel {
    /// All known models, fastest first.
    pub const ALL: [KnownModel; 4] = [
        KnownModel::Gemini3FlashPreview,
        KnownModel::Gemini3ProPreview,
        KnownModel::Gemini25Flash,
        KnownModel::Gemini25Pro,
    ];

    /// The wire identifier for this model.
    pub fn as_str(&self) -> &'static str {
        match self {
            KnownModel::Gemini3FlashPreview => "gemini-3-flash-preview",
            KnownModel::Gemini3ProPreview => "gemini-3-pro-preview",
            KnownModel::Gemini25Flash => "gemini-2.5-flash",
            KnownModel::Gemini25Pro => "gemini-2.5-pro",
        }
    }

    /// Short alias accepted on the command line.
    pub fn alias(&self) -> &'static str {
        match self {
            KnownModel::Gemini3FlashPreview => "flash",
            KnownModel::Gemini3ProPreview => "pro",
            KnownModel::Gemini25Flash => "flash-2.5",
            KnownModel::Gemini25Pro => "pro-2.5",
        }
    }
}

impl Model {
    /// The wire identifier for this model.
    pub fn as_str(&self) -> &str {
        match self {
            Model::Known(known) => known.as_str(),
            Model::Custom(custom) => custom,
        }
    }
}

impl Default for Model {
    fn default() -> Self {
        Model::Known(KnownModel::Gemini3FlashPreview)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for KnownModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for KnownModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix("models/").unwrap_or(s);
        KnownModel::ALL
            .into_iter()
            .find(|m| m.as_str() == s || m.alias().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown model: {s}"))
    }
}

impl FromStr for Model {
    type Err = String;

    /// Parses a model name, falling back to [`Model::Custom`] for names that
    /// are not known.  Only the empty string is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("model name must not be empty".to_string());
        }
        Ok(trimmed
            .parse::<KnownModel>()
            .map(Model::Known)
            .unwrap_or_else(|_| Model::Custom(trimmed.to_string())))
    }
}

impl From<KnownModel> for Model {
    fn from(model: KnownModel) -> Self {
        Model::Known(model)
    }
}

impl From<String> for Model {
    fn from(model: String) -> Self {
        match model.parse::<KnownModel>() {
            Ok(known) => Model::Known(known),
            Err(_) => Model::Custom(model),
        }
    }
}

impl From<&str> for Model {
    fn from(model: &str) -> Self {
        Model::from(model.to_string())
    }
}

impl Serialize for Model {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Model::from(s))
    }
}
