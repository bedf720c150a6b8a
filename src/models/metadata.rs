//! Canonical model metadata
//!
//! Every provider normalizes its native records into [`ModelMetadata`] so the
//! unified manager can merge catalogs without knowing where a model came from.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Where a model comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSource {
    #[serde(alias = "hf")]
    HuggingFace,
    Ollama,
    Local,
    Other,
}

impl ModelSource {
    pub const ALL: [ModelSource; 4] = [
        ModelSource::HuggingFace,
        ModelSource::Ollama,
        ModelSource::Local,
        ModelSource::Other,
    ];

    /// Canonical lowercase name ("huggingface", "ollama", ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HuggingFace => "huggingface",
            Self::Ollama => "ollama",
            Self::Local => "local",
            Self::Other => "other",
        }
    }

    /// Prefix used in qualified identifiers (`hf/...`, `ollama/...`)
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::HuggingFace => "hf",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "huggingface" | "hf" => Ok(Self::HuggingFace),
            "ollama" => Ok(Self::Ollama),
            "local" => Ok(Self::Local),
            "other" => Ok(Self::Other),
            _ => Err(format!("unknown model source '{}'", s)),
        }
    }
}

/// Broad capability class of a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    #[default]
    Text,
    Code,
    Chat,
    Embedding,
    Multimodal,
}

impl ModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Code => "code",
            Self::Chat => "chat",
            Self::Embedding => "embedding",
            Self::Multimodal => "multimodal",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider-independent description of a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Provider-local name (no source prefix)
    pub id: String,
    /// Display name, defaults to `id`
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub source: ModelSource,
    #[serde(default)]
    pub model_type: ModelType,
    /// Size in bytes of the primary artifact
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Parameter count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<u64>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Provider-specific extras, passed through untouched
    #[serde(default = "empty_config")]
    pub config: serde_json::Value,
}

fn empty_config() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl ModelMetadata {
    /// Create a record with every optional field set to unknown
    pub fn new(id: impl Into<String>, source: ModelSource) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: String::new(),
            source,
            model_type: ModelType::Text,
            size: None,
            parameters: None,
            tags: BTreeSet::new(),
            config: empty_config(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_model_type(mut self, model_type: ModelType) -> Self {
        self.model_type = model_type;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Fully qualified identifier (`<prefix>/<id>`)
    pub fn qualified_id(&self) -> String {
        format!("{}/{}", self.source.prefix(), self.id)
    }

    /// Case-insensitive substring match over id, name, description and tags
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }

        self.id.to_lowercase().contains(&query)
            || self.name.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&query))
    }
}

/// Parse a shorthand parameter count such as `"7B"` or `"13m"`
///
/// Suffixes K, M, B and T are powers of 1000. A bare number is taken as-is.
/// Returns `None` for anything unparseable.
pub fn parse_parameter_size(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    let last = trimmed.chars().last()?;

    let (number, multiplier) = match last.to_ascii_uppercase() {
        'K' => (&trimmed[..trimmed.len() - 1], 1e3),
        'M' => (&trimmed[..trimmed.len() - 1], 1e6),
        'B' => (&trimmed[..trimmed.len() - 1], 1e9),
        'T' => (&trimmed[..trimmed.len() - 1], 1e12),
        c if c.is_ascii_digit() => (trimmed, 1.0),
        _ => return None,
    };

    let value: f64 = number.trim().parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }

    let total = (value * multiplier).round();
    if total > u64::MAX as f64 {
        return None;
    }
    Some(total as u64)
}
