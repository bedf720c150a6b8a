//! Qualified model identifiers
//!
//! A qualified identifier is `<source-prefix>/<local-name>`, e.g.
//! `ollama/llama2:7b` or `hf/BAAI/bge-small-en-v1.5`. The string is split on
//! the first separator only, so hub names keep their own `org/name` slash.

use super::metadata::ModelSource;
use crate::error::{ModelError, ModelResult};
use std::fmt;

pub const SEPARATOR: char = '/';

/// A validated `<source>/<local-name>` pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelIdentifier {
    source: ModelSource,
    local_name: String,
}

impl ModelIdentifier {
    pub fn new(source: ModelSource, local_name: impl Into<String>) -> Self {
        Self {
            source,
            local_name: local_name.into(),
        }
    }

    /// Split a qualified identifier into its prefix and local name
    ///
    /// Fails with [`ModelError::InvalidModelId`] when the separator is missing
    /// or either side is empty. The prefix is not checked here.
    pub fn split(raw: &str) -> ModelResult<(&str, &str)> {
        match raw.split_once(SEPARATOR) {
            Some((prefix, name)) if !prefix.is_empty() && !name.is_empty() => Ok((prefix, name)),
            _ => Err(ModelError::InvalidModelId {
                model_id: raw.to_string(),
            }),
        }
    }

    /// Parse and validate against the sources that have a provider
    ///
    /// `hf`/`huggingface` and `ollama` are accepted; anything else, including
    /// `local` and `other`, is [`ModelError::UnknownSource`].
    pub fn parse(raw: &str) -> ModelResult<Self> {
        let (prefix, name) = Self::split(raw)?;

        let source = match prefix.to_ascii_lowercase().as_str() {
            "hf" | "huggingface" => ModelSource::HuggingFace,
            "ollama" => ModelSource::Ollama,
            _ => {
                return Err(ModelError::UnknownSource {
                    source_tag: prefix.to_string(),
                });
            }
        };

        Ok(Self::new(source, name))
    }

    pub fn source(&self) -> ModelSource {
        self.source
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }
}

impl fmt::Display for ModelIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.source.prefix(), SEPARATOR, self.local_name)
    }
}
