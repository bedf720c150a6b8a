//! Model providers
//!
//! A provider adapts one external model source to the canonical metadata
//! schema and lifecycle. Both providers share the [`ModelProvider`] contract:
//!
//! - listing and searching never fail; transport problems are logged and
//!   produce an empty result
//! - single-model lookups report [`ModelError::NotFound`] separately from
//!   other failures
//! - installs either complete and are recorded, or fail with
//!   [`ModelError::Installation`] leaving the installed cache untouched
//! - uninstalls report failure as `false`, keeping the cache entry

pub mod huggingface;
pub mod ollama;

pub use huggingface::HuggingFaceProvider;
pub use ollama::OllamaProvider;

use crate::error::{ModelError, ModelResult};
use crate::models::{ModelMetadata, ModelSource};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Source this provider serves
    fn source(&self) -> ModelSource;

    /// Provider catalog; empty on transport failure
    async fn list_models(&self) -> Vec<ModelMetadata>;

    /// Models matching `query`; empty on transport failure
    async fn search_models(&self, query: &str) -> Vec<ModelMetadata>;

    /// Raw provider record for one model
    async fn fetch_model_info(&self, name: &str) -> ModelResult<Value>;

    async fn install_model(&self, name: &str) -> ModelResult<bool>;

    async fn uninstall_model(&self, name: &str) -> bool;

    async fn is_model_installed(&self, name: &str) -> bool;

    /// Local names currently recorded as installed
    async fn installed_models(&self) -> Vec<String>;

    /// Normalize a raw provider record. Must not fail.
    fn model_dict_to_metadata(&self, name: &str, raw: &Value) -> ModelMetadata;

    /// Look up one model, mapping "not found" to `Ok(None)`
    async fn get_model(&self, name: &str) -> ModelResult<Option<ModelMetadata>> {
        match self.fetch_model_info(name).await {
            Ok(raw) => Ok(Some(self.model_dict_to_metadata(name, &raw))),
            Err(ModelError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Per-provider record of successfully installed models
#[derive(Debug, Default)]
pub struct InstalledModels {
    models: RwLock<HashMap<String, Value>>,
}

impl InstalledModels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the cache with `(local name, raw record)` pairs
    pub fn from_records(records: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self {
            models: RwLock::new(records.into_iter().collect()),
        }
    }

    pub async fn insert(&self, name: &str, raw: Value) {
        self.models.write().await.insert(name.to_string(), raw);
    }

    pub async fn remove(&self, name: &str) -> Option<Value> {
        self.models.write().await.remove(name)
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.models.read().await.contains_key(name)
    }

    pub async fn get(&self, name: &str) -> Option<Value> {
        self.models.read().await.get(name).cloned()
    }

    /// Sorted local names
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.models.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Collect `"tags"`-style string arrays, ignoring non-string entries
pub(crate) fn string_array(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
