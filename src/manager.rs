//! Unified model manager
//!
//! Routes qualified identifiers to the matching provider, keeps a merged
//! catalog of every provider's listing, and owns the default-model selection.

use crate::config::ManagerConfig;
use crate::error::{ModelError, ModelResult};
use crate::metrics;
use crate::models::{ModelIdentifier, ModelMetadata, ModelSource, ModelStore};
use crate::providers::{HuggingFaceProvider, ModelProvider, OllamaProvider};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Merged catalog keyed by qualified identifier
///
/// Keeps each provider's listing order.
#[derive(Debug, Default)]
struct Catalog {
    populated: bool,
    order: Vec<String>,
    models: HashMap<String, ModelMetadata>,
}

impl Catalog {
    fn from_models(models: Vec<ModelMetadata>) -> Self {
        let mut catalog = Self {
            populated: true,
            ..Default::default()
        };

        for model in models {
            let key = model.qualified_id();
            if catalog.models.insert(key.clone(), model).is_none() {
                catalog.order.push(key);
            }
        }

        catalog
    }

    fn get(&self, key: &str) -> Option<&ModelMetadata> {
        self.models.get(key)
    }

    fn remove(&mut self, key: &str) -> Option<ModelMetadata> {
        let removed = self.models.remove(key)?;
        self.order.retain(|k| k != key);
        Some(removed)
    }

    fn iter(&self) -> impl Iterator<Item = &ModelMetadata> {
        self.order.iter().filter_map(|k| self.models.get(k))
    }

    fn len(&self) -> usize {
        self.models.len()
    }
}

/// Single entry point over every model provider
pub struct ModelManager {
    huggingface: Arc<dyn ModelProvider>,
    ollama: Arc<dyn ModelProvider>,
    catalog: RwLock<Catalog>,
    default_model: RwLock<Option<String>>,
}

impl ModelManager {
    pub fn new(huggingface: Arc<dyn ModelProvider>, ollama: Arc<dyn ModelProvider>) -> Self {
        Self {
            huggingface,
            ollama,
            catalog: RwLock::new(Catalog::default()),
            default_model: RwLock::new(None),
        }
    }

    /// Build both providers from configuration, sharing one model store
    pub fn from_config(config: &ManagerConfig) -> ModelResult<Self> {
        let store = ModelStore::new(config.models_dir.clone());

        let huggingface =
            HuggingFaceProvider::new(&config.huggingface)?.with_store(store.clone());
        let ollama = OllamaProvider::new(&config.ollama)?.with_store(store);

        Ok(Self::new(Arc::new(huggingface), Arc::new(ollama)))
    }

    /// Provider serving `source`, if any
    pub fn provider(&self, source: ModelSource) -> Option<&Arc<dyn ModelProvider>> {
        match source {
            ModelSource::HuggingFace => Some(&self.huggingface),
            ModelSource::Ollama => Some(&self.ollama),
            ModelSource::Local | ModelSource::Other => None,
        }
    }

    fn providers(&self) -> [&Arc<dyn ModelProvider>; 2] {
        [&self.huggingface, &self.ollama]
    }

    /// Validate an identifier and pick its provider, before any network call
    fn resolve(&self, identifier: &str) -> ModelResult<(ModelIdentifier, &Arc<dyn ModelProvider>)> {
        let id = ModelIdentifier::parse(identifier)?;
        let provider = self
            .provider(id.source())
            .ok_or_else(|| ModelError::UnknownSource {
                source_tag: id.source().prefix().to_string(),
            })?;
        Ok((id, provider))
    }

    /// List models, optionally restricted to one source
    ///
    /// Without a source the merged catalog is returned, refreshing it first if
    /// it has never been populated.
    pub async fn list_models(&self, source: Option<ModelSource>) -> Vec<ModelMetadata> {
        match source {
            Some(source) => {
                {
                    let catalog = self.catalog.read().await;
                    if catalog.populated {
                        return catalog
                            .iter()
                            .filter(|m| m.source == source)
                            .cloned()
                            .collect();
                    }
                }

                let Some(provider) = self.provider(source) else {
                    return Vec::new();
                };
                provider
                    .list_models()
                    .await
                    .into_iter()
                    .filter(|m| m.source == source)
                    .collect()
            }
            None => {
                if !self.is_cache_populated().await {
                    self.update_models_cache().await;
                }
                self.catalog.read().await.iter().cloned().collect()
            }
        }
    }

    /// Search through the providers' own search logic
    pub async fn search_models(
        &self,
        query: &str,
        source: Option<ModelSource>,
    ) -> Vec<ModelMetadata> {
        match source {
            Some(source) => match self.provider(source) {
                Some(provider) => provider.search_models(query).await,
                None => Vec::new(),
            },
            None => {
                let mut results = Vec::new();
                for provider in self.providers() {
                    results.extend(provider.search_models(query).await);
                }
                results
            }
        }
    }

    /// Look up one model; `Ok(None)` when the provider reports it missing
    pub async fn get_model(&self, identifier: &str) -> ModelResult<Option<ModelMetadata>> {
        let (id, provider) = self.resolve(identifier)?;
        provider.get_model(id.local_name()).await
    }

    /// Read a model from the catalog cache without contacting providers
    pub async fn get_cached_model(&self, identifier: &str) -> ModelResult<Option<ModelMetadata>> {
        let (id, _) = self.resolve(identifier)?;
        Ok(self.catalog.read().await.get(&id.to_string()).cloned())
    }

    pub async fn install_model(&self, identifier: &str) -> ModelResult<bool> {
        let (id, provider) = self.resolve(identifier)?;
        tracing::info!(model_id = %id, "Installing model");
        provider.install_model(id.local_name()).await
    }

    /// Uninstall a model, dropping it from the catalog cache on success
    pub async fn uninstall_model(&self, identifier: &str) -> ModelResult<bool> {
        let (id, provider) = self.resolve(identifier)?;
        let removed = provider.uninstall_model(id.local_name()).await;

        if removed {
            let key = id.to_string();
            let mut catalog = self.catalog.write().await;
            catalog.remove(&key);
            metrics::update_catalog_count(catalog.len());
            drop(catalog);

            let mut default_model = self.default_model.write().await;
            if default_model.as_deref() == Some(key.as_str()) {
                tracing::info!(model_id = %key, "Clearing default model after uninstall");
                *default_model = None;
            }
        }

        Ok(removed)
    }

    pub async fn is_model_installed(&self, identifier: &str) -> ModelResult<bool> {
        let (id, provider) = self.resolve(identifier)?;
        Ok(provider.is_model_installed(id.local_name()).await)
    }

    /// Qualified ids every provider has recorded as installed
    pub async fn installed_models(&self) -> Vec<String> {
        let mut installed = Vec::new();
        for provider in self.providers() {
            let source = provider.source();
            installed.extend(
                provider
                    .installed_models()
                    .await
                    .into_iter()
                    .map(|name| ModelIdentifier::new(source, name).to_string()),
            );
        }
        installed
    }

    /// Rebuild the catalog from every provider and swap it in whole
    ///
    /// Never fails: an unreachable provider simply contributes no entries.
    pub async fn update_models_cache(&self) {
        let mut models = Vec::new();
        for provider in self.providers() {
            let listed = provider.list_models().await;
            tracing::debug!(source = %provider.source(), count = listed.len(), "Provider listing");
            models.extend(listed);
        }

        let catalog = Catalog::from_models(models);
        let count = catalog.len();
        *self.catalog.write().await = catalog;

        metrics::update_catalog_count(count);
        tracing::info!(count, "Model catalog refreshed");
    }

    pub async fn is_cache_populated(&self) -> bool {
        self.catalog.read().await.populated
    }

    pub async fn get_default_model(&self) -> Option<String> {
        self.default_model.read().await.clone()
    }

    /// Set the default model
    ///
    /// The identifier must be well formed, name a known source and be
    /// installed according to its provider.
    pub async fn set_default_model(&self, identifier: &str) -> ModelResult<()> {
        let (id, provider) = self.resolve(identifier)?;

        if !provider.is_model_installed(id.local_name()).await {
            return Err(ModelError::NotInstalled {
                model_id: identifier.to_string(),
            });
        }

        *self.default_model.write().await = Some(id.to_string());
        tracing::info!(model_id = %id, "Default model set");
        Ok(())
    }
}
