//! HuggingFace Hub provider
//!
//! Catalog and model details come from the hub REST API
//! (`/api/models`, `/api/models/{id}`); installs download the repository
//! files into the local hub cache, which is also what "installed" is probed
//! against.

use super::{InstalledModels, ModelProvider, string_array};
use crate::config::HuggingFaceConfig;
use crate::error::{ModelError, ModelResult};
use crate::metrics;
use crate::models::{
    HubDownloader, ModelIdentifier, ModelMetadata, ModelSource, ModelStore, ModelType,
    SnapshotDownloader, cache,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const SOURCE: ModelSource = ModelSource::HuggingFace;

/// Adapter for the HuggingFace Hub
pub struct HuggingFaceProvider {
    endpoint: String,
    token: Option<String>,
    client: reqwest::Client,
    request_timeout: Duration,
    list_limit: u32,
    cache_dir: PathBuf,
    downloader: Arc<dyn SnapshotDownloader>,
    installed: InstalledModels,
    store: Option<ModelStore>,
}

impl HuggingFaceProvider {
    pub fn new(config: &HuggingFaceConfig) -> ModelResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ModelError::provider(format!("Failed to create HTTP client: {}", e)))?;

        let endpoint = config.endpoint.trim_end_matches('/').to_string();
        let cache_dir = config
            .cache_dir
            .clone()
            .unwrap_or_else(cache::default_hub_cache_dir);
        let downloader = Arc::new(HubDownloader::new(
            endpoint.clone(),
            cache_dir.clone(),
            config.token.clone(),
        ));

        Ok(Self {
            endpoint,
            token: config.token.clone(),
            client,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            list_limit: config.list_limit,
            cache_dir,
            downloader,
            installed: InstalledModels::new(),
            store: None,
        })
    }

    /// Replace the snapshot downloader
    pub fn with_downloader(mut self, downloader: Arc<dyn SnapshotDownloader>) -> Self {
        self.downloader = downloader;
        self
    }

    /// Record installed-model metadata in `store`
    pub fn with_store(mut self, store: ModelStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn get(&self, url: impl reqwest::IntoUrl) -> reqwest::RequestBuilder {
        let request = self.client.get(url).timeout(self.request_timeout);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Query the hub listing endpoint, optionally with a search term
    async fn query_models(&self, search: Option<&str>) -> Result<Vec<ModelMetadata>, String> {
        let mut params = vec![
            ("limit", self.list_limit.to_string()),
            ("full", "true".to_string()),
        ];
        if let Some(search) = search {
            params.push(("search", search.to_string()));
        }

        let response = self
            .get(format!("{}/api/models", self.endpoint))
            .query(&params)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("listing returned status {}", response.status()));
        }

        let records: Vec<Value> = response.json().await.map_err(|e| e.to_string())?;
        Ok(records
            .iter()
            .filter_map(|raw| {
                let id = raw
                    .get("modelId")
                    .or_else(|| raw.get("id"))
                    .and_then(Value::as_str)?;
                Some(self.model_dict_to_metadata(id, raw))
            })
            .collect())
    }

    /// `{endpoint}/api/models/{name}` with every `/`-separated part of
    /// `name` escaped as its own path segment
    fn model_url(&self, name: &str) -> ModelResult<reqwest::Url> {
        let parts: Vec<&str> = name.split('/').collect();
        if parts.iter().any(|p| p.is_empty() || *p == "." || *p == "..") {
            return Err(ModelError::InvalidModelId {
                model_id: name.to_string(),
            });
        }

        let mut url = reqwest::Url::parse(&self.endpoint)
            .map_err(|e| ModelError::provider(format!("Invalid hub endpoint {}: {}", self.endpoint, e)))?;
        url.path_segments_mut()
            .map_err(|_| ModelError::provider(format!("Invalid hub endpoint {}", self.endpoint)))?
            .pop_if_empty()
            .extend(["api", "models"])
            .extend(parts);
        Ok(url)
    }

    fn store_key(name: &str) -> String {
        ModelIdentifier::new(SOURCE, name).to_string()
    }
}

/// File names listed under `siblings`
fn sibling_files(raw: &Value) -> Vec<String> {
    raw.get("siblings")
        .and_then(Value::as_array)
        .map(|siblings| {
            siblings
                .iter()
                .filter_map(|s| s.get("rfilename").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Size of the largest listed file
fn largest_sibling_size(raw: &Value) -> Option<u64> {
    raw.get("siblings")?
        .as_array()?
        .iter()
        .filter_map(|s| {
            s.get("size")
                .and_then(Value::as_u64)
                .or_else(|| s.get("lfs")?.get("size")?.as_u64())
        })
        .max()
}

fn card_description(raw: &Value) -> String {
    let Some(card) = raw.get("cardData") else {
        return String::new();
    };

    ["description", "model_description"]
        .iter()
        .find_map(|key| card.get(*key).and_then(Value::as_str))
        .unwrap_or_default()
        .to_string()
}

fn infer_model_type(tags: &[String]) -> ModelType {
    let has = |wanted: &[&str]| tags.iter().any(|t| wanted.contains(&t.as_str()));

    if has(&["sentence-similarity", "feature-extraction", "sentence-transformers"]) {
        ModelType::Embedding
    } else if has(&[
        "image-text-to-text",
        "visual-question-answering",
        "image-to-text",
        "multimodal",
    ]) {
        ModelType::Multimodal
    } else if has(&["conversational"]) {
        ModelType::Chat
    } else if has(&["code", "code-generation"]) {
        ModelType::Code
    } else {
        ModelType::Text
    }
}

#[async_trait]
impl ModelProvider for HuggingFaceProvider {
    fn source(&self) -> ModelSource {
        SOURCE
    }

    async fn list_models(&self) -> Vec<ModelMetadata> {
        match self.query_models(None).await {
            Ok(models) => models,
            Err(e) => {
                tracing::error!(endpoint = %self.endpoint, error = %e, "Failed to list hub models");
                metrics::record_provider_failure(SOURCE, "list");
                Vec::new()
            }
        }
    }

    async fn search_models(&self, query: &str) -> Vec<ModelMetadata> {
        match self.query_models(Some(query)).await {
            Ok(models) => models,
            Err(e) => {
                tracing::error!(endpoint = %self.endpoint, query = %query, error = %e, "Failed to search hub models");
                metrics::record_provider_failure(SOURCE, "search");
                Vec::new()
            }
        }
    }

    async fn fetch_model_info(&self, name: &str) -> ModelResult<Value> {
        let fetch_error = |reason: String| {
            ModelError::provider(format!("Failed to fetch model info for {}: {}", name, reason))
        };

        let response = self
            .get(self.model_url(name)?)
            .query(&[("blobs", "true")])
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(ModelError::NotFound {
                model_id: name.to_string(),
            }),
            status if !status.is_success() => Err(fetch_error(format!("status {}", status))),
            _ => response.json().await.map_err(|e| fetch_error(e.to_string())),
        }
    }

    async fn install_model(&self, name: &str) -> ModelResult<bool> {
        tracing::info!(model_id = %name, "Installing hub model");

        let result = match self.fetch_model_info(name).await {
            Ok(info) => {
                let files = sibling_files(&info);
                if files.is_empty() {
                    Err(ModelError::installation(name, "repository lists no files"))
                } else {
                    self.downloader
                        .download(name, &files)
                        .await
                        .map(|path| (info, path))
                        .map_err(|e| ModelError::installation(name, e))
                }
            }
            Err(e) => Err(ModelError::installation(name, e)),
        };

        let (info, snapshot) = match result {
            Ok(done) => done,
            Err(e) => {
                tracing::error!(model_id = %name, error = %e, "Hub install failed");
                metrics::record_install(SOURCE, false);
                return Err(e);
            }
        };

        if let Some(store) = &self.store
            && let Err(e) = store.save_model_metadata(&Self::store_key(name), &info)
        {
            tracing::warn!(model_id = %name, error = %e, "Failed to persist model metadata");
        }
        self.installed.insert(name, info).await;
        metrics::record_install(SOURCE, true);

        tracing::info!(
            model_id = %name,
            snapshot = ?snapshot,
            cached_bytes = ?cache::get_cache_size(&self.cache_dir, name),
            "Hub model installed"
        );
        Ok(true)
    }

    async fn uninstall_model(&self, name: &str) -> bool {
        if let Err(e) = cache::remove_cached_model(&self.cache_dir, name) {
            tracing::error!(model_id = %name, error = %e, "Failed to remove hub cache entry");
            metrics::record_uninstall(SOURCE, false);
            return false;
        }

        self.installed.remove(name).await;
        if let Some(store) = &self.store
            && let Err(e) = store.delete_model(&Self::store_key(name))
        {
            tracing::warn!(model_id = %name, error = %e, "Failed to remove stored model metadata");
        }
        metrics::record_uninstall(SOURCE, true);

        tracing::info!(model_id = %name, "Hub model uninstalled");
        true
    }

    async fn is_model_installed(&self, name: &str) -> bool {
        self.installed.contains(name).await || cache::is_model_cached(&self.cache_dir, name)
    }

    async fn installed_models(&self) -> Vec<String> {
        self.installed.names().await
    }

    fn model_dict_to_metadata(&self, name: &str, raw: &Value) -> ModelMetadata {
        let display_name = raw
            .get("modelId")
            .or_else(|| raw.get("id"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(name);

        let mut tags = string_array(raw.get("tags"));
        if let Some(pipeline) = raw.get("pipeline_tag").and_then(Value::as_str) {
            tags.push(pipeline.to_string());
        }

        let parameters = raw
            .get("config")
            .and_then(|c| c.get("num_parameters"))
            .and_then(Value::as_u64)
            .or_else(|| raw.get("safetensors")?.get("total")?.as_u64());

        let mut metadata = ModelMetadata::new(name, SOURCE)
            .with_name(display_name)
            .with_model_type(infer_model_type(&tags))
            .with_tags(tags);
        metadata.description = card_description(raw);
        metadata.size = largest_sibling_size(raw);
        metadata.parameters = parameters;
        metadata.config = raw
            .get("config")
            .filter(|c| c.is_object())
            .cloned()
            .unwrap_or_else(|| json!({}));
        metadata
    }
}
