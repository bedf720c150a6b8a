//! Ollama provider
//!
//! Talks to a local Ollama daemon over its REST API:
//! - `GET /api/version` - liveness probe
//! - `GET /api/tags` - locally available models
//! - `POST /api/show` - single model details
//! - `POST /api/pull` - streamed download (NDJSON progress)
//! - `DELETE /api/delete` - remove a model

use super::{InstalledModels, ModelProvider, string_array};
use crate::config::OllamaConfig;
use crate::error::{ModelError, ModelResult};
use crate::metrics;
use crate::models::{
    ModelIdentifier, ModelMetadata, ModelSource, ModelStore, ModelType, parse_parameter_size,
};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::time::Duration;

const SOURCE: ModelSource = ModelSource::Ollama;

/// Local name recorded alongside `/api/show` output in the store
const STORED_NAME_KEY: &str = "name";

/// Adapter for a local Ollama daemon
pub struct OllamaProvider {
    base_url: String,
    client: reqwest::Client,
    request_timeout: Duration,
    install_timeout: Duration,
    installed: InstalledModels,
    store: Option<ModelStore>,
}

impl OllamaProvider {
    pub fn new(config: &OllamaConfig) -> ModelResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ModelError::provider(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            install_timeout: Duration::from_secs(config.install_timeout_secs),
            installed: InstalledModels::new(),
            store: None,
        })
    }

    /// Record installed-model metadata in `store`
    ///
    /// Models a previous run installed into the same store are restored into
    /// the installed set.
    pub fn with_store(mut self, store: ModelStore) -> Self {
        let restored: Vec<(String, Value)> = store
            .load_source_metadata(SOURCE.prefix())
            .into_iter()
            .filter_map(|record| {
                let name = record.get(STORED_NAME_KEY)?.as_str()?.to_string();
                Some((name, record))
            })
            .collect();

        if !restored.is_empty() {
            tracing::debug!(root = ?store.root(), count = restored.len(), "Restored installed Ollama models");
        }
        self.installed = InstalledModels::from_records(restored);
        self.store = Some(store);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check whether the daemon answers its version endpoint
    pub async fn check_server_running(&self) -> bool {
        match self
            .client
            .get(self.url("/api/version"))
            .timeout(self.request_timeout)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(base_url = %self.base_url, error = %e, "Ollama server not reachable");
                false
            }
        }
    }

    async fn fetch_tags(&self) -> Result<Vec<Value>, String> {
        let response = self
            .client
            .get(self.url("/api/tags"))
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("tags endpoint returned status {}", response.status()));
        }

        let body: Value = response.json().await.map_err(|e| e.to_string())?;
        Ok(body
            .get("models")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    /// Pull a model, consuming the NDJSON progress stream until it ends
    async fn pull(&self, name: &str) -> Result<(), String> {
        let response = self
            .client
            .post(self.url("/api/pull"))
            .json(&json!({ "name": name, "stream": true }))
            .timeout(self.install_timeout)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("pull returned status {}: {}", status, body.trim()));
        }

        let mut stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| e.to_string())?;
            buffer.extend_from_slice(&chunk);

            while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                handle_pull_line(name, &line)?;
            }
        }
        handle_pull_line(name, &buffer)?;

        Ok(())
    }

    fn store_key(name: &str) -> String {
        ModelIdentifier::new(SOURCE, name).to_string()
    }
}

/// Parse one progress line; an `"error"` field aborts the pull
fn handle_pull_line(name: &str, line: &[u8]) -> Result<(), String> {
    let text = String::from_utf8_lossy(line);
    let text = text.trim();
    if text.is_empty() {
        return Ok(());
    }

    let Ok(progress) = serde_json::from_str::<Value>(text) else {
        tracing::debug!(model = %name, line = %text, "Ignoring unparseable pull progress line");
        return Ok(());
    };

    if let Some(error) = progress.get("error").and_then(Value::as_str) {
        return Err(error.to_string());
    }

    // Bound outside the macro: `tracing` brings its own `Value` into scope
    let status = progress.get("status").and_then(Value::as_str).unwrap_or("");
    let completed = progress.get("completed").and_then(Value::as_u64);
    let total = progress.get("total").and_then(Value::as_u64);
    tracing::debug!(model = %name, status, ?completed, ?total, "Pull progress");
    Ok(())
}

/// Overlay `/api/show` details on a `/api/tags` entry
fn merge_records(tag_entry: &Value, info: Value) -> Value {
    match (tag_entry.clone(), info) {
        (Value::Object(mut base), Value::Object(details)) => {
            base.extend(details);
            Value::Object(base)
        }
        (base, _) => base,
    }
}

fn infer_model_type(name: &str, families: &[String]) -> ModelType {
    let name = name.to_lowercase();
    let has = |needle: &str| name.contains(needle) || families.iter().any(|f| f.contains(needle));

    if has("embed") || has("bert") {
        ModelType::Embedding
    } else if has("llava") || has("clip") || has("vision") {
        ModelType::Multimodal
    } else if has("code") || has("starcoder") {
        ModelType::Code
    } else {
        ModelType::Text
    }
}

#[async_trait]
impl ModelProvider for OllamaProvider {
    fn source(&self) -> ModelSource {
        SOURCE
    }

    async fn list_models(&self) -> Vec<ModelMetadata> {
        let entries = match self.fetch_tags().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!(base_url = %self.base_url, error = %e, "Failed to list Ollama models");
                metrics::record_provider_failure(SOURCE, "list");
                return Vec::new();
            }
        };

        let mut models = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(name) = entry
                .get("name")
                .or_else(|| entry.get("model"))
                .and_then(Value::as_str)
                .map(str::to_string)
            else {
                continue;
            };

            let record = match self.fetch_model_info(&name).await {
                Ok(info) => merge_records(&entry, info),
                Err(e) => match self.installed.get(&name).await {
                    Some(installed) => {
                        tracing::warn!(model = %name, error = %e, "Using install-time model details");
                        merge_records(&entry, installed)
                    }
                    None => {
                        tracing::warn!(model = %name, error = %e, "Using tag listing without model details");
                        entry
                    }
                },
            };
            models.push(self.model_dict_to_metadata(&name, &record));
        }

        models
    }

    async fn search_models(&self, query: &str) -> Vec<ModelMetadata> {
        self.list_models()
            .await
            .into_iter()
            .filter(|m| m.matches_query(query))
            .collect()
    }

    async fn fetch_model_info(&self, name: &str) -> ModelResult<Value> {
        let fetch_error =
            |reason: String| ModelError::provider(format!("Failed to fetch model info for {}: {}", name, reason));

        let response = self
            .client
            .post(self.url("/api/show"))
            .json(&json!({ "name": name }))
            .timeout(self.request_timeout)
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
        tracing::info!(model = %name, base_url = %self.base_url, "Pulling Ollama model");

        // The daemon can only describe a model once it has been pulled
        let result = match self.pull(name).await {
            Ok(()) => self
                .fetch_model_info(name)
                .await
                .map_err(|e| ModelError::installation(name, e)),
            Err(e) => Err(ModelError::installation(name, e)),
        };

        let mut info = match result {
            Ok(info) => info,
            Err(e) => {
                tracing::error!(model = %name, error = %e, "Ollama install failed");
                metrics::record_install(SOURCE, false);
                return Err(e);
            }
        };
        if let Value::Object(record) = &mut info {
            record.insert(STORED_NAME_KEY.to_string(), json!(name));
        }

        if let Some(store) = &self.store
            && let Err(e) = store.save_model_metadata(&Self::store_key(name), &info)
        {
            tracing::warn!(model = %name, error = %e, "Failed to persist model metadata");
        }
        self.installed.insert(name, info).await;
        metrics::record_install(SOURCE, true);

        tracing::info!(model = %name, "Ollama model installed");
        Ok(true)
    }

    async fn uninstall_model(&self, name: &str) -> bool {
        let result = self
            .client
            .delete(self.url("/api/delete"))
            .json(&json!({ "name": name }))
            .timeout(self.request_timeout)
            .send()
            .await;

        let removed = match result {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::error!(model = %name, status = %response.status(), "Ollama refused to delete model");
                false
            }
            Err(e) => {
                tracing::error!(model = %name, error = %e, "Failed to delete Ollama model");
                false
            }
        };
        metrics::record_uninstall(SOURCE, removed);

        if !removed {
            return false;
        }

        self.installed.remove(name).await;
        if let Some(store) = &self.store
            && let Err(e) = store.delete_model(&Self::store_key(name))
        {
            tracing::warn!(model = %name, error = %e, "Failed to remove stored model metadata");
        }

        tracing::info!(model = %name, "Ollama model uninstalled");
        true
    }

    async fn is_model_installed(&self, name: &str) -> bool {
        self.installed.contains(name).await
    }

    async fn installed_models(&self) -> Vec<String> {
        self.installed.names().await
    }

    fn model_dict_to_metadata(&self, name: &str, raw: &Value) -> ModelMetadata {
        let details = raw
            .get("details")
            .filter(|d| d.is_object())
            .cloned()
            .unwrap_or_else(|| json!({}));

        let display_name = raw
            .get("name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(name);

        let parameters = details
            .get("parameter_size")
            .and_then(Value::as_str)
            .and_then(parse_parameter_size)
            .or_else(|| {
                raw.get("parameters")
                    .and_then(Value::as_str)
                    .and_then(parse_parameter_size)
            });

        let mut families = string_array(details.get("families"));
        if let Some(family) = details.get("family").and_then(Value::as_str) {
            families.push(family.to_string());
        }

        let mut metadata = ModelMetadata::new(name, SOURCE)
            .with_name(display_name)
            .with_model_type(infer_model_type(name, &families))
            .with_tags(["llm", SOURCE.prefix()])
            .with_tags(families);
        metadata.description = raw
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        metadata.size = raw.get("size").and_then(Value::as_u64);
        metadata.parameters = parameters;
        metadata.config = details;
        metadata
    }
}
