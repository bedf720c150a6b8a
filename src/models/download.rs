//! Model download functionality using hf-hub
//!
//! The hub provider installs a model by pulling its repository files into the
//! standard HuggingFace cache. The transfer sits behind [`SnapshotDownloader`]
//! so the provider can be exercised without network access.

use async_trait::async_trait;
use hf_hub::api::tokio::{Api, ApiBuilder};
use std::path::PathBuf;

/// Fetches repository files for a hub model
#[async_trait]
pub trait SnapshotDownloader: Send + Sync {
    /// Download `files` of `model_id`, returning the snapshot directory
    async fn download(&self, model_id: &str, files: &[String]) -> Result<PathBuf, String>;
}

/// [`SnapshotDownloader`] backed by the hf-hub crate
#[derive(Debug, Clone)]
pub struct HubDownloader {
    endpoint: String,
    cache_dir: PathBuf,
    token: Option<String>,
}

impl HubDownloader {
    pub fn new(endpoint: impl Into<String>, cache_dir: PathBuf, token: Option<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            cache_dir,
            token,
        }
    }

    fn api(&self) -> Result<Api, String> {
        ApiBuilder::new()
            .with_endpoint(self.endpoint.clone())
            .with_cache_dir(self.cache_dir.clone())
            .with_token(self.token.clone())
            .with_progress(false)
            .build()
            .map_err(|e| format!("Failed to create HF API client: {}", e))
    }
}

#[async_trait]
impl SnapshotDownloader for HubDownloader {
    async fn download(&self, model_id: &str, files: &[String]) -> Result<PathBuf, String> {
        tracing::info!(
            model_id = %model_id,
            cache_dir = ?self.cache_dir,
            file_count = files.len(),
            "Starting model download via hf-hub"
        );

        let api = self.api()?;
        let repo = api.model(model_id.to_string());

        let mut snapshot_dir: Option<PathBuf> = None;
        for file in files {
            tracing::debug!(model_id = %model_id, file = %file, "Downloading file");
            let path = repo
                .get(file)
                .await
                .map_err(|e| format!("Failed to download {}: {}", file, e))?;

            // Nested files (e.g. "onnx/model.onnx") live below the snapshot root
            if snapshot_dir.is_none() {
                let depth = file.split('/').count();
                snapshot_dir = path.ancestors().nth(depth).map(|p| p.to_path_buf());
            }
        }

        snapshot_dir.ok_or_else(|| {
            format!(
                "Model downloaded but snapshot path not found for {}",
                model_id
            )
        })
    }
}
