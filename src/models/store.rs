//! On-disk model store
//!
//! One subdirectory per installed model under a per-installation root, each
//! holding a `metadata.json` written at install time:
//! ```text
//! ~/.llm-manager/models/
//! ├── ollama--llama2_7b/
//! │   └── metadata.json
//! └── hf--BAAI--bge-small-en-v1.5/
//!     └── metadata.json
//! ```

use crate::error::{ModelError, ModelResult};
use std::path::{Path, PathBuf};

const METADATA_FILE: &str = "metadata.json";
const SIZE_UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

/// Filesystem-backed store of installed-model metadata
#[derive(Debug, Clone)]
pub struct ModelStore {
    root: PathBuf,
}

impl ModelStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the default store root
    ///
    /// Checks in order:
    /// 1. `$LLM_MANAGER_HOME/models`
    /// 2. `~/.llm-manager/models`
    pub fn default_root() -> PathBuf {
        if let Ok(home) = std::env::var("LLM_MANAGER_HOME") {
            return PathBuf::from(home).join("models");
        }

        dirs::home_dir()
            .map(|h| h.join(".llm-manager/models"))
            .unwrap_or_else(|| PathBuf::from("/tmp/llm-manager/models"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for a model; `/` becomes `--` and `:` becomes `_`
    pub fn model_dir(&self, model_id: &str) -> PathBuf {
        self.root.join(encode_model_id(model_id))
    }

    pub fn ensure_model_dir(&self, model_id: &str) -> ModelResult<PathBuf> {
        let dir = self.model_dir(model_id);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn save_model_metadata(
        &self,
        model_id: &str,
        metadata: &serde_json::Value,
    ) -> ModelResult<PathBuf> {
        let dir = self.ensure_model_dir(model_id)?;
        let path = dir.join(METADATA_FILE);

        let content = serde_json::to_string_pretty(metadata).map_err(|e| {
            ModelError::MetadataLoad {
                model_id: model_id.to_string(),
                reason: e.to_string(),
            }
        })?;
        std::fs::write(&path, content)?;

        tracing::debug!(model_id = %model_id, path = ?path, "Saved model metadata");
        Ok(path)
    }

    pub fn load_model_metadata(&self, model_id: &str) -> ModelResult<serde_json::Value> {
        let path = self.model_dir(model_id).join(METADATA_FILE);

        if !path.exists() {
            return Err(ModelError::MetadataNotFound {
                model_id: model_id.to_string(),
            });
        }

        let load_error = |reason: String| ModelError::MetadataLoad {
            model_id: model_id.to_string(),
            reason,
        };

        let content = std::fs::read_to_string(&path).map_err(|e| load_error(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| load_error(e.to_string()))
    }

    /// Total size of a model's directory, `None` when it does not exist
    pub fn model_size(&self, model_id: &str) -> Option<u64> {
        let dir = self.model_dir(model_id);
        if !dir.is_dir() {
            return None;
        }
        Some(dir_size(&dir))
    }

    /// Names of every model directory in the store, sorted
    pub fn available_models(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return Vec::new();
        };

        let mut models: Vec<String> = entries
            .flatten()
            .filter(|e| e.path().is_dir())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        models.sort();
        models
    }

    /// Stored metadata of every model saved under `<prefix>/...`
    ///
    /// Entries whose `metadata.json` is missing or unreadable are skipped.
    pub fn load_source_metadata(&self, prefix: &str) -> Vec<serde_json::Value> {
        let dir_prefix = format!("{}--", encode_model_id(prefix));

        self.available_models()
            .into_iter()
            .filter(|dir| dir.starts_with(&dir_prefix))
            .filter_map(|dir| match self.load_model_metadata(&dir) {
                Ok(metadata) => Some(metadata),
                Err(e) => {
                    tracing::warn!(entry = %dir, error = %e, "Skipping unreadable store entry");
                    None
                }
            })
            .collect()
    }

    pub fn is_model_installed(&self, model_id: &str) -> bool {
        self.model_dir(model_id).is_dir()
    }

    /// Remove a model directory. Returns `false` if there was nothing to remove.
    pub fn delete_model(&self, model_id: &str) -> ModelResult<bool> {
        let dir = self.model_dir(model_id);
        if !dir.exists() {
            return Ok(false);
        }

        std::fs::remove_dir_all(&dir)?;
        tracing::debug!(model_id = %model_id, path = ?dir, "Deleted model directory");
        Ok(true)
    }
}

fn encode_model_id(model_id: &str) -> String {
    model_id.replace('/', "--").replace(':', "_")
}

/// Recursively calculate directory size
pub(crate) fn dir_size(path: &Path) -> u64 {
    let mut size = 0;

    if let Ok(entries) = std::fs::read_dir(path) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                size += dir_size(&path);
            } else if let Ok(metadata) = std::fs::metadata(&path) {
                size += metadata.len();
            }
        }
    }

    size
}

/// Human-readable byte size with one decimal, e.g. `"1.5 GB"`
///
/// Picks the largest unit keeping the displayed value below 1024. `None` is
/// `"Unknown"`.
pub fn format_model_size(size: Option<u64>) -> String {
    let Some(bytes) = size else {
        return "Unknown".to_string();
    };

    let mut value = bytes as f64;
    let mut unit = 0;
    // Compare the value as displayed so 1023.96 KB shows as 1.0 MB
    while (value * 10.0).round() >= 10240.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{:.1} {}", value, SIZE_UNITS[unit])
}
