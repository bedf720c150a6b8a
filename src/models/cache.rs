//! HuggingFace hub cache probing
//!
//! Cache structure:
//! ```text
//! ~/.cache/huggingface/hub/
//! ├── models--BAAI--bge-small-en-v1.5/
//! │   ├── snapshots/
//! │   │   └── {revision}/
//! │   │       ├── config.json
//! │   │       └── model.safetensors
//! │   └── refs/
//! │       └── main
//! └── ...
//! ```

use super::store::dir_size;
use std::path::{Path, PathBuf};

/// Get the HuggingFace hub cache directory
///
/// Checks in order:
/// 1. `$HF_HUB_CACHE`
/// 2. `$HF_HOME/hub`
/// 3. `$XDG_CACHE_HOME/huggingface/hub`
/// 4. `~/.cache/huggingface/hub`
pub fn default_hub_cache_dir() -> PathBuf {
    if let Ok(hub_cache) = std::env::var("HF_HUB_CACHE") {
        return PathBuf::from(hub_cache);
    }

    if let Ok(hf_home) = std::env::var("HF_HOME") {
        return PathBuf::from(hf_home).join("hub");
    }

    if let Ok(xdg_cache) = std::env::var("XDG_CACHE_HOME") {
        return PathBuf::from(xdg_cache).join("huggingface/hub");
    }

    dirs::home_dir()
        .map(|h| h.join(".cache/huggingface/hub"))
        .unwrap_or_else(|| PathBuf::from("/tmp/huggingface/hub"))
}

/// Convert model ID to cache directory name
///
/// e.g., "BAAI/bge-small-en-v1.5" -> "models--BAAI--bge-small-en-v1.5"
fn model_id_to_cache_name(model_id: &str) -> String {
    format!("models--{}", model_id.replace('/', "--"))
}

/// Directory holding every revision of a model
pub fn model_cache_dir(cache_dir: &Path, model_id: &str) -> PathBuf {
    cache_dir.join(model_id_to_cache_name(model_id))
}

/// Check whether at least one snapshot of the model is present
///
/// Unreadable directories count as "not cached".
pub fn is_model_cached(cache_dir: &Path, model_id: &str) -> bool {
    let snapshots_dir = model_cache_dir(cache_dir, model_id).join("snapshots");

    match std::fs::read_dir(&snapshots_dir) {
        Ok(entries) => entries.flatten().any(|entry| entry.path().is_dir()),
        Err(_) => false,
    }
}

/// Get the total size of a cached model in bytes
pub fn get_cache_size(cache_dir: &Path, model_id: &str) -> Option<u64> {
    let model_dir = model_cache_dir(cache_dir, model_id);

    if !model_dir.exists() {
        return None;
    }

    Some(dir_size(&model_dir))
}

/// Delete every cached revision of a model
///
/// Returns `Ok(false)` when nothing was cached.
pub fn remove_cached_model(cache_dir: &Path, model_id: &str) -> std::io::Result<bool> {
    let model_dir = model_cache_dir(cache_dir, model_id);

    if !model_dir.exists() {
        return Ok(false);
    }

    std::fs::remove_dir_all(&model_dir)?;
    Ok(true)
}
