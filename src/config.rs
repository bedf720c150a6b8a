//! Configuration structures and loading logic

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main manager configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ManagerConfig {
    pub api_port: u16,
    /// Root of the on-disk model store
    pub models_dir: PathBuf,
    pub ollama: OllamaConfig,
    pub huggingface: HuggingFaceConfig,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            models_dir: crate::models::ModelStore::default_root(),
            ollama: OllamaConfig::default(),
            huggingface: HuggingFaceConfig::default(),
        }
    }
}

/// Local Ollama daemon settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct OllamaConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    /// Upper bound for a whole streamed pull
    pub install_timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_url(),
            request_timeout_secs: default_request_timeout(),
            install_timeout_secs: default_install_timeout(),
        }
    }
}

/// HuggingFace Hub settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct HuggingFaceConfig {
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Hub cache directory; falls back to the standard HF cache resolution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
    /// Number of models requested when browsing the hub catalog
    pub list_limit: u32,
    pub request_timeout_secs: u64,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_hf_endpoint(),
            token: None,
            cache_dir: None,
            list_limit: default_list_limit(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ManagerConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content).context("Failed to parse TOML config")?
        } else {
            Self::default()
        };

        // Environment variable overrides
        if let Ok(port) = std::env::var("LLM_MANAGER_API_PORT") {
            config.api_port = port.parse().context("Invalid LLM_MANAGER_API_PORT value")?;
        }
        if let Ok(models_dir) = std::env::var("LLM_MANAGER_MODELS_DIR") {
            config.models_dir = PathBuf::from(models_dir);
        }
        if let Ok(base_url) = std::env::var("OLLAMA_BASE_URL") {
            config.ollama.base_url = base_url;
        }
        if let Ok(endpoint) = std::env::var("HF_ENDPOINT") {
            config.huggingface.endpoint = endpoint;
        }
        if let Ok(token) = std::env::var("HF_TOKEN")
            && !token.is_empty()
        {
            config.huggingface.token = Some(token);
        }

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_port < 1024 {
            anyhow::bail!("API port must be >= 1024 (got {})", self.api_port);
        }

        for (name, url) in [
            ("ollama.base_url", &self.ollama.base_url),
            ("huggingface.endpoint", &self.huggingface.endpoint),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                anyhow::bail!("{} must be an http(s) URL (got '{}')", name, url);
            }
        }

        if self.ollama.request_timeout_secs == 0
            || self.ollama.install_timeout_secs == 0
            || self.huggingface.request_timeout_secs == 0
        {
            anyhow::bail!("Timeouts must be greater than zero");
        }

        if self.huggingface.list_limit == 0 {
            anyhow::bail!("huggingface.list_limit must be greater than zero");
        }

        Ok(())
    }
}

// Default functions
fn default_api_port() -> u16 {
    9200
}
fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_hf_endpoint() -> String {
    "https://huggingface.co".to_string()
}
fn default_request_timeout() -> u64 {
    30
}
fn default_install_timeout() -> u64 {
    3600
}
fn default_list_limit() -> u32 {
    50
}
