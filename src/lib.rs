//! LLM Manager - Unified local model manager
//!
//! Discovers, installs and removes language models from HuggingFace Hub and a
//! local Ollama daemon behind one `<source>/<name>` identifier scheme, with a
//! merged catalog cache and a default-model selection.

pub mod api;
pub mod config;
pub mod error;
pub mod manager;
pub mod metrics;
pub mod models;
pub mod providers;

pub use config::ManagerConfig;
pub use error::{ApiError, ModelError, ModelResult};
pub use manager::ModelManager;
pub use models::{ModelIdentifier, ModelMetadata, ModelSource, ModelStore, ModelType};
pub use providers::{HuggingFaceProvider, ModelProvider, OllamaProvider};
