//! Model metadata and local storage helpers
//!
//! Provides functionality for:
//! - The canonical [`ModelMetadata`] record shared by every provider
//! - Parsing qualified `<source>/<name>` identifiers
//! - Persisting installed-model metadata on disk
//! - Detecting and removing models in the HuggingFace hub cache
//! - Downloading hub snapshots

pub mod cache;
pub mod download;
pub mod identifier;
pub mod metadata;
pub mod store;

pub use cache::{default_hub_cache_dir, is_model_cached, remove_cached_model};
pub use download::{HubDownloader, SnapshotDownloader};
pub use identifier::ModelIdentifier;
pub use metadata::{ModelMetadata, ModelSource, ModelType, parse_parameter_size};
pub use store::{ModelStore, format_model_size};
