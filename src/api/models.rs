//! API request and response models

use crate::models::{ModelMetadata, ModelSource};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// `?source=` filter for listing
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub source: Option<ModelSource>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub source: Option<ModelSource>,
}

/// Model listing with its size
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelList {
    pub count: usize,
    pub models: Vec<ModelMetadata>,
}

impl From<Vec<ModelMetadata>> for ModelList {
    fn from(models: Vec<ModelMetadata>) -> Self {
        Self {
            count: models.len(),
            models,
        }
    }
}

/// Outcome of an install, uninstall or installed-state query
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelStatusResponse {
    pub model_id: String,
    pub installed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub count: usize,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DefaultModelResponse {
    pub model_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetDefaultModelRequest {
    pub model_id: String,
}
