//! API request handlers

use super::models::{
    DefaultModelResponse, HealthResponse, ListQuery, ModelList, ModelStatusResponse,
    RefreshResponse, SearchQuery, SetDefaultModelRequest,
};
use super::routes::AppState;
use crate::error::ApiError;
use crate::models::ModelMetadata;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

/// GET /health - Manager health check
pub async fn health() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now(),
        }),
    )
}

/// GET /metrics - Prometheus metrics
pub async fn metrics(State(state): State<AppState>) -> String {
    state.prometheus_handle.render()
}

/// GET /models - Merged catalog, optionally filtered by source
pub async fn list_models(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<ModelList> {
    Json(state.manager.list_models(query.source).await.into())
}

/// GET /models/search - Provider-side search
pub async fn search_models(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<ModelList> {
    Json(
        state
            .manager
            .search_models(&query.q, query.source)
            .await
            .into(),
    )
}

/// POST /models/refresh - Rebuild the catalog from every provider
pub async fn refresh_models(State(state): State<AppState>) -> Json<RefreshResponse> {
    state.manager.update_models_cache().await;
    let count = state.manager.list_models(None).await.len();

    Json(RefreshResponse {
        count,
        timestamp: chrono::Utc::now(),
    })
}

/// GET /models/{id} - Model details from its provider
pub async fn get_model(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ModelMetadata>, ApiError> {
    state
        .manager
        .get_model(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Model not found: {}", id)))
}

/// GET /models/{id}/installed
pub async fn is_model_installed(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ModelStatusResponse>, ApiError> {
    let installed = state.manager.is_model_installed(&id).await?;
    Ok(Json(ModelStatusResponse {
        model_id: id,
        installed,
    }))
}

/// POST /models/{id}/install
pub async fn install_model(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<ModelStatusResponse>), ApiError> {
    let installed = state.manager.install_model(&id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ModelStatusResponse {
            model_id: id,
            installed,
        }),
    ))
}

/// DELETE /models/{id}
pub async fn uninstall_model(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.manager.uninstall_model(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::BadGateway(format!(
            "Failed to uninstall model: {}",
            id
        )))
    }
}

/// GET /default-model
pub async fn get_default_model(State(state): State<AppState>) -> Json<DefaultModelResponse> {
    Json(DefaultModelResponse {
        model_id: state.manager.get_default_model().await,
    })
}

/// PUT /default-model
pub async fn set_default_model(
    State(state): State<AppState>,
    Json(req): Json<SetDefaultModelRequest>,
) -> Result<Json<DefaultModelResponse>, ApiError> {
    state.manager.set_default_model(&req.model_id).await?;

    Ok(Json(DefaultModelResponse {
        model_id: state.manager.get_default_model().await,
    }))
}
