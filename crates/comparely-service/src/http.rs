//! JSON HTTP API over the catalogue, comparison and recommendation services.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use comparely_ai::{AugmentationClient, ChatClient, LlmError};
use comparely_core::{
    Category, CategoryId, Device, DeviceFilter, DeviceId, DeviceSuggestion, NewDevice,
    RecommendationCriteria,
};
use comparely_store::{SharedStore, StoreError};
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{error, info};

use crate::compare::{AnalyzedComparison, CompareError, ComparisonResult, ComparisonService};
use crate::recommend::{RecommendationService, Recommendations};

/// Shared handles for every request.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub comparison: Arc<ComparisonService<SharedStore>>,
    pub recommendations: RecommendationService,
    pub llm: Option<Arc<ChatClient>>,
}

impl AppState {
    pub fn new(store: SharedStore, augmenter: AugmentationClient, llm: Option<ChatClient>) -> Self {
        Self {
            comparison: Arc::new(ComparisonService::new(store.clone(), Arc::new(augmenter))),
            recommendations: RecommendationService::new(store.clone()),
            store,
            llm: llm.map(Arc::new),
        }
    }
}

/// Handler error rendered as `{"detail": "..."}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Invalid(e) => Self::Invalid(e.to_string()),
            StoreError::Conflict(message) => Self::Conflict(message),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<CompareError> for ApiError {
    fn from(e: CompareError) -> Self {
        match e {
            CompareError::NotFound(id) => Self::NotFound(format!("Device with id {id} not found")),
            CompareError::Repository(source) => Self::Internal(source.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(detail) => {
                error!(%detail, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/devices", get(list_devices).post(create_device))
        .route("/devices/brands", get(brands))
        .route("/devices/autocomplete", get(autocomplete))
        .route(
            "/devices/{id}",
            get(get_device).put(update_device).delete(delete_device),
        )
        .route("/categories", get(categories).post(create_category))
        .route("/compare", get(compare))
        .route("/compare/ai", get(compare_ai))
        .route("/recommendations", get(recommendations))
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "HTTP API listening");
    axum::serve(listener, router(state)).await
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_devices(
    State(state): State<AppState>,
    Query(filter): Query<DeviceFilter>,
) -> ApiResult<Vec<Device>> {
    Ok(Json(state.store.with(|s| s.list_devices(&filter))?))
}

async fn brands(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    Ok(Json(state.store.with(|s| s.unique_brands())?))
}

#[derive(Debug, Deserialize)]
struct AutocompleteParams {
    #[serde(default)]
    query: String,
    limit: Option<usize>,
}

async fn autocomplete(
    State(state): State<AppState>,
    Query(params): Query<AutocompleteParams>,
) -> ApiResult<Vec<DeviceSuggestion>> {
    Ok(Json(
        state
            .store
            .with(|s| s.autocomplete(&params.query, params.limit))?,
    ))
}

async fn get_device(
    State(state): State<AppState>,
    Path(id): Path<DeviceId>,
) -> ApiResult<Device> {
    state
        .store
        .with(|s| s.get_device(id))?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Device not found".into()))
}

async fn create_device(
    State(state): State<AppState>,
    Json(device): Json<NewDevice>,
) -> ApiResult<Device> {
    state
        .store
        .with(|s| s.insert_device(&device).and_then(|id| s.get_device(id)))?
        .map(Json)
        .ok_or_else(|| ApiError::Internal("created device could not be read back".into()))
}

async fn update_device(
    State(state): State<AppState>,
    Path(id): Path<DeviceId>,
    Json(device): Json<NewDevice>,
) -> ApiResult<Device> {
    let updated = state.store.with(|s| {
        if s.update_device(id, &device)? {
            s.get_device(id)
        } else {
            Ok(None)
        }
    })?;
    updated
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Device not found".into()))
}

async fn delete_device(
    State(state): State<AppState>,
    Path(id): Path<DeviceId>,
) -> Result<StatusCode, ApiError> {
    if state.store.with(|s| s.delete_device(id))? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Device not found".into()))
    }
}

async fn categories(State(state): State<AppState>) -> ApiResult<Vec<Category>> {
    Ok(Json(state.store.with(|s| s.list_categories())?))
}

#[derive(Debug, Deserialize)]
struct NewCategory {
    name: String,
    description: Option<String>,
}

async fn create_category(
    State(state): State<AppState>,
    Json(category): Json<NewCategory>,
) -> ApiResult<Category> {
    Ok(Json(state.store.with(|s| {
        s.create_category(&category.name, category.description.as_deref())
    })?))
}

#[derive(Debug, Deserialize)]
struct CompareParams {
    id1: DeviceId,
    id2: DeviceId,
}

async fn compare(
    State(state): State<AppState>,
    Query(params): Query<CompareParams>,
) -> ApiResult<ComparisonResult> {
    Ok(Json(state.comparison.compare(params.id1, params.id2).await?))
}

async fn compare_ai(
    State(state): State<AppState>,
    Query(params): Query<CompareParams>,
) -> ApiResult<AnalyzedComparison> {
    let comparison = state.comparison.compare(params.id1, params.id2).await?;
    Ok(Json(
        AnalyzedComparison::build(comparison, state.llm.as_deref()).await,
    ))
}

#[derive(Debug, Deserialize)]
struct RecommendationParams {
    max_price: Option<f64>,
    category_id: Option<CategoryId>,
    min_release_year: Option<i32>,
    limit: Option<usize>,
    use_case: Option<String>,
    #[serde(default)]
    ai: bool,
}

impl RecommendationParams {
    // Query strings cannot go through `#[serde(flatten)]` with numeric fields.
    fn criteria(&self) -> RecommendationCriteria {
        RecommendationCriteria {
            max_price: self.max_price,
            category_id: self.category_id,
            min_release_year: self.min_release_year,
            limit: self.limit,
        }
    }
}

async fn recommendations(
    State(state): State<AppState>,
    Query(params): Query<RecommendationParams>,
) -> ApiResult<Recommendations> {
    let llm = if params.ai { state.llm.as_deref() } else { None };
    let mut recs = state
        .recommendations
        .recommend(&params.criteria(), params.use_case.as_deref(), llm)
        .await?;
    if params.ai && llm.is_none() {
        recs.ai_unavailable = Some(LlmError::MissingApiKey.user_message());
    }
    Ok(Json(recs))
}
