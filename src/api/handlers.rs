//! API Handlers
//!
//! HTTP request handlers for the history view and the cache surface.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::cache::{SharedCache, DEFAULT_MAX_AGE_MS};
use crate::coordinator::{HistoryCoordinator, HistorySnapshot};
use crate::error::{HistoryError, Result};
use crate::models::{
    CacheEntryResponse, HealthResponse, MessageResponse, NewRecord, Record, RecordUpdate,
    RemovedResponse, SessionRequest,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: HistoryCoordinator,
    /// Max age applied by the cache surface and the purge endpoint
    pub max_age_ms: u64,
}

impl AppState {
    /// Creates a new AppState around a coordinator.
    pub fn new(coordinator: HistoryCoordinator) -> Self {
        Self {
            coordinator,
            max_age_ms: DEFAULT_MAX_AGE_MS,
        }
    }

    pub fn with_max_age(mut self, max_age_ms: u64) -> Self {
        self.max_age_ms = max_age_ms;
        self
    }

    fn cache(&self) -> &SharedCache {
        self.coordinator.cache()
    }
}

// == History ==

/// Handler for GET /history
pub async fn snapshot_handler(State(state): State<AppState>) -> Json<HistorySnapshot> {
    Json(state.coordinator.snapshot().await)
}

/// Handler for POST /history
///
/// Responds with the view after the record was added.
pub async fn create_handler(
    State(state): State<AppState>,
    Json(payload): Json<NewRecord>,
) -> Result<(StatusCode, Json<HistorySnapshot>)> {
    state.coordinator.create(payload).await?;
    Ok((StatusCode::CREATED, Json(state.coordinator.snapshot().await)))
}

/// Handler for PUT /history/:id
pub async fn update_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<RecordUpdate>,
) -> Result<Json<HistorySnapshot>> {
    state.coordinator.update(&id, payload).await?;
    Ok(Json(state.coordinator.snapshot().await))
}

/// Handler for DELETE /history/:id
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<HistorySnapshot>> {
    state.coordinator.delete(&id).await?;
    Ok(Json(state.coordinator.snapshot().await))
}

/// Handler for POST /history/refresh
///
/// Starts a re-fetch and returns without waiting for it.
pub async fn refresh_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<MessageResponse>) {
    state.coordinator.refresh();
    (
        StatusCode::ACCEPTED,
        Json(MessageResponse::new("Refresh started")),
    )
}

/// Handler for PUT /session
///
/// Switches user and credential; a credential change starts a new
/// auto-fetch session.
pub async fn session_handler(
    State(state): State<AppState>,
    Json(req): Json<SessionRequest>,
) -> Result<Json<HistorySnapshot>> {
    if let Some(error_msg) = req.validate() {
        return Err(HistoryError::InvalidRequest(error_msg));
    }

    state
        .coordinator
        .set_session(req.user_id, req.credential)
        .await;

    Ok(Json(state.coordinator.snapshot().await))
}

// == Cache ==

/// Handler for GET /cache/:user_id
///
/// Stale entries are reported as not found.
pub async fn cache_get_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<CacheEntryResponse>> {
    let cache = state.cache().read().await;
    let entry = cache
        .get_entry(&user_id, Some(state.max_age_ms))
        .cloned()
        .ok_or_else(|| HistoryError::NotFound(user_id.clone()))?;

    Ok(Json(CacheEntryResponse::new(user_id, entry)))
}

/// Handler for PUT /cache/:user_id
///
/// Replaces the user's entry wholesale.
pub async fn cache_set_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(records): Json<Vec<Record>>,
) -> Result<Json<CacheEntryResponse>> {
    let mut cache = state.cache().write().await;
    cache.set(&user_id, records);
    let entry = cache
        .get_entry(&user_id, None)
        .cloned()
        .ok_or_else(|| HistoryError::Internal("cache entry vanished after set".to_string()))?;

    Ok(Json(CacheEntryResponse::new(user_id, entry)))
}

/// Handler for POST /cache/:user_id/records
pub async fn cache_add_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(record): Json<Record>,
) -> StatusCode {
    state.cache().write().await.add(&user_id, record);
    StatusCode::NO_CONTENT
}

/// Handler for PUT /cache/:user_id/records/:record_id
pub async fn cache_update_handler(
    State(state): State<AppState>,
    Path((user_id, record_id)): Path<(String, String)>,
    Json(record): Json<Record>,
) -> StatusCode {
    state
        .cache()
        .write()
        .await
        .update(&user_id, &record_id, record);
    StatusCode::NO_CONTENT
}

/// Handler for DELETE /cache/:user_id/records/:record_id
pub async fn cache_remove_handler(
    State(state): State<AppState>,
    Path((user_id, record_id)): Path<(String, String)>,
) -> StatusCode {
    state.cache().write().await.remove(&user_id, &record_id);
    StatusCode::NO_CONTENT
}

/// Handler for DELETE /cache
pub async fn cache_clear_handler(State(state): State<AppState>) -> Json<RemovedResponse> {
    let removed = state.cache().write().await.clear_all();
    Json(RemovedResponse::new(removed))
}

/// Handler for POST /purge
pub async fn purge_handler(State(state): State<AppState>) -> Json<RemovedResponse> {
    let removed = state
        .cache()
        .write()
        .await
        .purge_expired(Some(state.max_age_ms));
    Json(RemovedResponse::new(removed))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
