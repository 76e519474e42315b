//! Integration Tests for the HTTP history service
//!
//! Runs the reqwest transport against a small axum stand-in for the backend.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, put},
    Json, Router,
};
use history_cache::cache::{shared, CacheStore};
use history_cache::models::{NewRecord, Record, RecordUpdate};
use history_cache::service::{HistoryService, HttpHistoryService};
use history_cache::{CoordinatorConfig, HistoryCoordinator};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};

// == Stub Backend ==

#[derive(Clone, Default)]
struct Backend {
    records: Arc<Mutex<Vec<Record>>>,
    last_auth: Arc<Mutex<Option<String>>>,
}

impl Backend {
    fn remember_auth(&self, headers: &HeaderMap) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        *self.last_auth.lock().unwrap() = auth;
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    user_id: String,
}

async fn list(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Record>> {
    backend.remember_auth(&headers);
    let records = backend.records.lock().unwrap();
    Json(
        records
            .iter()
            .filter(|r| r.user_id == query.user_id)
            .cloned()
            .collect(),
    )
}

async fn create(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(payload): Json<NewRecord>,
) -> Result<Json<Record>, (StatusCode, Json<Value>)> {
    backend.remember_auth(&headers);
    if payload.value <= 0.0 {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": "Validation error: value must be positive" })),
        ));
    }
    let mut records = backend.records.lock().unwrap();
    let record = Record::new(format!("srv{}", records.len() + 1), payload.user_id, payload.value);
    records.push(record.clone());
    Ok(Json(record))
}

async fn update(
    State(backend): State<Backend>,
    Path(id): Path<String>,
    Json(payload): Json<RecordUpdate>,
) -> Result<Json<Record>, StatusCode> {
    let mut records = backend.records.lock().unwrap();
    let record = records
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or(StatusCode::NOT_FOUND)?;
    if let Some(value) = payload.value {
        record.value = value;
    }
    Ok(Json(record.clone()))
}

async fn remove(State(backend): State<Backend>, Path(id): Path<String>) -> StatusCode {
    let mut records = backend.records.lock().unwrap();
    let before = records.len();
    records.retain(|r| r.id != id);
    if records.len() == before {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::NO_CONTENT
    }
}

async fn total() -> Json<Value> {
    Json(json!({ "total": 1000.0 }))
}

async fn spawn_backend(backend: Backend) -> String {
    let app = Router::new()
        .route("/api/histories", get(list).post(create))
        .route("/api/histories/total", get(total))
        .route("/api/histories/:id", put(update).delete(remove))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api", addr)
}

// == Transport Tests ==

#[tokio::test]
async fn test_list_sends_user_and_bearer_token() {
    let backend = Backend::default();
    backend.records.lock().unwrap().extend([
        Record::new("a", "alice", 1.0),
        Record::new("b", "bob", 2.0),
    ]);
    let endpoint = spawn_backend(backend.clone()).await;
    let service = HttpHistoryService::new(endpoint).unwrap();

    let records = assert_ok!(service.list("alice", Some("tokA")).await);

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "a");
    assert_eq!(
        backend.last_auth.lock().unwrap().as_deref(),
        Some("Bearer tokA")
    );
}

#[tokio::test]
async fn test_total() {
    let endpoint = spawn_backend(Backend::default()).await;
    let service = HttpHistoryService::new(endpoint).unwrap();

    assert_eq!(assert_ok!(service.total().await), 1000.0);
}

#[tokio::test]
async fn test_create_rejection_carries_backend_message() {
    let endpoint = spawn_backend(Backend::default()).await;
    let service = HttpHistoryService::new(endpoint).unwrap();

    let response = service
        .create(
            None,
            NewRecord {
                user_id: "alice".to_string(),
                value: -5.0,
            },
        )
        .await;

    assert!(!response.success);
    assert_eq!(
        response.error.as_deref(),
        Some("Validation error: value must be positive")
    );
}

#[tokio::test]
async fn test_update_and_delete_round_trip() {
    let backend = Backend::default();
    backend
        .records
        .lock()
        .unwrap()
        .push(Record::new("x", "alice", 1.0));
    let endpoint = spawn_backend(backend.clone()).await;
    let service = HttpHistoryService::new(endpoint).unwrap();

    let updated = service
        .update(None, "x", RecordUpdate { value: Some(3.0) })
        .await;
    assert!(updated.success);
    assert_eq!(updated.data.unwrap().value, 3.0);

    assert!(service.delete(None, "x").await.success);
    assert!(!service.delete(None, "x").await.success);
    assert!(backend.records.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_backend_is_an_error() {
    // Bind then drop to get a port nobody listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let service = HttpHistoryService::new(format!("http://{}/api", addr)).unwrap();
    assert_err!(service.total().await);
}

// == Coordinator over HTTP ==

#[tokio::test]
async fn test_coordinator_end_to_end_over_http() {
    let backend = Backend::default();
    backend
        .records
        .lock()
        .unwrap()
        .push(Record::new("seed", "alice", 25.0));
    let endpoint = spawn_backend(backend).await;

    let cache = shared(CacheStore::new());
    let config = CoordinatorConfig::new(endpoint)
        .with_user("alice")
        .with_credential("tokA");
    let coordinator = HistoryCoordinator::connect(config, cache.clone()).unwrap();

    coordinator.fetch_total().await;
    coordinator
        .maybe_auto_fetch()
        .await
        .expect("auto-fetch should fire")
        .await
        .unwrap();
    coordinator
        .create(NewRecord {
            user_id: "alice".to_string(),
            value: 75.0,
        })
        .await
        .unwrap();

    let snapshot = coordinator.snapshot().await;
    assert_eq!(snapshot.records.len(), 2);
    assert_eq!(snapshot.percentage, 10.0);
    assert!(!snapshot.is_cached);
    assert_eq!(cache.read().await.get("alice", None).unwrap().len(), 2);

    let err = coordinator
        .create(NewRecord {
            user_id: "alice".to_string(),
            value: 0.0,
        })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Validation error: value must be positive");
}
