//! In-process history service.
//!
//! Behaves like the backend for tests and offline demos, with knobs for
//! scripted failures and artificial latency.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use super::{HistoryService, MutationResponse};
use crate::error::ServiceError;
use crate::models::{NewRecord, Record, RecordUpdate};

#[derive(Debug, Default)]
struct MemoryState {
    records: Vec<Record>,
    total: f64,
    next_id: u64,
    /// When set, every mutation fails with this (optional) message
    mutation_failure: Option<Option<String>>,
    list_failure: Option<String>,
    total_failure: Option<String>,
}

/// History backend held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryHistoryService {
    state: Mutex<MemoryState>,
    latency: Duration,
    list_calls: AtomicUsize,
}

impl MemoryHistoryService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the backend with existing records.
    pub fn with_records(self, records: Vec<Record>) -> Self {
        self.lock().records = records;
        self
    }

    /// Sets the global total returned by [`HistoryService::total`].
    pub fn with_total(self, total: f64) -> Self {
        self.lock().total = total;
        self
    }

    /// Delays every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Makes every mutation fail with `message` (or no message) until
    /// [`MemoryHistoryService::clear_failures`] is called.
    pub fn fail_mutations(&self, message: Option<&str>) {
        self.lock().mutation_failure = Some(message.map(str::to_string));
    }

    pub fn fail_list(&self, message: &str) {
        self.lock().list_failure = Some(message.to_string());
    }

    pub fn fail_total(&self, message: &str) {
        self.lock().total_failure = Some(message.to_string());
    }

    pub fn clear_failures(&self) {
        let mut state = self.lock();
        state.mutation_failure = None;
        state.list_failure = None;
        state.total_failure = None;
    }

    /// Number of times `list` has been called.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Every record currently held, in insertion order.
    pub fn records(&self) -> Vec<Record> {
        self.lock().records.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A panic while holding the lock leaves plain data behind; keep serving it.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn rejected<T>(&self) -> Option<MutationResponse<T>> {
        self.lock()
            .mutation_failure
            .clone()
            .map(MutationResponse::failed)
    }
}

#[async_trait]
impl HistoryService for MemoryHistoryService {
    async fn list(
        &self,
        user_id: &str,
        _credential: Option<&str>,
    ) -> Result<Vec<Record>, ServiceError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        let state = self.lock();
        if let Some(message) = &state.list_failure {
            return Err(ServiceError::Status {
                status: 500,
                message: message.clone(),
            });
        }
        Ok(state
            .records
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn total(&self) -> Result<f64, ServiceError> {
        self.simulate_latency().await;

        let state = self.lock();
        match &state.total_failure {
            Some(message) => Err(ServiceError::Status {
                status: 500,
                message: message.clone(),
            }),
            None => Ok(state.total),
        }
    }

    async fn create(
        &self,
        _credential: Option<&str>,
        payload: NewRecord,
    ) -> MutationResponse<Record> {
        self.simulate_latency().await;
        if let Some(rejected) = self.rejected() {
            return rejected;
        }

        let mut state = self.lock();
        state.next_id += 1;
        let record = Record::new(format!("h{}", state.next_id), payload.user_id, payload.value);
        state.records.push(record.clone());
        MutationResponse::ok(record)
    }

    async fn update(
        &self,
        _credential: Option<&str>,
        id: &str,
        payload: RecordUpdate,
    ) -> MutationResponse<Record> {
        self.simulate_latency().await;
        if let Some(rejected) = self.rejected() {
            return rejected;
        }

        let mut state = self.lock();
        match state.records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                if let Some(value) = payload.value {
                    record.value = value;
                }
                record.updated_at = Utc::now();
                MutationResponse::ok(record.clone())
            }
            None => MutationResponse::failed(Some(format!("History not found: {}", id))),
        }
    }

    async fn delete(&self, _credential: Option<&str>, id: &str) -> MutationResponse<()> {
        self.simulate_latency().await;
        if let Some(rejected) = self.rejected() {
            return rejected;
        }

        let mut state = self.lock();
        let before = state.records.len();
        state.records.retain(|r| r.id != id);
        if state.records.len() == before {
            return MutationResponse::failed(Some(format!("History not found: {}", id)));
        }
        MutationResponse::ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_list_filters_by_user() {
        let service = MemoryHistoryService::new().with_records(vec![
            Record::new("a", "alice", 1.0),
            Record::new("b", "bob", 2.0),
        ]);

        let records = assert_ok!(service.list("alice", None).await);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "a");
        assert_eq!(service.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_create_assigns_ids() {
        let service = MemoryHistoryService::new();
        let payload = NewRecord {
            user_id: "alice".to_string(),
            value: 10.0,
        };

        let first = service.create(None, payload.clone()).await;
        let second = service.create(None, payload).await;

        assert_eq!(first.data.unwrap().id, "h1");
        assert_eq!(second.data.unwrap().id, "h2");
        assert_eq!(service.records().len(), 2);
    }

    #[tokio::test]
    async fn test_scripted_failures() {
        let service = MemoryHistoryService::new().with_total(100.0);
        service.fail_mutations(Some("nope"));
        service.fail_total("total down");

        let resp = service.delete(None, "x").await;
        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("nope"));
        assert_err!(service.total().await);

        service.clear_failures();
        assert_eq!(assert_ok!(service.total().await), 100.0);
    }

    #[tokio::test]
    async fn test_update_missing_record_fails() {
        let service = MemoryHistoryService::new();
        let resp = service
            .update(None, "ghost", RecordUpdate { value: Some(1.0) })
            .await;
        assert!(!resp.success);
    }
}
