//! History Coordinator
//!
//! Reconciles live backend data with the per-user cache, derives the
//! share-of-total metric and runs mutations against the backend, mirroring
//! successful results into the cache.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{CacheStore, CacheSubscription, SharedCache, DEFAULT_MAX_AGE_MS};
use crate::coordinator::guard::{AutoFetchConditions, AutoFetchGuard, AutoFetchState};
use crate::coordinator::metrics;
use crate::coordinator::state::{InFlight, QueryState};
use crate::error::{HistoryError, MutationKind, Result, ServiceError};
use crate::models::{NewRecord, Record, RecordUpdate};
use crate::service::{HistoryService, HttpHistoryService, MutationResponse};

// == Configuration ==
/// Who the coordinator is working for and where the backend lives.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorConfig {
    /// Base URL of the history backend
    pub endpoint: String,
    /// Current user; `None` when nobody is signed in
    pub user_id: Option<String>,
    /// Bearer credential; `None` when signed out
    pub credential: Option<String>,
    /// Fetch automatically once per credential session
    pub auto_fetch: bool,
}

impl CoordinatorConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            user_id: None,
            credential: None,
            auto_fetch: true,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    pub fn with_auto_fetch(mut self, auto_fetch: bool) -> Self {
        self.auto_fetch = auto_fetch;
        self
    }
}

// == Snapshot ==
/// Everything a consumer needs to render the current history view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySnapshot {
    pub records: Vec<Record>,
    pub total: f64,
    pub percentage: f64,
    pub is_loading: bool,
    pub error: Option<String>,
    /// True when `records` came from the cache rather than a live fetch
    pub is_cached: bool,
    /// Write time of the cache entry (Unix ms), only when `is_cached`
    pub cached_at: Option<u64>,
}

#[derive(Debug, Default)]
struct Effective {
    records: Vec<Record>,
    is_cached: bool,
    cached_at: Option<u64>,
}

// == Internal State ==
#[derive(Debug)]
struct Inner {
    config: CoordinatorConfig,
    live: QueryState<Arc<Vec<Record>>>,
    total: QueryState<f64>,
    in_flight: InFlight,
    /// Live list most recently written to the cache, compared by identity
    last_synced: Option<Arc<Vec<Record>>>,
    guard: AutoFetchGuard,
    /// Bumped on every user switch; fetches started earlier are discarded
    session: u64,
}

fn lock_inner(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// User and credential as they were when a call started.
#[derive(Debug, Clone)]
struct CallContext {
    user_id: Option<String>,
    credential: Option<String>,
    session: u64,
}

/// Marks a mutation as in flight until dropped.
struct InFlightTicket {
    inner: Arc<Mutex<Inner>>,
    kind: MutationKind,
}

impl Drop for InFlightTicket {
    fn drop(&mut self) {
        lock_inner(&self.inner).in_flight.finish(self.kind);
    }
}

/// A successful mutation, replayed onto the cache and the live list.
#[derive(Debug)]
enum Change {
    Add(Record),
    Update(String, Record),
    Remove(String),
}

impl Change {
    fn kind(&self) -> MutationKind {
        match self {
            Change::Add(_) => MutationKind::Create,
            Change::Update(..) => MutationKind::Update,
            Change::Remove(_) => MutationKind::Delete,
        }
    }

    fn apply_to_cache(&self, cache: &mut CacheStore, user_id: &str) {
        match self {
            Change::Add(record) => cache.add(user_id, record.clone()),
            Change::Update(id, record) => cache.update(user_id, id, record.clone()),
            Change::Remove(id) => cache.remove(user_id, id),
        }
    }

    fn apply_to_records(&self, records: &mut Vec<Record>) {
        match self {
            Change::Add(record) => records.push(record.clone()),
            Change::Update(id, record) => {
                if let Some(slot) = records.iter_mut().find(|r| &r.id == id) {
                    *slot = record.clone();
                }
            }
            Change::Remove(id) => records.retain(|r| &r.id != id),
        }
    }
}

/// Splits a backend mutation answer into its payload or a [`HistoryError`].
fn accept<T>(kind: MutationKind, response: MutationResponse<T>) -> Result<Option<T>> {
    if response.success {
        return Ok(response.data);
    }
    let err = HistoryError::mutation(kind, response.error);
    warn!(%kind, error = %err, "History mutation rejected");
    Err(err)
}

// == History Coordinator ==
/// Cheap-to-clone handle; clones share state.
#[derive(Clone)]
pub struct HistoryCoordinator {
    inner: Arc<Mutex<Inner>>,
    service: Arc<dyn HistoryService>,
    cache: SharedCache,
    max_age_ms: u64,
}

impl HistoryCoordinator {
    // == Constructors ==
    /// Creates a coordinator over an injected backend transport.
    pub fn new(
        config: CoordinatorConfig,
        service: Arc<dyn HistoryService>,
        cache: SharedCache,
    ) -> Self {
        let inner = Inner {
            config,
            live: QueryState::default(),
            total: QueryState::default(),
            in_flight: InFlight::default(),
            last_synced: None,
            guard: AutoFetchGuard::new(),
            session: 0,
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
            service,
            cache,
            max_age_ms: DEFAULT_MAX_AGE_MS,
        }
    }

    /// Creates a coordinator talking HTTP to `config.endpoint`.
    pub fn connect(
        config: CoordinatorConfig,
        cache: SharedCache,
    ) -> std::result::Result<Self, ServiceError> {
        let service = HttpHistoryService::new(config.endpoint.clone())?;
        Ok(Self::new(config, Arc::new(service), cache))
    }

    /// Overrides how old cached data may be before it stops serving as a
    /// fallback.
    pub fn with_max_age(mut self, max_age_ms: u64) -> Self {
        self.max_age_ms = max_age_ms;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock_inner(&self.inner)
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    pub fn config(&self) -> CoordinatorConfig {
        self.lock().config.clone()
    }

    pub fn auto_fetch_state(&self) -> AutoFetchState {
        self.lock().guard.state()
    }

    // == Lifecycle ==
    /// Starts the global total fetch in the background and evaluates the
    /// auto-fetch guard. Returns the auto-fetch task if one was started.
    pub async fn activate(&self) -> Option<JoinHandle<()>> {
        let this = self.clone();
        tokio::spawn(async move { this.fetch_total().await });
        self.maybe_auto_fetch().await
    }

    /// Fires the automatic fetch if this session has not tried yet and there
    /// is nothing to show.
    pub async fn maybe_auto_fetch(&self) -> Option<JoinHandle<()>> {
        let records_empty = self.effective().await.records.is_empty();
        let fired = {
            let mut inner = self.lock();
            let conditions = AutoFetchConditions {
                auto_fetch: inner.config.auto_fetch,
                has_credential: inner.config.credential.is_some(),
                has_user: inner.config.user_id.is_some(),
                records_empty,
            };
            inner.guard.try_fire(conditions)
        };

        if !fired {
            return None;
        }
        info!("Auto-fetching history");
        Some(self.refresh())
    }

    /// Replaces the credential. Any change starts a new auto-fetch session.
    pub async fn set_credential(&self, credential: Option<String>) -> Option<JoinHandle<()>> {
        apply_credential(&mut self.lock(), credential);
        self.maybe_auto_fetch().await
    }

    /// Switches the current user. Live data belonged to the previous user
    /// and is dropped.
    pub async fn set_user(&self, user_id: Option<String>) -> Option<JoinHandle<()>> {
        apply_user(&mut self.lock(), user_id);
        self.maybe_auto_fetch().await
    }

    /// Switches user and credential together, evaluating auto-fetch once.
    pub async fn set_session(
        &self,
        user_id: Option<String>,
        credential: Option<String>,
    ) -> Option<JoinHandle<()>> {
        {
            let mut inner = self.lock();
            apply_user(&mut inner, user_id);
            apply_credential(&mut inner, credential);
        }
        self.maybe_auto_fetch().await
    }

    // == Fetching ==
    /// Re-fetches the current user's records in the background.
    pub fn refresh(&self) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move { this.fetch_records().await })
    }

    /// Fetches the current user's records and syncs them into the cache.
    pub async fn fetch_records(&self) {
        let (user_id, call) = {
            let mut inner = self.lock();
            let Some(user_id) = inner.config.user_id.clone() else {
                debug!("No user set, skipping history fetch");
                return;
            };
            inner.live.begin();
            (user_id, self.call_context(&inner))
        };
        let user_id = user_id.as_str();

        let result = self.service.list(user_id, call.credential.as_deref()).await;

        {
            let mut inner = self.lock();
            if inner.session != call.session {
                debug!(user_id, "Discarding history fetched for a previous user");
                return;
            }
            match &result {
                Ok(records) => debug!(user_id, count = records.len(), "History fetched"),
                Err(err) => warn!(user_id, error = %err, "History fetch failed"),
            }
            inner.live.complete(result.map(Arc::new));
        }

        self.sync_cache().await;
    }

    /// Fetches the global total.
    pub async fn fetch_total(&self) {
        self.lock().total.begin();
        let result = self.service.total().await;
        if let Err(err) = &result {
            warn!(error = %err, "Global total fetch failed");
        }
        self.lock().total.complete(result);
    }

    // == Reads ==
    /// Current view: live records when there are any, otherwise fresh cached
    /// records, otherwise nothing.
    pub async fn snapshot(&self) -> HistorySnapshot {
        self.sync_cache().await;
        let effective = self.effective().await;

        let inner = self.lock();
        let total = inner.total.data.unwrap_or(0.0);
        HistorySnapshot {
            percentage: metrics::percentage(&effective.records, total),
            records: effective.records,
            total,
            is_loading: inner.live.is_loading()
                || inner.total.is_loading()
                || inner.in_flight.any(),
            error: inner
                .live
                .error
                .clone()
                .or_else(|| inner.total.error.clone()),
            is_cached: effective.is_cached,
            cached_at: effective.cached_at,
        }
    }

    /// Subscribes to cache changes for the current user.
    pub async fn subscribe(&self) -> Option<CacheSubscription> {
        let user_id = self.lock().config.user_id.clone()?;
        Some(self.cache.read().await.subscribe(&user_id))
    }

    async fn effective(&self) -> Effective {
        let (live, user_id) = {
            let inner = self.lock();
            (inner.live.data.clone(), inner.config.user_id.clone())
        };

        if let Some(live) = live.filter(|records| !records.is_empty()) {
            return Effective {
                records: live.to_vec(),
                is_cached: false,
                cached_at: None,
            };
        }

        let Some(user_id) = user_id else {
            return Effective::default();
        };
        let cache = self.cache.read().await;
        match cache.get_entry(&user_id, Some(self.max_age_ms)) {
            Some(entry) if !entry.records.is_empty() => Effective {
                records: entry.records.clone(),
                is_cached: true,
                cached_at: Some(entry.cached_at),
            },
            _ => Effective::default(),
        }
    }

    /// Writes the live list into the cache once per distinct list instance.
    async fn sync_cache(&self) {
        let pending = {
            let mut inner = self.lock();
            let live = inner.live.data.clone().filter(|records| !records.is_empty());
            match (live, inner.config.user_id.clone()) {
                (Some(live), Some(user_id)) if !same_list(&inner.last_synced, &live) => {
                    inner.last_synced = Some(live.clone());
                    Some((user_id, live))
                }
                _ => None,
            }
        };

        if let Some((user_id, live)) = pending {
            debug!(user_id, count = live.len(), "Syncing live history into cache");
            self.cache.write().await.set(&user_id, live.to_vec());
        }
    }

    // == Mutations ==
    /// Creates a record. On success the backend's canonical record is
    /// appended to the caller's cache entry.
    pub async fn create(&self, payload: NewRecord) -> Result<()> {
        let (_ticket, call) = self.begin_mutation(MutationKind::Create);
        let response = self.service.create(call.credential.as_deref(), payload).await;

        match accept(MutationKind::Create, response)? {
            Some(record) => self.mirror(&call, Change::Add(record)).await,
            None => warn!("Create succeeded without a record, cache not updated"),
        }
        Ok(())
    }

    /// Updates record `id`, replacing it in the cache with the backend's
    /// canonical version.
    pub async fn update(&self, id: &str, payload: RecordUpdate) -> Result<()> {
        let (_ticket, call) = self.begin_mutation(MutationKind::Update);
        let response = self
            .service
            .update(call.credential.as_deref(), id, payload)
            .await;

        match accept(MutationKind::Update, response)? {
            Some(record) => {
                self.mirror(&call, Change::Update(id.to_string(), record))
                    .await
            }
            None => warn!(id, "Update succeeded without a record, cache not updated"),
        }
        Ok(())
    }

    /// Deletes record `id` and drops it from the cache.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let (_ticket, call) = self.begin_mutation(MutationKind::Delete);
        let response = self.service.delete(call.credential.as_deref(), id).await;

        accept(MutationKind::Delete, response)?;
        self.mirror(&call, Change::Remove(id.to_string())).await;
        Ok(())
    }

    fn call_context(&self, inner: &Inner) -> CallContext {
        CallContext {
            user_id: inner.config.user_id.clone(),
            credential: inner.config.credential.clone(),
            session: inner.session,
        }
    }

    fn begin_mutation(&self, kind: MutationKind) -> (InFlightTicket, CallContext) {
        let mut inner = self.lock();
        inner.in_flight.start(kind);
        let call = self.call_context(&inner);
        let ticket = InFlightTicket {
            inner: self.inner.clone(),
            kind,
        };
        (ticket, call)
    }

    /// Replays a successful mutation onto the cache slot of the user who
    /// issued it, and onto the loaded live list if that user is still current.
    async fn mirror(&self, call: &CallContext, change: Change) {
        let kind = change.kind();
        let Some(user_id) = call.user_id.as_deref() else {
            debug!(%kind, "No user set, mutation not mirrored into cache");
            return;
        };

        {
            let mut inner = self.lock();
            if inner.session != call.session {
                debug!(user_id, %kind, "User switched mid-mutation, live list left alone");
            } else if let Some(live) = inner.live.data.as_mut() {
                let mut next = live.to_vec();
                change.apply_to_records(&mut next);
                *live = Arc::new(next);
            }
        }

        change.apply_to_cache(&mut *self.cache.write().await, user_id);
        info!(user_id, %kind, "History mutation applied");
    }
}

fn apply_credential(inner: &mut Inner, credential: Option<String>) {
    if inner.config.credential == credential {
        return;
    }
    info!(
        signed_in = credential.is_some(),
        "Credential changed, auto-fetch guard reset"
    );
    inner.config.credential = credential;
    inner.guard.reset();
}

fn apply_user(inner: &mut Inner, user_id: Option<String>) {
    if inner.config.user_id == user_id {
        return;
    }
    info!(user_id = ?user_id, "Switching history user");
    inner.config.user_id = user_id;
    inner.session += 1;
    inner.live = QueryState::default();
    inner.last_synced = None;
}

fn same_list(previous: &Option<Arc<Vec<Record>>>, current: &Arc<Vec<Record>>) -> bool {
    previous
        .as_ref()
        .is_some_and(|previous| Arc::ptr_eq(previous, current))
}
