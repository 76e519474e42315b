//! Cache Change Subscriptions
//!
//! Every write to the store is published on a broadcast channel; a
//! subscription filters that stream down to a single user id.

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::warn;

use crate::cache::CacheEntry;

/// Number of changes buffered per subscriber before it starts lagging.
pub const CHANGE_CHANNEL_CAPACITY: usize = 64;

// == Cache Change ==
/// A change to one user's cache slot.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheChange {
    pub user_id: String,
    /// New entry contents, or `None` when the entry was physically removed
    pub entry: Option<CacheEntry>,
}

// == Cache Subscription ==
/// Receives changes for a single user's cache entry.
#[derive(Debug)]
pub struct CacheSubscription {
    user_id: String,
    receiver: broadcast::Receiver<CacheChange>,
}

impl CacheSubscription {
    pub(crate) fn new(user_id: String, receiver: broadcast::Receiver<CacheChange>) -> Self {
        Self { user_id, receiver }
    }

    /// The user id this subscription is filtered on.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Waits for the next change to this user's entry.
    ///
    /// Returns `None` once the store has been dropped. A subscriber that
    /// falls behind skips the overwritten changes and keeps receiving.
    pub async fn recv(&mut self) -> Option<CacheChange> {
        loop {
            match self.receiver.recv().await {
                Ok(change) if change.user_id == self.user_id => return Some(change),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(user_id = %self.user_id, skipped, "Cache subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Returns the next pending change for this user without waiting.
    pub fn try_recv(&mut self) -> Option<CacheChange> {
        loop {
            match self.receiver.try_recv() {
                Ok(change) if change.user_id == self.user_id => return Some(change),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(user_id = %self.user_id, skipped, "Cache subscriber lagged");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}
