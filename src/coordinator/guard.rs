//! One-shot auto-fetch guard.
//!
//! A session lasts until the credential changes. Within a session the
//! automatic fetch fires at most once, however many times initialization is
//! signalled.

/// Where the guard stands in the current session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AutoFetchState {
    #[default]
    NotAttempted,
    Attempted,
}

/// Everything that must hold for the automatic fetch to fire.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoFetchConditions {
    pub auto_fetch: bool,
    pub has_credential: bool,
    pub has_user: bool,
    /// No records to show, live or cached
    pub records_empty: bool,
}

impl AutoFetchConditions {
    fn ready(&self) -> bool {
        self.auto_fetch && self.has_credential && self.has_user && self.records_empty
    }
}

#[derive(Debug, Default)]
pub struct AutoFetchGuard {
    state: AutoFetchState,
}

impl AutoFetchGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AutoFetchState {
        self.state
    }

    /// Moves to `Attempted` and returns true when the fetch should fire.
    pub fn try_fire(&mut self, conditions: AutoFetchConditions) -> bool {
        if self.state == AutoFetchState::Attempted || !conditions.ready() {
            return false;
        }
        self.state = AutoFetchState::Attempted;
        true
    }

    /// Starts a new session.
    pub fn reset(&mut self) {
        self.state = AutoFetchState::NotAttempted;
    }
}
