//! Query and mutation bookkeeping kept by the coordinator.

use crate::error::MutationKind;

// == Query State ==
/// Result of a remote query plus its loading and error status.
#[derive(Debug, Clone)]
pub struct QueryState<T> {
    /// Last successful result; `None` until the first fetch completes
    pub data: Option<T>,
    /// Error from the most recent attempt
    pub error: Option<String>,
    pending: usize,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            pending: 0,
        }
    }
}

impl<T> QueryState<T> {
    pub fn is_loading(&self) -> bool {
        self.pending > 0
    }

    pub fn begin(&mut self) {
        self.pending += 1;
    }

    /// Records a finished attempt. Failed attempts keep the previous data.
    pub fn complete<E: ToString>(&mut self, result: Result<T, E>) {
        self.pending = self.pending.saturating_sub(1);
        match result {
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
            }
            Err(err) => self.error = Some(err.to_string()),
        }
    }
}

// == In-Flight Mutations ==
/// Count of running mutations per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InFlight {
    pub creating: usize,
    pub updating: usize,
    pub deleting: usize,
}

impl InFlight {
    fn slot(&mut self, kind: MutationKind) -> &mut usize {
        match kind {
            MutationKind::Create => &mut self.creating,
            MutationKind::Update => &mut self.updating,
            MutationKind::Delete => &mut self.deleting,
        }
    }

    pub fn start(&mut self, kind: MutationKind) {
        *self.slot(kind) += 1;
    }

    pub fn finish(&mut self, kind: MutationKind) {
        let slot = self.slot(kind);
        *slot = slot.saturating_sub(1);
    }

    pub fn any(&self) -> bool {
        self.creating + self.updating + self.deleting > 0
    }
}
