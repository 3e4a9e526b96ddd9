//! Volatile cross-cutting state.
//!
//! Flags here live in memory only. They are seeded with defaults, changed by
//! merging patches, and reset on sign-out.

use parking_lot::RwLock;
use studydash_core::{Participant, Reports};

/// In-memory flags shared across the dashboard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VolatileState {
    pub has_unsaved_changes: bool,
    pub participant: Option<Participant>,
    pub reports: Option<Reports>,
}

/// A partial update; unset fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct StatePatch {
    has_unsaved_changes: Option<bool>,
    participant: Option<Option<Participant>>,
    reports: Option<Option<Reports>>,
}

impl StatePatch {
    /// An empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the unsaved-changes flag.
    pub fn has_unsaved_changes(mut self, value: bool) -> Self {
        self.has_unsaved_changes = Some(value);
        self
    }

    /// Set or clear the participant.
    pub fn participant(mut self, participant: Option<Participant>) -> Self {
        self.participant = Some(participant);
        self
    }

    /// Set or clear the reports.
    pub fn reports(mut self, reports: Option<Reports>) -> Self {
        self.reports = Some(reports);
        self
    }

    fn apply(self, state: &mut VolatileState) {
        if let Some(flag) = self.has_unsaved_changes {
            state.has_unsaved_changes = flag;
        }
        if let Some(participant) = self.participant {
            state.participant = participant;
        }
        if let Some(reports) = self.reports {
            state.reports = reports;
        }
    }
}

/// The volatile state container.
#[derive(Debug, Default)]
pub struct AppState {
    state: RwLock<VolatileState>,
}

impl AppState {
    /// Create a container holding defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the whole state.
    pub fn get_state(&self) -> VolatileState {
        self.state.read().clone()
    }

    /// Merge `patch` into the state and return the result.
    pub fn set_state(&self, patch: StatePatch) -> VolatileState {
        let mut state = self.state.write();
        patch.apply(&mut state);
        state.clone()
    }

    /// Back to defaults.
    pub fn reset(&self) {
        *self.state.write() = VolatileState::default();
    }

    /// The participant currently held, if any.
    pub fn participant(&self) -> Option<Participant> {
        self.state.read().participant.clone()
    }

    /// The reports currently held, if any.
    pub fn reports(&self) -> Option<Reports> {
        self.state.read().reports.clone()
    }

    /// Whether a form has unsaved edits.
    pub fn has_unsaved_changes(&self) -> bool {
        self.state.read().has_unsaved_changes
    }
}
