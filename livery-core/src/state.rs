//! Surface sync state and resync scheduling.
//!
//! Every mutation marks the surface dirty. Bursts of mutations (typing in the
//! property panel, slider drags) are coalesced: the resync fires once the
//! surface has been quiet for the configured quiescence window. Gesture ends
//! and explicit flushes resync immediately.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

pub use crate::controller::DragState;

/// Default quiescence window before a coalesced resync fires.
pub const DEFAULT_QUIESCENCE: Duration = Duration::from_millis(50);

/// Whether the texture reflects the current decal surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SyncState {
    /// The last applied texture matches the surface.
    #[default]
    Clean,
    /// The surface changed since the last resync started.
    Dirty,
    /// A decode is in flight.
    Resyncing {
        /// Sequence number of the in-flight decode.
        seq: u64,
    },
}

/// Decides when a resync should run.
#[derive(Debug, Clone)]
pub struct ResyncScheduler {
    quiescence: Duration,
    state: SyncState,
    last_mutation: Option<Instant>,
    dirty_during_resync: bool,
}

impl Default for ResyncScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_QUIESCENCE)
    }
}

impl ResyncScheduler {
    /// Create a scheduler with the given quiescence window.
    #[must_use]
    pub fn new(quiescence: Duration) -> Self {
        Self {
            quiescence,
            state: SyncState::Clean,
            last_mutation: None,
            dirty_during_resync: false,
        }
    }

    /// Current sync state.
    #[must_use]
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Quiescence window.
    #[must_use]
    pub fn quiescence(&self) -> Duration {
        self.quiescence
    }

    /// Check whether a resync is owed.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        matches!(self.state, SyncState::Dirty) || self.dirty_during_resync
    }

    /// Record a surface mutation at `now`.
    pub fn mark_dirty(&mut self, now: Instant) {
        self.last_mutation = Some(now);
        match self.state {
            SyncState::Resyncing { .. } => self.dirty_during_resync = true,
            SyncState::Clean | SyncState::Dirty => self.state = SyncState::Dirty,
        }
    }

    /// Request a resync without waiting for quiescence (gesture ends,
    /// explicit flushes, loads).
    pub fn request_immediate(&mut self) {
        self.last_mutation = None;
        match self.state {
            SyncState::Resyncing { .. } => self.dirty_during_resync = true,
            SyncState::Clean | SyncState::Dirty => self.state = SyncState::Dirty,
        }
    }

    /// Check whether the quiescence window has elapsed since the last
    /// mutation and a resync should start.
    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        if !matches!(self.state, SyncState::Dirty) {
            return false;
        }
        match self.last_mutation {
            Some(last) => now.saturating_duration_since(last) >= self.quiescence,
            None => true,
        }
    }

    /// Record that a decode with sequence `seq` started.
    pub fn started(&mut self, seq: u64) {
        self.state = SyncState::Resyncing { seq };
        self.dirty_during_resync = false;
    }

    /// Record that the decode with sequence `seq` finished, applied or not.
    ///
    /// Completions for older sequences leave the state untouched.
    pub fn finished(&mut self, seq: u64) {
        match self.state {
            SyncState::Resyncing { seq: current } if current == seq => {
                self.state = if self.dirty_during_resync {
                    SyncState::Dirty
                } else {
                    SyncState::Clean
                };
                self.dirty_during_resync = false;
            }
            _ => {}
        }
    }
}
