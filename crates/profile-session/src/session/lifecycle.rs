//! # Session lifecycle and liveness
//!
//! A session is one open-to-close lifetime of the panel. Opening starts a new
//! cycle and runs [`SessionState::reinitialize`] exactly once. Closing only
//! clears the "initialized" marker: work already in flight keeps running and
//! still lands, since the host store must match what the backend accepted.
//!
//! Liveness ends on teardown alone. Async continuations capture a
//! [`LivenessToken`] before their first await and check it under the state
//! lock before every mutation. Teardown bumps the generation, so a token taken
//! before it stays dead even after the panel opens again.
//!
//! The token also records the cycle it was taken in. A continuation whose
//! cycle has been replaced by a reopen still commits profile data, but leaves
//! the new cycle's selection, view and operation claim alone.

use super::guards::ActiveOperation;
use super::state::SessionState;
use crate::config::DraftLimits;
use crate::model::{CommittedProfile, MediaSelection, ProfileDraft};
use std::fmt;

/// Lifecycle phase of the panel session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SessionLifecycle {
    /// Closed; the next open re-seeds everything
    #[default]
    Idle,
    /// Open edge seen, state being seeded
    Initializing,
    /// Open and initialized
    Active,
    /// Teardown in progress
    Closing,
}

impl fmt::Display for SessionLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Initializing => "initializing",
            Self::Active => "active",
            Self::Closing => "closing",
        };
        f.write_str(name)
    }
}

/// Proof of which liveness generation and open cycle a continuation belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LivenessToken {
    generation: u64,
    cycle: u64,
}

impl LivenessToken {
    pub(crate) fn new(generation: u64, cycle: u64) -> Self {
        Self { generation, cycle }
    }

    /// Liveness generation captured by the token
    pub fn generation(self) -> u64 {
        self.generation
    }

    /// Open cycle the token was taken in
    pub fn cycle(self) -> u64 {
        self.cycle
    }
}

impl SessionState {
    /// Closed → open edge. Returns `false` when the session was already open,
    /// in which case nothing is touched.
    pub(crate) fn open(&mut self, profile: CommittedProfile, limits: &DraftLimits) -> bool {
        if self.lifecycle != SessionLifecycle::Idle {
            return false;
        }
        self.lifecycle = SessionLifecycle::Initializing;
        self.cycle += 1;
        self.committed = profile;
        self.reinitialize(limits);
        self.lifecycle = SessionLifecycle::Active;
        true
    }

    /// Seed per-session state from the committed profile.
    ///
    /// The media-options flag is left alone: the host may have shown the
    /// options affordance while the re-seed was pending.
    pub(crate) fn reinitialize(&mut self, limits: &DraftLimits) {
        self.draft = ProfileDraft::seeded(&self.committed, limits);
        self.selection = MediaSelection::None;
        self.portfolio.reset();
        self.operation = ActiveOperation::None;
        self.view.reset();
    }

    /// Open → closed edge. Clears the "initialized" marker and nothing else;
    /// the next open re-seeds. Returns `false` when already closed.
    pub(crate) fn close(&mut self) -> bool {
        if self.lifecycle != SessionLifecycle::Active {
            return false;
        }
        self.lifecycle = SessionLifecycle::Idle;
        true
    }

    /// End liveness for everything started so far. Stops any ticker and drops
    /// the upload bar; drafts and selection stay until the next open re-seeds
    /// them.
    pub(crate) fn teardown(&mut self) {
        self.lifecycle = SessionLifecycle::Closing;
        self.generation += 1;
        if let Some(mut upload) = self.upload.take() {
            upload.stop_ticker();
        }
        self.operation = ActiveOperation::None;
        self.lifecycle = SessionLifecycle::Idle;
    }
}
