//! # Profile Edit Session
//!
//! [`ProfileEditSession`] is the handle the host holds for one panel. It is a
//! cheap `Clone` over shared state, so async workflows can run on the host's
//! executor while the UI keeps calling into the same session.
//!
//! ## Locking
//!
//! State sits behind a single `parking_lot::Mutex`. Every method takes the
//! lock for a short synchronous section and releases it before awaiting a
//! port. Continuations re-take the lock through [`SessionInner::with_live`],
//! which refuses to run the mutation once the session has been torn down.
//! Closing the panel does not detach them.

mod guards;
mod lifecycle;
mod state;

pub use guards::{ActiveOperation, OperationGuards, Outcome, Rejection};
pub use lifecycle::{LivenessToken, SessionLifecycle};
pub use state::{SessionSnapshot, UploadSnapshot};

pub(crate) use state::{SessionState, UploadSession};

use crate::config::SessionConfig;
use crate::errors::SessionError;
use crate::events::{EventBus, SessionEvent};
use crate::model::CommittedProfile;
use crate::ports::SessionPorts;
use crate::views::{ViewEvent, ViewState};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Shared state behind every clone of a session handle
pub(crate) struct SessionInner {
    pub(crate) config: SessionConfig,
    pub(crate) ports: SessionPorts,
    pub(crate) events: EventBus,
    pub(crate) state: Mutex<SessionState>,
}

impl SessionInner {
    /// Run `f` under the lock only if `token` is still live.
    pub(crate) fn with_live<R>(
        &self,
        token: LivenessToken,
        f: impl FnOnce(&mut SessionState, &EventBus) -> R,
    ) -> Option<R> {
        let mut state = self.state.lock();
        if !state.is_live(token) {
            tracing::debug!(generation = token.generation(), "continuation detached");
            return None;
        }
        Some(f(&mut state, &self.events))
    }

    /// Check preconditions and claim `operation` in one critical section.
    pub(crate) fn begin(
        &self,
        operation: ActiveOperation,
        check: impl FnOnce(&SessionState) -> Result<(), Rejection>,
    ) -> Result<LivenessToken, Rejection> {
        let mut state = self.state.lock();
        state.ensure_active()?;
        if let Err(rejection) = check(&state) {
            tracing::debug!(%operation, current = %state.operation, %rejection, "operation rejected");
            return Err(rejection);
        }
        state.operation = operation;
        tracing::debug!(%operation, cycle = state.cycle, "operation started");
        Ok(state.token())
    }

    /// Release the operation claimed by [`Self::begin`]. A reopen has
    /// already reset the claim, so only the claiming cycle releases it.
    pub(crate) fn finish(&self, token: LivenessToken) {
        self.with_live(token, |state, _| {
            if state.in_cycle(token) {
                state.operation = ActiveOperation::None;
            }
        });
    }
}

/// Headless controller for one profile edit panel
#[derive(Clone)]
pub struct ProfileEditSession {
    pub(crate) inner: Arc<SessionInner>,
}

impl std::fmt::Debug for ProfileEditSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("ProfileEditSession")
            .field("lifecycle", &state.lifecycle)
            .field("generation", &state.generation)
            .field("cycle", &state.cycle)
            .field("view", &state.view.current())
            .field("operation", &state.operation)
            .finish_non_exhaustive()
    }
}

impl ProfileEditSession {
    /// Create a closed session. The host opens it with [`Self::set_visible`].
    pub fn new(config: SessionConfig, ports: SessionPorts) -> Result<Self, SessionError> {
        config.validate()?;
        let events = EventBus::new(config.event_capacity);
        Ok(Self {
            inner: Arc::new(SessionInner {
                config,
                ports,
                events,
                state: Mutex::new(SessionState::default()),
            }),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Render state
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.lock().snapshot()
    }

    /// Current view
    pub fn view(&self) -> ViewState {
        self.inner.state.lock().view.current()
    }

    /// Whether the panel is open
    pub fn is_open(&self) -> bool {
        self.inner.state.lock().is_active()
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Drive visibility from the host. Opening re-seeds all per-session state
    /// from `profile`; repeated opens are ignored. Closing only clears the
    /// "initialized" marker: an upload or commit in flight still settles and
    /// reaches the profile store.
    pub fn set_visible(&self, visible: bool, profile: &CommittedProfile) {
        let mut state = self.inner.state.lock();
        if visible {
            if state.open(profile.clone(), &self.inner.config.draft) {
                tracing::info!(
                    cycle = state.cycle,
                    user = %profile.short_identity(),
                    "profile session opened"
                );
            }
        } else if state.close() {
            tracing::info!(cycle = state.cycle, operation = %state.operation, "profile session closed");
        }
    }

    /// Forced teardown, e.g. the host unmounting the panel. Ends liveness for
    /// in-flight work and stops any upload ticker.
    pub fn teardown(&self) {
        let mut state = self.inner.state.lock();
        state.teardown();
        tracing::info!(generation = state.generation, "profile session torn down");
    }

    /// Replace the committed profile the session compares against.
    ///
    /// Drafts are not re-seeded; that only happens on open.
    pub fn update_committed_profile(&self, profile: CommittedProfile) {
        self.inner.state.lock().committed = profile;
    }

    // ------------------------------------------------------------------------
    // Host navigation
    // ------------------------------------------------------------------------

    /// Ask the host to close the panel. Refused while busy.
    pub fn request_close(&self) -> Outcome {
        let mut state = self.inner.state.lock();
        if let Err(rejection) = state.ensure_active() {
            return rejection.into();
        }
        match state.fire_view(ViewEvent::Close, &self.inner.events) {
            Ok(_) => Outcome::done(),
            Err(rejection) => {
                tracing::debug!(%rejection, "close request ignored");
                rejection.into()
            }
        }
    }

    /// System back: unwinds the portfolio flow one step, or asks to close
    pub fn handle_back_request(&self) -> Outcome {
        let view = {
            let state = self.inner.state.lock();
            if let Err(rejection) = state.ensure_idle() {
                return rejection.into();
            }
            state.view.current()
        };
        match view {
            ViewState::NftList => self.cancel_flow(),
            ViewState::NftConfirm => self.cancel_selection(),
            ViewState::ProfileEdit => self.request_close(),
        }
    }

    /// Tap outside the panel: dismisses the media options first
    pub fn handle_overlay_press(&self) -> Outcome {
        {
            let mut state = self.inner.state.lock();
            if let Err(rejection) = state.ensure_idle() {
                return rejection.into();
            }
            if state.media_options_visible {
                state.media_options_visible = false;
                return Outcome::done();
            }
        }
        self.request_close()
    }

    /// Show the avatar source options
    pub fn show_media_options(&self) -> Outcome {
        let mut state = self.inner.state.lock();
        if let Err(rejection) = Self::ensure_editable(&state) {
            return rejection.into();
        }
        state.media_options_visible = true;
        Outcome::done()
    }

    /// Hide the avatar source options
    pub fn hide_media_options(&self) {
        self.inner.state.lock().media_options_visible = false;
    }

    // ------------------------------------------------------------------------
    // Draft
    // ------------------------------------------------------------------------

    /// Edit the display name draft
    pub fn set_display_name(&self, value: &str) -> Outcome {
        let mut state = self.inner.state.lock();
        if let Err(rejection) = Self::ensure_editable(&state) {
            return rejection.into();
        }
        state.draft.set_display_name(value, &self.inner.config.draft);
        Outcome::done()
    }

    /// Edit the bio draft
    pub fn set_bio(&self, value: &str) -> Outcome {
        let mut state = self.inner.state.lock();
        if let Err(rejection) = Self::ensure_editable(&state) {
            return rejection.into();
        }
        state.draft.set_bio(value, &self.inner.config.draft);
        Outcome::done()
    }

    /// Whether either draft field differs from the committed profile
    pub fn has_unsaved_changes(&self) -> bool {
        let state = self.inner.state.lock();
        state.draft.differs_from(&state.committed)
    }

    fn ensure_editable(state: &SessionState) -> Result<(), Rejection> {
        state.ensure_active()?;
        if state.guards().is_busy() || state.view.current() != ViewState::ProfileEdit {
            return Err(Rejection::NotEditable);
        }
        Ok(())
    }
}
