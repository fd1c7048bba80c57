//! Session-owned state and the render snapshot derived from it.

use super::guards::{ActiveOperation, OperationGuards, Rejection};
use super::lifecycle::{LivenessToken, SessionLifecycle};
use crate::events::{EventBus, SessionEvent};
use crate::model::{CommittedProfile, MediaSelection, PortfolioItem, ProfileDraft};
use crate::progress::TickerHandle;
use crate::views::{Transition, ViewEffect, ViewEvent, ViewState, ViewStateMachine};

/// Portfolio list for the current session
#[derive(Debug, Default)]
pub(crate) struct PortfolioCache {
    pub(crate) items: Vec<PortfolioItem>,
    pub(crate) loading: bool,
    pub(crate) error: Option<String>,
    /// Bumped by every fetch and every cancel; stale results compare unequal
    pub(crate) request_id: u64,
}

impl PortfolioCache {
    /// Empty the cache and invalidate any fetch in flight
    pub(crate) fn reset(&mut self) {
        self.items.clear();
        self.loading = false;
        self.error = None;
        self.request_id += 1;
    }
}

/// Upload in flight, or finished and waiting for its bar to hide
#[derive(Debug)]
pub(crate) struct UploadSession {
    pub(crate) id: u64,
    pub(crate) progress: u8,
    pub(crate) active: bool,
    pub(crate) ticker: Option<TickerHandle>,
}

impl UploadSession {
    pub(crate) fn new(id: u64) -> Self {
        Self {
            id,
            progress: 0,
            active: true,
            ticker: None,
        }
    }

    /// Stop the ticker if it is still running
    pub(crate) fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.stop();
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub(crate) lifecycle: SessionLifecycle,
    /// Bumped by teardown; tokens from an older generation are dead
    pub(crate) generation: u64,
    /// Bumped by every open
    pub(crate) cycle: u64,
    pub(crate) committed: CommittedProfile,
    pub(crate) draft: ProfileDraft,
    pub(crate) selection: MediaSelection,
    pub(crate) portfolio: PortfolioCache,
    pub(crate) operation: ActiveOperation,
    pub(crate) view: ViewStateMachine,
    pub(crate) media_options_visible: bool,
    pub(crate) upload: Option<UploadSession>,
    pub(crate) upload_seq: u64,
}

impl SessionState {
    pub(crate) fn guards(&self) -> OperationGuards {
        self.operation.guards()
    }

    pub(crate) fn is_active(&self) -> bool {
        self.lifecycle == SessionLifecycle::Active
    }

    /// Token for continuations started now
    pub(crate) fn token(&self) -> LivenessToken {
        LivenessToken::new(self.generation, self.cycle)
    }

    /// Whether work started under `token` may still mutate session data
    pub(crate) fn is_live(&self, token: LivenessToken) -> bool {
        self.lifecycle != SessionLifecycle::Closing && token.generation() == self.generation
    }

    /// Live and still in the open cycle it started in
    pub(crate) fn in_cycle(&self, token: LivenessToken) -> bool {
        self.is_live(token) && token.cycle() == self.cycle
    }

    /// Refuse unless the session is open
    pub(crate) fn ensure_active(&self) -> Result<(), Rejection> {
        if self.is_active() {
            Ok(())
        } else {
            Err(Rejection::NotLive)
        }
    }

    /// Refuse while any operation is in flight
    pub(crate) fn ensure_idle(&self) -> Result<(), Rejection> {
        self.ensure_active()?;
        if self.guards().is_busy() {
            return Err(Rejection::Busy);
        }
        Ok(())
    }

    /// Fire a view event, apply its effect to session data and publish the
    /// change. Data effects are applied before the view change is announced.
    pub(crate) fn fire_view(
        &mut self,
        event: ViewEvent,
        events: &EventBus,
    ) -> Result<Transition, Rejection> {
        let from = self.view.current();
        let transition = self.view.fire(event, self.guards())?;

        match transition.effect {
            ViewEffect::None => {}
            ViewEffect::ClearSelection => self.selection = MediaSelection::None,
            ViewEffect::ClearSelectionAndCache => {
                self.selection = MediaSelection::None;
                self.portfolio.reset();
            }
            ViewEffect::RequestClose => events.emit(SessionEvent::CloseRequested),
        }

        if from != transition.to {
            events.emit(SessionEvent::ViewChanged {
                from,
                to: transition.to,
            });
        }
        Ok(transition)
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            lifecycle: self.lifecycle,
            view: self.view.current(),
            committed: self.committed.clone(),
            draft: self.draft.clone(),
            selection: self.selection.clone(),
            portfolio: self.portfolio.items.clone(),
            portfolio_loading: self.portfolio.loading,
            portfolio_error: self.portfolio.error.clone(),
            guards: self.guards(),
            operation: self.operation,
            media_options_visible: self.media_options_visible,
            upload: self.upload.as_ref().map(|upload| UploadSnapshot {
                active: upload.active,
                progress: upload.progress,
            }),
        }
    }
}

/// Upload bar state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadSnapshot {
    /// The upload call has not settled yet
    pub active: bool,
    /// Synthetic progress, 0-100
    pub progress: u8,
}

/// Everything the host needs to render the panel
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Lifecycle phase
    pub lifecycle: SessionLifecycle,
    /// Active view
    pub view: ViewState,
    /// Profile as committed
    pub committed: CommittedProfile,
    /// Editable fields
    pub draft: ProfileDraft,
    /// Pending avatar selection
    pub selection: MediaSelection,
    /// Portfolio list
    pub portfolio: Vec<PortfolioItem>,
    /// Portfolio fetch in flight
    pub portfolio_loading: bool,
    /// Inline portfolio error with retry affordance
    pub portfolio_error: Option<String>,
    /// Exclusion flags
    pub guards: OperationGuards,
    /// Operation in flight
    pub operation: ActiveOperation,
    /// Avatar options affordance shown
    pub media_options_visible: bool,
    /// Upload bar, while shown
    pub upload: Option<UploadSnapshot>,
}

impl SessionSnapshot {
    /// Image the avatar should show: the pending selection, then the
    /// committed avatar
    pub fn avatar_reference(&self) -> Option<&str> {
        self.selection.local_image_reference().or_else(|| {
            Some(self.committed.profile_pic_url.as_str()).filter(|url| !url.is_empty())
        })
    }
}
