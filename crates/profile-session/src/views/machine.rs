//! # View State Machine
//!
//! The panel shows exactly one of three views. Every change goes through
//! [`ViewStateMachine::fire`], which looks the (view, event) pair up in
//! [`TRANSITIONS`], checks the row's guard against the current
//! [`OperationGuards`], and hands back the side effect the session must apply.
//!
//! ```text
//!               PortfolioReady            SelectItem
//! ProfileEdit ───────────────▶ NftList ───────────────▶ NftConfirm
//!      ▲                        │  ▲          Back           │
//!      │        CancelFlow      │  └─────────────────────────┘
//!      └────────────────────────┴────────────────────────────┘
//! ```
//!
//! `UploadSettled` and `Close` lead back to `ProfileEdit` from anywhere.

use crate::session::{OperationGuards, Rejection};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Active panel view
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewState {
    /// Avatar, display name and bio
    #[default]
    ProfileEdit,
    /// Portfolio list
    NftList,
    /// Confirmation of the chosen portfolio item
    NftConfirm,
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ProfileEdit => "profile_edit",
            Self::NftList => "nft_list",
            Self::NftConfirm => "nft_confirm",
        };
        f.write_str(name)
    }
}

/// Inputs to the machine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViewEvent {
    /// Portfolio preparation settled
    PortfolioReady,
    /// A valid portfolio item was chosen
    SelectItem,
    /// Back from confirmation to the list
    Back,
    /// Abandon the portfolio flow
    CancelFlow,
    /// An upload finished, successfully or not
    UploadSettled,
    /// User asked to close the panel
    Close,
}

/// Precondition of a transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Guard {
    /// Fired by an operation that itself holds the guards
    Always,
    /// No operation may be in flight
    Idle,
}

impl Guard {
    /// Check the guard against the current operation state
    pub fn check(self, guards: OperationGuards) -> Result<(), Rejection> {
        match self {
            Self::Always => Ok(()),
            Self::Idle if guards.is_processing || guards.is_uploading => Err(Rejection::Busy),
            Self::Idle => Ok(()),
        }
    }
}

/// Side effect the session applies after a transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewEffect {
    /// Nothing beyond the view change
    None,
    /// Drop the pending selection
    ClearSelection,
    /// Drop the selection and the portfolio cache with its loading/error state
    ClearSelectionAndCache,
    /// Ask the host to close the panel
    RequestClose,
}

/// One row of the transition table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    /// Source view; `None` matches any view
    pub from: Option<ViewState>,
    /// Triggering event
    pub event: ViewEvent,
    /// Target view
    pub to: ViewState,
    /// Precondition
    pub guard: Guard,
    /// Side effect
    pub effect: ViewEffect,
}

const fn row(
    from: Option<ViewState>,
    event: ViewEvent,
    to: ViewState,
    guard: Guard,
    effect: ViewEffect,
) -> Transition {
    Transition {
        from,
        event,
        to,
        guard,
        effect,
    }
}

/// The transition table. First matching row wins.
pub const TRANSITIONS: &[Transition] = &[
    row(
        Some(ViewState::ProfileEdit),
        ViewEvent::PortfolioReady,
        ViewState::NftList,
        Guard::Always,
        ViewEffect::None,
    ),
    row(
        Some(ViewState::NftList),
        ViewEvent::SelectItem,
        ViewState::NftConfirm,
        Guard::Idle,
        ViewEffect::None,
    ),
    row(
        Some(ViewState::NftConfirm),
        ViewEvent::Back,
        ViewState::NftList,
        Guard::Idle,
        ViewEffect::ClearSelection,
    ),
    row(
        Some(ViewState::NftList),
        ViewEvent::CancelFlow,
        ViewState::ProfileEdit,
        Guard::Idle,
        ViewEffect::ClearSelectionAndCache,
    ),
    row(
        Some(ViewState::NftConfirm),
        ViewEvent::CancelFlow,
        ViewState::ProfileEdit,
        Guard::Idle,
        ViewEffect::ClearSelectionAndCache,
    ),
    row(
        None,
        ViewEvent::UploadSettled,
        ViewState::ProfileEdit,
        Guard::Always,
        ViewEffect::None,
    ),
    row(
        None,
        ViewEvent::Close,
        ViewState::ProfileEdit,
        Guard::Idle,
        ViewEffect::RequestClose,
    ),
];

/// Current view plus the table lookup
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ViewStateMachine {
    current: ViewState,
}

impl ViewStateMachine {
    /// Machine in the initial view
    pub fn new() -> Self {
        Self::default()
    }

    /// Current view
    pub fn current(&self) -> ViewState {
        self.current
    }

    /// Table row for `event` in `from`, if any
    pub fn lookup(from: ViewState, event: ViewEvent) -> Option<&'static Transition> {
        TRANSITIONS
            .iter()
            .find(|t| t.event == event && t.from.map_or(true, |f| f == from))
    }

    /// Check whether `event` would be accepted right now, without firing it
    pub fn can_fire(&self, event: ViewEvent, guards: OperationGuards) -> Result<(), Rejection> {
        let transition = Self::lookup(self.current, event).ok_or(Rejection::InvalidTransition {
            from: self.current,
            event,
        })?;
        transition.guard.check(guards)
    }

    /// Fire `event`. On success the view has changed and the row is returned so
    /// the caller can apply its effect; on rejection nothing changed.
    pub fn fire(&mut self, event: ViewEvent, guards: OperationGuards) -> Result<Transition, Rejection> {
        let transition = *Self::lookup(self.current, event).ok_or(Rejection::InvalidTransition {
            from: self.current,
            event,
        })?;
        transition.guard.check(guards)?;

        tracing::debug!(from = %self.current, to = %transition.to, ?event, "view transition");
        self.current = transition.to;
        Ok(transition)
    }

    /// Back to the initial view, outside the table: re-initialization does
    /// not announce a view change
    pub fn reset(&mut self) {
        self.current = ViewState::ProfileEdit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const IDLE: OperationGuards = OperationGuards {
        is_processing: false,
        is_uploading: false,
        is_preparing_portfolio: false,
    };

    const PROCESSING: OperationGuards = OperationGuards {
        is_processing: true,
        is_uploading: false,
        is_preparing_portfolio: false,
    };

    const UPLOADING: OperationGuards = OperationGuards {
        is_processing: true,
        is_uploading: true,
        is_preparing_portfolio: false,
    };

    fn machine_at(view: ViewState) -> ViewStateMachine {
        ViewStateMachine { current: view }
    }

    #[test]
    fn test_initial_view() {
        assert_eq!(ViewStateMachine::new().current(), ViewState::ProfileEdit);
    }

    #[test]
    fn test_portfolio_round_trip() {
        let mut machine = ViewStateMachine::new();
        machine.fire(ViewEvent::PortfolioReady, PROCESSING).unwrap();
        assert_eq!(machine.current(), ViewState::NftList);

        machine.fire(ViewEvent::SelectItem, IDLE).unwrap();
        assert_eq!(machine.current(), ViewState::NftConfirm);

        let back = machine.fire(ViewEvent::Back, IDLE).unwrap();
        assert_eq!(back.effect, ViewEffect::ClearSelection);
        assert_eq!(machine.current(), ViewState::NftList);
    }

    #[test]
    fn test_cancel_flow_from_both_portfolio_views() {
        for view in [ViewState::NftList, ViewState::NftConfirm] {
            let mut machine = machine_at(view);
            let t = machine.fire(ViewEvent::CancelFlow, IDLE).unwrap();
            assert_eq!(t.effect, ViewEffect::ClearSelectionAndCache);
            assert_eq!(machine.current(), ViewState::ProfileEdit);
        }
    }

    #[test]
    fn test_cancel_flow_from_edit_is_invalid() {
        let mut machine = ViewStateMachine::new();
        assert_eq!(
            machine.fire(ViewEvent::CancelFlow, IDLE),
            Err(Rejection::InvalidTransition {
                from: ViewState::ProfileEdit,
                event: ViewEvent::CancelFlow,
            })
        );
    }

    #[test]
    fn test_select_requires_list() {
        let mut machine = ViewStateMachine::new();
        assert!(matches!(
            machine.fire(ViewEvent::SelectItem, IDLE),
            Err(Rejection::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_close_rejected_while_busy() {
        let mut machine = machine_at(ViewState::NftConfirm);
        assert_eq!(machine.fire(ViewEvent::Close, UPLOADING), Err(Rejection::Busy));
        assert_eq!(machine.current(), ViewState::NftConfirm);

        let t = machine.fire(ViewEvent::Close, IDLE).unwrap();
        assert_eq!(t.effect, ViewEffect::RequestClose);
        assert_eq!(machine.current(), ViewState::ProfileEdit);
    }

    #[test]
    fn test_upload_settled_is_unguarded() {
        let mut machine = machine_at(ViewState::NftConfirm);
        machine.fire(ViewEvent::UploadSettled, UPLOADING).unwrap();
        assert_eq!(machine.current(), ViewState::ProfileEdit);
    }

    #[test]
    fn test_can_fire_does_not_move() {
        let machine = machine_at(ViewState::NftList);
        assert!(machine.can_fire(ViewEvent::SelectItem, IDLE).is_ok());
        assert_eq!(machine.can_fire(ViewEvent::SelectItem, PROCESSING), Err(Rejection::Busy));
        assert_eq!(machine.current(), ViewState::NftList);
    }

    fn view_strategy() -> impl Strategy<Value = ViewState> {
        prop_oneof![
            Just(ViewState::ProfileEdit),
            Just(ViewState::NftList),
            Just(ViewState::NftConfirm),
        ]
    }

    fn user_event_strategy() -> impl Strategy<Value = ViewEvent> {
        prop_oneof![
            Just(ViewEvent::SelectItem),
            Just(ViewEvent::Back),
            Just(ViewEvent::CancelFlow),
            Just(ViewEvent::Close),
        ]
    }

    proptest! {
        /// Property: user-initiated events never move the machine while busy
        #[test]
        fn prop_busy_rejects_user_events(
            start in view_strategy(),
            events in proptest::collection::vec(user_event_strategy(), 0..32),
            uploading in any::<bool>(),
        ) {
            let guards = if uploading { UPLOADING } else { PROCESSING };
            let mut machine = machine_at(start);
            for event in events {
                prop_assert!(machine.fire(event, guards).is_err());
                prop_assert_eq!(machine.current(), start);
            }
        }

        /// Property: cancel-flow from a portfolio view always lands on the edit view
        #[test]
        fn prop_cancel_flow_lands_on_edit(
            start in prop_oneof![Just(ViewState::NftList), Just(ViewState::NftConfirm)],
        ) {
            let mut machine = machine_at(start);
            prop_assert!(machine.fire(ViewEvent::CancelFlow, IDLE).is_ok());
            prop_assert_eq!(machine.current(), ViewState::ProfileEdit);
        }
    }
}
