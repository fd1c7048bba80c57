//! Operation exclusion and operation outcomes.
//!
//! At most one operation runs at a time. Rather than three independent flags
//! that have to be kept consistent, the session stores a single
//! [`ActiveOperation`] and derives the flags the host renders from.

use crate::errors::SessionError;
use crate::model::ProfileField;
use crate::views::{ViewEvent, ViewState};
use std::fmt;

/// The operation currently in flight
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ActiveOperation {
    /// Nothing running
    #[default]
    None,
    /// Waiting on the device picker
    AcquiringLibrary,
    /// Fetching the portfolio before showing the list
    PreparingPortfolio,
    /// Upload in flight
    Uploading,
    /// Committing display name / bio
    MutatingProfile,
}

impl ActiveOperation {
    /// Exclusion flags derived from this operation
    #[must_use]
    pub fn guards(self) -> OperationGuards {
        OperationGuards {
            is_processing: self != Self::None,
            is_uploading: self == Self::Uploading,
            is_preparing_portfolio: self == Self::PreparingPortfolio,
        }
    }

    /// Whether nothing is running
    #[must_use]
    pub fn is_idle(self) -> bool {
        self == Self::None
    }
}

impl fmt::Display for ActiveOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::AcquiringLibrary => "acquiring_library",
            Self::PreparingPortfolio => "preparing_portfolio",
            Self::Uploading => "uploading",
            Self::MutatingProfile => "mutating_profile",
        };
        f.write_str(name)
    }
}

/// Exclusion flags as the host sees them
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OperationGuards {
    /// Any operation in flight
    pub is_processing: bool,
    /// Upload in flight
    pub is_uploading: bool,
    /// Portfolio preparation in flight
    pub is_preparing_portfolio: bool,
}

impl OperationGuards {
    /// Whether user-initiated actions are blocked
    #[must_use]
    pub fn is_busy(self) -> bool {
        self.is_processing || self.is_uploading
    }
}

/// Why an action was refused without changing state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// Another operation is in flight
    Busy,
    /// Portfolio preparation is in flight
    PreparingPortfolio,
    /// A portfolio fetch is already loading
    Loading,
    /// The event is not valid in the current view
    InvalidTransition {
        /// Current view
        from: ViewState,
        /// Refused event
        event: ViewEvent,
    },
    /// The session is not open
    NotLive,
    /// An upload is already running
    AlreadyUploading,
    /// No image to upload
    NoImage,
    /// No user identity to act for
    MissingIdentity,
    /// Fields cannot be edited in this view or while busy
    NotEditable,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "another operation is in progress"),
            Self::PreparingPortfolio => write!(f, "portfolio is being prepared"),
            Self::Loading => write!(f, "portfolio is already loading"),
            Self::InvalidTransition { from, event } => {
                write!(f, "{event:?} is not valid from {from}")
            }
            Self::NotLive => write!(f, "session is not open"),
            Self::AlreadyUploading => write!(f, "upload already in progress"),
            Self::NoImage => write!(f, "no image selected"),
            Self::MissingIdentity => write!(f, "no user identity"),
            Self::NotEditable => write!(f, "fields are not editable right now"),
        }
    }
}

/// Result of every session operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Refused before any state changed
    Rejected(Rejection),
    /// Finished; lists the fields committed to the host's profile
    Completed {
        /// Fields committed, in commit order
        updated: Vec<ProfileField>,
    },
    /// The user backed out of the picker, or the panel was reopened before
    /// the pick came back
    Canceled,
    /// Failed and was reported to the user. `updated` lists fields committed
    /// before the failure; they are not rolled back.
    Failed {
        /// What went wrong
        error: SessionError,
        /// Fields committed before the failure
        updated: Vec<ProfileField>,
    },
    /// The session was torn down while the operation was in flight; its
    /// result was discarded.
    Detached,
}

impl Outcome {
    /// Completed without committing anything
    pub fn done() -> Self {
        Self::Completed {
            updated: Vec::new(),
        }
    }

    /// Failed before committing anything
    pub fn failed(error: SessionError) -> Self {
        Self::Failed {
            error,
            updated: Vec::new(),
        }
    }

    /// Fields committed by the operation, whether or not it finished
    pub fn updated_fields(&self) -> &[ProfileField] {
        match self {
            Self::Completed { updated } | Self::Failed { updated, .. } => updated,
            _ => &[],
        }
    }

    /// Whether the action was refused
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

impl From<Rejection> for Outcome {
    fn from(rejection: Rejection) -> Self {
        Self::Rejected(rejection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_follow_operation() {
        assert_eq!(ActiveOperation::None.guards(), OperationGuards::default());

        let uploading = ActiveOperation::Uploading.guards();
        assert!(uploading.is_processing && uploading.is_uploading);
        assert!(!uploading.is_preparing_portfolio);

        let preparing = ActiveOperation::PreparingPortfolio.guards();
        assert!(preparing.is_processing && preparing.is_preparing_portfolio);
        assert!(!preparing.is_uploading);

        assert!(ActiveOperation::MutatingProfile.guards().is_busy());
        assert!(ActiveOperation::AcquiringLibrary.guards().is_busy());
    }

    #[test]
    fn test_updated_fields() {
        let outcome = Outcome::Failed {
            error: SessionError::Upload("x".into()),
            updated: vec![ProfileField::Username],
        };
        assert_eq!(outcome.updated_fields(), &[ProfileField::Username]);
        assert!(Outcome::Detached.updated_fields().is_empty());
        assert!(Outcome::from(Rejection::Busy).is_rejected());
    }
}
