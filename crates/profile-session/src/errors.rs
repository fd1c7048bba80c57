//! Categorized session errors
//!
//! Every failure in the panel is recoverable; the category decides how loudly
//! the host surfaces it.

use crate::config::ConfigError;
use crate::events::ToastLevel;
use crate::model::ProfileField;
use crate::ports::PortError;
use std::fmt;

/// High-level error categories
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// User picked something unusable (correctable by user)
    Input,
    /// Host handed the session incomplete data
    Config,
    /// Remote collaborator unreachable or failing (often transient)
    Network,
    /// Collaborator rejected the operation
    Operation,
}

impl ErrorCategory {
    /// Check if the user can resolve this themselves
    #[must_use]
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, Self::Input)
    }

    /// Check if retrying may help
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network)
    }

    /// Toast severity for this category
    #[must_use]
    pub fn toast_severity(&self) -> ToastLevel {
        match self {
            Self::Input => ToastLevel::Info,
            Self::Config => ToastLevel::Warning,
            Self::Network => ToastLevel::Warning,
            Self::Operation => ToastLevel::Error,
        }
    }

    /// Short label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Input => "Input",
            Self::Config => "Config",
            Self::Network => "Network",
            Self::Operation => "Operation",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Session error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The device picker failed
    #[error("{0}")]
    Picker(String),
    /// The portfolio could not be loaded
    #[error("Failed to load portfolio: {0}")]
    PortfolioFetch(String),
    /// A portfolio item without an image was selected
    #[error("Item {id} does not have a valid image")]
    InvalidItem {
        /// Item id
        id: String,
    },
    /// The upload call failed
    #[error("{0}")]
    Upload(String),
    /// A field commit failed
    #[error("{message}")]
    Mutation {
        /// Field whose commit failed
        field: ProfileField,
        /// Collaborator message
        message: String,
    },
    /// No user identity to act on behalf of
    #[error("No valid user to upload to")]
    MissingIdentity,
    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SessionError {
    /// Wrap a picker failure
    pub fn picker(err: &PortError) -> Self {
        Self::Picker(err.to_string())
    }

    /// Category of this error
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidItem { .. } => ErrorCategory::Input,
            Self::MissingIdentity | Self::Config(_) => ErrorCategory::Config,
            Self::PortfolioFetch(_) => ErrorCategory::Network,
            Self::Picker(_) | Self::Upload(_) | Self::Mutation { .. } => ErrorCategory::Operation,
        }
    }

    /// Toast severity for this error
    #[must_use]
    pub fn toast_level(&self) -> ToastLevel {
        self.category().toast_severity()
    }
}
