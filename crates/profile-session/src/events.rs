//! # Session Events
//!
//! Typed stream the host subscribes to instead of passing callbacks into the
//! session. Events are fire-and-forget: a session with no subscribers keeps
//! working and simply drops them.

use crate::model::ProfileField;
use crate::views::ViewState;
use tokio::sync::broadcast;

/// Severity of a user-visible message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToastLevel {
    /// Neutral information
    Info,
    /// Operation finished as requested
    Success,
    /// Recoverable problem
    Warning,
    /// Operation failed
    Error,
}

/// Message the host should show to the user (alert, toast, banner...)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    /// Severity
    pub level: ToastLevel,
    /// Short heading
    pub title: String,
    /// Body text
    pub message: String,
}

impl Notice {
    /// Create a notice
    pub fn new(level: ToastLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
        }
    }

    /// Informational notice
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ToastLevel::Info, title, message)
    }

    /// Success notice
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ToastLevel::Success, title, message)
    }

    /// Error notice
    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ToastLevel::Error, title, message)
    }
}

/// Everything the session tells its host
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// A profile field was committed through the mutation port
    FieldUpdated(ProfileField),
    /// Show a message to the user
    Notice(Notice),
    /// The session asks the host to close the panel
    CloseRequested,
    /// The active view changed
    ViewChanged {
        /// View before the transition
        from: ViewState,
        /// View after the transition
        to: ViewState,
    },
    /// Synthetic upload progress moved
    UploadProgress {
        /// Percentage, 0-100
        percent: u8,
    },
}

/// Broadcast sender shared by the session and its background tasks
#[derive(Clone, Debug)]
pub(crate) struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    pub(crate) fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.tx.send(event);
    }

    pub(crate) fn notice(&self, notice: Notice) {
        tracing::debug!(level = ?notice.level, title = %notice.title, "notice");
        self.emit(SessionEvent::Notice(notice));
    }
}
