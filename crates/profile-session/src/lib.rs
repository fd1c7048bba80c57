#![deny(clippy::await_holding_lock)]
#![deny(clippy::dbg_macro)]
//! # Profile Session
//!
//! Headless session controller for the profile edit panel. The panel lets a
//! user change their display name and bio, and replace their avatar either
//! from the device library or from their remote NFT portfolio.
//!
//! The crate owns the parts of that flow with real behaviour:
//! - the three-view navigation machine ([`views`])
//! - session lifecycle and liveness of async continuations ([`session`])
//! - media acquisition, upload and field commits ([`workflows`])
//! - the synthetic upload progress ticker ([`progress`])
//!
//! Everything that touches the outside world goes through the traits in
//! [`ports`]; the host renders from [`SessionSnapshot`] and listens to
//! [`SessionEvent`]s.
//!
//! ```rust,ignore
//! let session = ProfileEditSession::new(SessionConfig::default(), ports)?;
//! let mut events = session.subscribe();
//!
//! session.set_visible(true, committed_profile);
//! session.acquire_from_library().await;
//! ```

pub mod config;
pub mod errors;
pub mod events;
pub mod model;
pub mod portfolio;
pub mod ports;
pub mod progress;
pub mod session;
pub mod views;
pub mod workflows;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{ConfigError, DraftLimits, PortfolioConfig, SessionConfig, UploadConfig};
pub use errors::{ErrorCategory, SessionError};
pub use events::{Notice, SessionEvent, ToastLevel};
pub use model::{CommittedProfile, MediaSelection, MediaSource, PortfolioItem, ProfileDraft, ProfileField};
pub use portfolio::{map_portfolio, PortfolioQuery, RawPortfolioRecord};
pub use ports::{
    AvatarUploader, MediaPicker, PickResult, PickerOptions, PortError, PortfolioSource,
    ProfileMutations, SessionPorts,
};
pub use progress::{ProgressTicker, TickerHandle};
pub use session::{
    ActiveOperation, LivenessToken, OperationGuards, Outcome, ProfileEditSession, Rejection,
    SessionLifecycle, SessionSnapshot, UploadSnapshot,
};
pub use views::{ViewEffect, ViewEvent, ViewState, ViewStateMachine};
