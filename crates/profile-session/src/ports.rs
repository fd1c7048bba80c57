//! # Session Ports
//!
//! Traits for everything the session needs from the outside world. The
//! session stays free of transport, storage and platform code; the host wires
//! concrete implementations in through [`SessionPorts`].
//!
//! ```text
//! profile-session (pure)         host
//! ┌──────────────────────┐      ┌────────────────────┐
//! │ ProfileEditSession   │      │ platform picker    │
//! │   ┌──────────────┐   │      │ portfolio client   │
//! │   │ SessionPorts │◄──┼──────│ avatar uploader    │
//! │   └──────────────┘   │      │ profile store      │
//! └──────────────────────┘      └────────────────────┘
//! ```
//!
//! Implementations own retries and timeouts. The session never cancels a call
//! it has issued; when the panel goes away first, the result is ignored.

use crate::portfolio::PortfolioQuery;
use async_trait::async_trait;
use std::sync::Arc;

/// Failure reported by a port
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    /// The collaborator refused or failed the call
    #[error("{0}")]
    Failed(String),
    /// Non-2xx response
    #[error("Request failed with status {0}")]
    Status(u16),
    /// The request never completed
    #[error("{0}")]
    Transport(String),
}

impl PortError {
    /// Message suitable for showing to the user, or `None` when the
    /// collaborator gave nothing useful.
    pub fn user_message(&self) -> Option<String> {
        let message = self.to_string();
        if message.trim().is_empty() {
            None
        } else {
            Some(message)
        }
    }
}

/// Options passed to the device picker
#[derive(Debug, Clone, PartialEq)]
pub struct PickerOptions {
    /// Restrict to still images
    pub images_only: bool,
    /// Let the user crop before returning
    pub allows_editing: bool,
    /// Crop aspect ratio (width, height)
    pub aspect: (u32, u32),
    /// Compression quality, 0.0-1.0
    pub quality: f32,
}

impl PickerOptions {
    /// Square avatar crop at 80% quality
    pub fn avatar() -> Self {
        Self {
            images_only: true,
            allows_editing: true,
            aspect: (1, 1),
            quality: 0.8,
        }
    }
}

impl Default for PickerOptions {
    fn default() -> Self {
        Self::avatar()
    }
}

/// Result of a picker invocation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PickResult {
    /// The user backed out
    pub canceled: bool,
    /// Local URI of the picked image
    pub uri: Option<String>,
}

impl PickResult {
    /// User picked `uri`
    pub fn picked(uri: impl Into<String>) -> Self {
        Self {
            canceled: false,
            uri: Some(uri.into()),
        }
    }

    /// User dismissed the picker
    pub fn canceled() -> Self {
        Self {
            canceled: true,
            uri: None,
        }
    }

    /// The picked URI, if the pick was not canceled and produced one
    pub fn into_uri(self) -> Option<String> {
        if self.canceled {
            return None;
        }
        self.uri.filter(|uri| !uri.is_empty())
    }
}

/// Device media library
#[async_trait]
pub trait MediaPicker: Send + Sync {
    /// Let the user pick an image
    async fn pick_image(&self, options: PickerOptions) -> Result<PickResult, PortError>;
}

/// Remote portfolio listing
#[async_trait]
pub trait PortfolioSource: Send + Sync {
    /// Fetch the raw portfolio body for the query's owner.
    ///
    /// The body is returned undecoded; the session tolerates non-array bodies
    /// and malformed records.
    async fn fetch_portfolio(&self, query: &PortfolioQuery) -> Result<serde_json::Value, PortError>;
}

/// Avatar upload service
#[async_trait]
pub trait AvatarUploader: Send + Sync {
    /// Upload `local_image` for `user_id`, returning the remote image URL
    async fn upload(&self, user_id: &str, local_image: &str) -> Result<String, PortError>;
}

/// Profile mutation dispatch into the host's profile store
#[async_trait]
pub trait ProfileMutations: Send + Sync {
    /// Record a new avatar URL (local store update, cannot fail)
    fn set_image(&self, user_id: &str, image_url: &str);

    /// Commit a new username
    async fn set_username(&self, user_id: &str, username: &str) -> Result<(), PortError>;

    /// Commit a new description
    async fn set_description(&self, user_id: &str, description: &str) -> Result<(), PortError>;
}

/// Bundle of ports handed to the session
#[derive(Clone)]
pub struct SessionPorts {
    /// Device picker
    pub picker: Arc<dyn MediaPicker>,
    /// Portfolio listing
    pub portfolio: Arc<dyn PortfolioSource>,
    /// Avatar upload
    pub uploader: Arc<dyn AvatarUploader>,
    /// Field commits
    pub mutations: Arc<dyn ProfileMutations>,
}

impl std::fmt::Debug for SessionPorts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionPorts").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_result_uri() {
        assert_eq!(
            PickResult::picked("file://a.png").into_uri(),
            Some("file://a.png".to_string())
        );
        assert_eq!(PickResult::canceled().into_uri(), None);
        // Not canceled but nothing returned
        assert_eq!(PickResult::default().into_uri(), None);
    }

    #[test]
    fn test_user_message() {
        assert_eq!(PortError::Failed(String::new()).user_message(), None);
        assert_eq!(
            PortError::Status(502).user_message().as_deref(),
            Some("Request failed with status 502")
        );
    }
}
