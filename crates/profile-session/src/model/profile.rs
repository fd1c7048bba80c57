//! Committed profile snapshot and the editable draft.

use crate::config::DraftLimits;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Profile fields the session can commit
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileField {
    /// Avatar
    Image,
    /// Display name
    Username,
    /// Bio
    Description,
}

impl ProfileField {
    /// Wire name of the field
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Username => "username",
            Self::Description => "description",
        }
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host-supplied profile as currently stored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommittedProfile {
    /// User identity (wallet address); empty when unknown
    pub user_id: String,
    /// Current avatar URL
    pub profile_pic_url: String,
    /// Current username
    pub username: String,
    /// Current bio
    pub description: String,
}

impl CommittedProfile {
    /// Whether the profile carries a usable identity
    #[must_use]
    pub fn has_identity(&self) -> bool {
        !self.user_id.trim().is_empty()
    }

    /// Shortened identity for display, e.g. `@AbCdEf...wxyz`
    #[must_use]
    pub fn short_identity(&self) -> String {
        let chars: Vec<char> = self.user_id.chars().collect();
        if chars.len() <= 10 {
            return format!("@{}", self.user_id);
        }
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("@{head}...{tail}")
    }
}

/// Editable copy of the display name and bio.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileDraft {
    display_name: String,
    bio: String,
}

impl ProfileDraft {
    /// Seed a draft from the committed profile
    pub fn seeded(profile: &CommittedProfile, limits: &DraftLimits) -> Self {
        let mut draft = Self::default();
        draft.set_display_name(&profile.username, limits);
        draft.set_bio(&profile.description, limits);
        draft
    }

    /// Current display name input
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Current bio input
    pub fn bio(&self) -> &str {
        &self.bio
    }

    /// Replace the display name, truncated to the limit
    pub fn set_display_name(&mut self, value: &str, limits: &DraftLimits) {
        self.display_name = truncate_chars(value, limits.display_name_max);
    }

    /// Replace the bio, truncated to the limit
    pub fn set_bio(&mut self, value: &str, limits: &DraftLimits) {
        self.bio = truncate_chars(value, limits.bio_max);
    }

    /// Trimmed display name if it is a non-empty change from `committed`
    pub fn username_change(&self, committed: &CommittedProfile) -> Option<String> {
        let trimmed = self.display_name.trim();
        (!trimmed.is_empty() && trimmed != committed.username).then(|| trimmed.to_string())
    }

    /// Trimmed bio if it differs from `committed`; an empty bio is a valid change
    pub fn description_change(&self, committed: &CommittedProfile) -> Option<String> {
        let trimmed = self.bio.trim();
        (trimmed != committed.description).then(|| trimmed.to_string())
    }

    /// Whether either trimmed field differs from `committed`
    pub fn differs_from(&self, committed: &CommittedProfile) -> bool {
        self.display_name.trim() != committed.username || self.bio.trim() != committed.description
    }
}

fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}
