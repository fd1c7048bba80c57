//! Session configuration.
//!
//! Every section is optional in TOML; missing keys fall back to the values the
//! panel ships with.
//!
//! ```toml
//! event_capacity = 64
//!
//! [upload]
//! tick_interval_ms = 500
//! min_step = 10
//! max_step = 30
//! progress_cap = 90
//! hide_delay_ms = 500
//!
//! [draft]
//! display_name_max = 50
//! bio_max = 160
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration loading and validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config {path}: {reason}")]
    Read {
        /// Path that was requested
        path: String,
        /// Underlying I/O failure
        reason: String,
    },
    /// The TOML did not parse into a [`SessionConfig`]
    #[error("Invalid config: {0}")]
    Parse(String),
    /// A value parsed but is out of range
    #[error("Invalid value for {field}: {reason}")]
    Invalid {
        /// Dotted key of the offending value
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Synthetic upload progress settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    /// Ticker cadence
    pub tick_interval_ms: u64,
    /// Smallest step added per tick
    pub min_step: u8,
    /// Largest step added per tick
    pub max_step: u8,
    /// Progress never passes this value before the upload settles
    pub progress_cap: u8,
    /// How long the 100% bar stays up after success
    pub hide_delay_ms: u64,
    /// Fixed RNG seed; entropy when unset
    pub seed: Option<u64>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 500,
            min_step: 10,
            max_step: 30,
            progress_cap: 90,
            hide_delay_ms: 500,
            seed: None,
        }
    }
}

impl UploadConfig {
    /// Ticker cadence as a [`Duration`]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Hide delay as a [`Duration`]
    pub fn hide_delay(&self) -> Duration {
        Duration::from_millis(self.hide_delay_ms)
    }
}

/// Maximum lengths of the editable fields, in characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DraftLimits {
    /// Display name limit
    pub display_name_max: usize,
    /// Bio limit
    pub bio_max: usize,
}

impl Default for DraftLimits {
    fn default() -> Self {
        Self {
            display_name_max: 50,
            bio_max: 160,
        }
    }
}

/// Portfolio query flags and mapping defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PortfolioConfig {
    /// Ask the source for unverified collections too
    pub include_unverified: bool,
    /// Ask the source for compressed items too
    pub include_compressed: bool,
    /// Ask the source to attach favourite counts
    pub include_favourite_count: bool,
    /// Display name for records that carry none
    pub fallback_name: String,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            include_unverified: true,
            include_compressed: true,
            include_favourite_count: true,
            fallback_name: "Unnamed NFT".to_string(),
        }
    }
}

/// Top-level session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Buffer size of the event broadcast channel
    pub event_capacity: usize,
    /// Upload progress settings
    pub upload: UploadConfig,
    /// Draft field limits
    pub draft: DraftLimits,
    /// Portfolio settings
    pub portfolio: PortfolioConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            event_capacity: 64,
            upload: UploadConfig::default(),
            draft: DraftLimits::default(),
            portfolio: PortfolioConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&raw)
    }

    /// Check value ranges the type system cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let upload = &self.upload;
        if upload.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "upload.tick_interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if upload.min_step > upload.max_step {
            return Err(ConfigError::Invalid {
                field: "upload.min_step",
                reason: format!(
                    "{} exceeds upload.max_step ({})",
                    upload.min_step, upload.max_step
                ),
            });
        }
        if upload.progress_cap >= 100 {
            return Err(ConfigError::Invalid {
                field: "upload.progress_cap",
                reason: "must stay below 100 until the upload settles".to_string(),
            });
        }
        if self.draft.display_name_max == 0 || self.draft.bio_max == 0 {
            return Err(ConfigError::Invalid {
                field: "draft",
                reason: "field limits must be greater than zero".to_string(),
            });
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "event_capacity",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
