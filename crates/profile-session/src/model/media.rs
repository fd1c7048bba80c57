//! Media selection and portfolio items.

use serde::{Deserialize, Serialize};

/// A collectible from the user's remote portfolio
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioItem {
    /// Mint address; unique within a cache
    pub id: String,
    /// Display name
    pub display_name: String,
    /// Image URL; may be empty, in which case the item cannot be selected
    pub image_reference: String,
    /// Collection the item belongs to
    pub collection_label: Option<String>,
    /// Compressed (state-compressed) item
    pub is_compressed: bool,
}

impl PortfolioItem {
    /// Whether the item has an image that can become an avatar
    #[must_use]
    pub fn has_image(&self) -> bool {
        !self.image_reference.trim().is_empty()
    }

    /// Shortened id for list rows, e.g. `AbCdEf...wxyz`
    #[must_use]
    pub fn short_id(&self) -> String {
        let chars: Vec<char> = self.id.chars().collect();
        if chars.len() <= 10 {
            return self.id.clone();
        }
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    }
}

/// Where the pending avatar came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaSource {
    /// Device media library
    Library,
    /// Remote portfolio
    Portfolio,
}

/// Pending avatar selection.
///
/// The enum makes "no source iff nothing selected" structural: there is no
/// way to hold a reference without saying where it came from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum MediaSelection {
    /// Nothing selected
    #[default]
    None,
    /// Image picked from the device
    Library {
        /// Local URI returned by the picker
        local_image: String,
    },
    /// Item chosen from the portfolio
    Portfolio {
        /// The chosen item; always has an image
        item: PortfolioItem,
    },
}

impl MediaSelection {
    /// Source of the selection
    pub fn source(&self) -> Option<MediaSource> {
        match self {
            Self::None => None,
            Self::Library { .. } => Some(MediaSource::Library),
            Self::Portfolio { .. } => Some(MediaSource::Portfolio),
        }
    }

    /// Image reference that would be uploaded
    pub fn local_image_reference(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Library { local_image } => Some(local_image),
            Self::Portfolio { item } => Some(&item.image_reference),
        }
    }

    /// Selected portfolio item, if any
    pub fn selected_item(&self) -> Option<&PortfolioItem> {
        match self {
            Self::Portfolio { item } => Some(item),
            _ => None,
        }
    }

    /// Whether nothing is selected
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}
