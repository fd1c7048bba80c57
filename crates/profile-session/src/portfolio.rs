//! # Portfolio records
//!
//! Query sent to the portfolio source and the lenient mapping from its raw
//! JSON body into [`PortfolioItem`]s.
//!
//! Mapping rules:
//! - a body that is not an array is an empty portfolio
//! - elements that are not objects are skipped
//! - records without a mint (`setterMintMe`) are skipped
//! - any other field of the wrong type reads as absent
//! - the first record wins when a mint appears twice

use crate::config::PortfolioConfig;
use crate::model::PortfolioItem;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

/// Portfolio request for one owner
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioQuery {
    /// Owner wallet
    pub wallet: String,
    /// Include unverified collections
    pub include_unverified: bool,
    /// Include compressed items
    pub include_compressed: bool,
    /// Attach favourite counts
    pub include_favourite_count: bool,
}

impl PortfolioQuery {
    /// Query for `wallet` using the configured flags
    pub fn for_owner(wallet: impl Into<String>, config: &PortfolioConfig) -> Self {
        Self {
            wallet: wallet.into(),
            include_unverified: config.include_unverified,
            include_compressed: config.include_compressed,
            include_favourite_count: config.include_favourite_count,
        }
    }
}

/// One element of the portfolio body as the source returns it
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawPortfolioRecord {
    /// Mint address
    #[serde(deserialize_with = "lenient")]
    pub setter_mint_me: Option<String>,
    /// Item name
    #[serde(deserialize_with = "lenient")]
    pub name: Option<String>,
    /// Image URL
    #[serde(deserialize_with = "lenient")]
    pub image_uri: Option<String>,
    /// Collection display slug
    #[serde(deserialize_with = "lenient")]
    pub slug_display: Option<String>,
    /// Compressed flag
    #[serde(deserialize_with = "lenient")]
    pub is_compressed: Option<bool>,
}

/// Decode a field, reading a value of the wrong type as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl RawPortfolioRecord {
    /// Convert into an item, or `None` when the record has no mint
    pub fn into_item(self, fallback_name: &str) -> Option<PortfolioItem> {
        let id = self.setter_mint_me.filter(|mint| !mint.is_empty())?;
        Some(PortfolioItem {
            id,
            display_name: self
                .name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| fallback_name.to_string()),
            image_reference: self.image_uri.unwrap_or_default(),
            collection_label: self.slug_display.filter(|slug| !slug.is_empty()),
            is_compressed: self.is_compressed.unwrap_or(false),
        })
    }
}

/// Map a raw portfolio body into items.
pub fn map_portfolio(body: serde_json::Value, fallback_name: &str) -> Vec<PortfolioItem> {
    let serde_json::Value::Array(records) = body else {
        tracing::debug!("portfolio body is not an array; treating as empty");
        return Vec::new();
    };

    let total = records.len();
    let mut seen = HashSet::new();
    let items: Vec<PortfolioItem> = records
        .into_iter()
        .filter(serde_json::Value::is_object)
        .filter_map(|value| serde_json::from_value::<RawPortfolioRecord>(value).ok())
        .filter_map(|record| record.into_item(fallback_name))
        .filter(|item| seen.insert(item.id.clone()))
        .collect();

    if items.len() != total {
        tracing::debug!(total, kept = items.len(), "dropped portfolio records");
    }
    items
}
