//! Sync candidates: one source item paired with its resolved destination category.

use serde::{Deserialize, Serialize};

/// Identifier of a destination catalog category.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub i64);

impl core::fmt::Display for CategoryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// One source item selected for synchronization.
///
/// Immutable once produced: the client builds a fresh candidate list per run,
/// and the engine snapshots it into the run's working set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncCandidate {
    /// Stable cross-system identifier. Used as the destination `sku`.
    pub source_id: String,
    pub name: String,
    /// Selling price from the remote feed.
    pub price: f64,
    pub stock_quantity: i64,
    /// Whether the destination entry should track stock for this item.
    pub stock_managed: bool,
    /// Source image URLs; the first one becomes the primary image on create.
    pub image_urls: Vec<String>,
    /// Resolved destination category, if the mapping names one.
    pub destination_category_id: Option<CategoryId>,
}

impl SyncCandidate {
    /// The destination sku, trimmed. Empty means the candidate is invalid.
    pub fn sku(&self) -> &str {
        self.source_id.trim()
    }
}
