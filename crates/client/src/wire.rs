//! Vendor API wire formats and candidate flattening.

use serde::{Deserialize, Serialize};

use catsync_core::{CategoryMappings, SyncCandidate};

/// Login request body. Field names follow the vendor API.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    #[serde(rename = "Email")]
    pub email: &'a str,
    #[serde(rename = "Password")]
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: String,
}

/// Error body returned by the vendor API on non-success statuses.
#[derive(Debug, Default, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub message: String,
}

/// One inventory (source category) with its items.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteInventory {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub items: Vec<RemoteItem>,
}

/// One item as returned by the vendor API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "sellingPrice", default)]
    pub selling_price: f64,
    #[serde(default)]
    pub stock: i64,
    /// Absent means stock-managed; the feed only sets this to opt out.
    #[serde(rename = "manage_stock", default = "default_manage_stock")]
    pub manage_stock: bool,
    /// Source image URLs.
    #[serde(rename = "photoIds", default)]
    pub photo_ids: Vec<String>,
}

fn default_manage_stock() -> bool {
    true
}

/// Category name + item count, for the mapping editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub name: String,
    pub item_count: usize,
}

/// Flatten fetched inventories into sync candidates.
///
/// Categories absent from the mapping or not enabled are dropped; this is a
/// filter, not an error. Item order within each category is preserved, and
/// categories are visited in fetch order, so the candidate list is stable.
pub fn flatten_candidates(
    inventories: &[RemoteInventory],
    mappings: &CategoryMappings,
) -> Vec<SyncCandidate> {
    let mut candidates = Vec::new();

    for inventory in inventories {
        let Some(entry) = mappings.enabled_entry(&inventory.name) else {
            continue;
        };

        for item in &inventory.items {
            candidates.push(SyncCandidate {
                source_id: item.id.clone(),
                name: item.name.clone(),
                price: item.selling_price,
                stock_quantity: item.stock,
                stock_managed: item.manage_stock,
                image_urls: item.photo_ids.clone(),
                destination_category_id: entry.destination_category_id,
            });
        }
    }

    candidates
}

/// Summarize fetched inventories for the mapping editor.
pub fn summarize_categories(inventories: &[RemoteInventory]) -> Vec<CategorySummary> {
    inventories
        .iter()
        .map(|inventory| CategorySummary {
            name: inventory.name.clone(),
            item_count: inventory.items.len(),
        })
        .collect()
}
