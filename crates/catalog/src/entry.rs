//! Destination catalog entry model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use catsync_core::CategoryId;

/// Identifier of a destination catalog entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub Uuid);

impl EntryId {
    /// Uses UUIDv7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for EntryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Stock availability of an entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    OutOfStock,
}

impl StockStatus {
    /// Derived identically on create and update: positive quantity is in stock.
    pub fn for_quantity(quantity: i64) -> Self {
        if quantity > 0 {
            StockStatus::InStock
        } else {
            StockStatus::OutOfStock
        }
    }
}

/// Visibility state of an entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Not published; the default for synced creations.
    Draft,
    Published,
}

/// A destination catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: EntryId,
    pub sku: String,
    pub name: String,
    pub regular_price: f64,
    pub manage_stock: bool,
    pub stock_quantity: Option<i64>,
    pub stock_status: Option<StockStatus>,
    pub category_ids: Vec<CategoryId>,
    pub status: EntryStatus,
    /// Primary image source URL, if one was attached.
    pub primary_image: Option<String>,
}

/// Full field set used when creating a new entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub sku: String,
    pub name: String,
    pub regular_price: f64,
    pub manage_stock: bool,
    pub stock_quantity: Option<i64>,
    pub stock_status: Option<StockStatus>,
    pub category_ids: Vec<CategoryId>,
    pub status: EntryStatus,
}

/// Update payload for an existing entry.
///
/// Deliberately narrow: name, categories, publish status and images cannot be
/// expressed here, so a sync update cannot clobber local catalog curation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryPatch {
    pub regular_price: Option<f64>,
    pub manage_stock: Option<bool>,
    pub stock_quantity: Option<i64>,
    pub stock_status: Option<StockStatus>,
}

impl CatalogEntry {
    /// Apply an update-path patch. Only price and stock fields can change.
    pub fn apply(&mut self, patch: &EntryPatch) {
        if let Some(price) = patch.regular_price {
            self.regular_price = price;
        }
        if let Some(manage) = patch.manage_stock {
            self.manage_stock = manage;
        }
        if let Some(quantity) = patch.stock_quantity {
            self.stock_quantity = Some(quantity);
        }
        if let Some(status) = patch.stock_status {
            self.stock_status = Some(status);
        }
    }
}

impl From<NewEntry> for CatalogEntry {
    fn from(new: NewEntry) -> Self {
        Self {
            id: EntryId::new(),
            sku: new.sku,
            name: new.name,
            regular_price: new.regular_price,
            manage_stock: new.manage_stock,
            stock_quantity: new.stock_quantity,
            stock_status: new.stock_status,
            category_ids: new.category_ids,
            status: new.status,
            primary_image: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_status_follows_quantity_sign() {
        assert_eq!(StockStatus::for_quantity(3), StockStatus::InStock);
        assert_eq!(StockStatus::for_quantity(1), StockStatus::InStock);
        assert_eq!(StockStatus::for_quantity(0), StockStatus::OutOfStock);
        assert_eq!(StockStatus::for_quantity(-2), StockStatus::OutOfStock);
    }

    #[test]
    fn patch_cannot_touch_curated_fields() {
        let mut entry: CatalogEntry = NewEntry {
            sku: "SKU1".to_string(),
            name: "Model X".to_string(),
            regular_price: 99.5,
            manage_stock: true,
            stock_quantity: Some(3),
            stock_status: Some(StockStatus::InStock),
            category_ids: vec![CategoryId(5)],
            status: EntryStatus::Draft,
        }
        .into();
        entry.status = EntryStatus::Published;
        entry.primary_image = Some("https://img.example/1.jpg".to_string());

        let before = entry.clone();
        entry.apply(&EntryPatch {
            regular_price: Some(79.0),
            manage_stock: Some(true),
            stock_quantity: Some(0),
            stock_status: Some(StockStatus::OutOfStock),
        });

        assert_eq!(entry.name, before.name);
        assert_eq!(entry.category_ids, before.category_ids);
        assert_eq!(entry.status, before.status);
        assert_eq!(entry.primary_image, before.primary_image);
        assert_eq!(entry.regular_price, 79.0);
        assert_eq!(entry.stock_quantity, Some(0));
        assert_eq!(entry.stock_status, Some(StockStatus::OutOfStock));
    }
}
