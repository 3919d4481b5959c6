//! Create/update reconciliation policy ("sync locking").
//!
//! New items are created in full as drafts; existing items only ever get
//! price and stock overwritten. The remote feed is authoritative for
//! commerce-critical fields only; local curation (title, categories, publish
//! decision, imagery) is never clobbered by a sync.

use std::sync::Arc;

use catsync_core::SyncCandidate;

use crate::entry::{EntryId, EntryPatch, EntryStatus, NewEntry, StockStatus};
use crate::store::CatalogStore;

/// Outcome of reconciling one candidate.
///
/// Per-item failures are data, not control flow: reconciliation itself is
/// infallible so a bad item can never abort a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Created {
        entry_id: EntryId,
        sku: String,
        /// Image attachment failed on an otherwise successful create.
        image_error: Option<String>,
    },
    Updated {
        entry_id: EntryId,
        sku: String,
    },
    Error {
        message: String,
        sku: Option<String>,
    },
}

impl ItemOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, ItemOutcome::Error { .. })
    }
}

/// Applies the reconciliation policy against a catalog store.
pub struct Reconciler {
    store: Arc<dyn CatalogStore>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Reconcile one candidate: create as draft if the sku is unknown,
    /// otherwise update price/stock only.
    pub async fn reconcile(&self, candidate: &SyncCandidate) -> ItemOutcome {
        let sku = candidate.sku();
        if sku.is_empty() {
            return ItemOutcome::Error {
                message: "product missing ID/SKU".to_string(),
                sku: None,
            };
        }

        let existing = match self.store.find_by_sku(sku).await {
            Ok(existing) => existing,
            Err(e) => {
                return ItemOutcome::Error {
                    message: format!("error processing SKU {sku}: {e}"),
                    sku: Some(sku.to_string()),
                };
            }
        };

        match existing {
            Some(entry_id) => self.update_existing(entry_id, sku, candidate).await,
            None => self.create_new(sku, candidate).await,
        }
    }

    async fn create_new(&self, sku: &str, candidate: &SyncCandidate) -> ItemOutcome {
        let (stock_quantity, stock_status) = stock_fields(candidate);

        let entry = NewEntry {
            sku: sku.to_string(),
            name: candidate.name.clone(),
            regular_price: candidate.price,
            manage_stock: candidate.stock_managed,
            stock_quantity,
            stock_status,
            category_ids: candidate.destination_category_id.into_iter().collect(),
            // New products land unpublished for manual review.
            status: EntryStatus::Draft,
        };

        let entry_id = match self.store.create_entry(entry).await {
            Ok(id) => id,
            Err(e) => {
                return ItemOutcome::Error {
                    message: format!("failed to create product for SKU {sku}: {e}"),
                    sku: Some(sku.to_string()),
                };
            }
        };

        let image_error = match candidate.image_urls.first() {
            Some(url) => self
                .store
                .attach_primary_image(entry_id, url)
                .await
                .err()
                .map(|e| {
                    tracing::warn!(sku, entry_id = %entry_id, "image attach failed: {e}");
                    e.to_string()
                }),
            None => None,
        };

        ItemOutcome::Created {
            entry_id,
            sku: sku.to_string(),
            image_error,
        }
    }

    async fn update_existing(
        &self,
        entry_id: EntryId,
        sku: &str,
        candidate: &SyncCandidate,
    ) -> ItemOutcome {
        let (stock_quantity, stock_status) = stock_fields(candidate);

        // No dirty-check: price/stock are re-saved even when unchanged.
        let patch = EntryPatch {
            regular_price: Some(candidate.price),
            manage_stock: Some(candidate.stock_managed),
            stock_quantity,
            stock_status,
        };

        match self.store.update_entry(entry_id, patch).await {
            Ok(()) => ItemOutcome::Updated {
                entry_id,
                sku: sku.to_string(),
            },
            Err(e) => ItemOutcome::Error {
                message: format!("error processing SKU {sku}: {e}"),
                sku: Some(sku.to_string()),
            },
        }
    }
}

fn stock_fields(candidate: &SyncCandidate) -> (Option<i64>, Option<StockStatus>) {
    if candidate.stock_managed {
        (
            Some(candidate.stock_quantity),
            Some(StockStatus::for_quantity(candidate.stock_quantity)),
        )
    } else {
        (None, None)
    }
}
