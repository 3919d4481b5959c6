//! Catalog store contract and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::entry::{CatalogEntry, EntryId, EntryPatch, NewEntry};

#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    #[error("entry not found: {0}")]
    NotFound(EntryId),
    #[error("duplicate sku: {0}")]
    DuplicateSku(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("image error: {0}")]
    Image(String),
}

/// Destination catalog operations the sync engine depends on.
///
/// Existence of an entry with a matching sku is the sole create-vs-update
/// signal; sku is unique across the catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Look up an entry id by sku.
    async fn find_by_sku(&self, sku: &str) -> Result<Option<EntryId>, CatalogError>;

    /// Create a new entry with the full field set.
    async fn create_entry(&self, entry: NewEntry) -> Result<EntryId, CatalogError>;

    /// Apply a price/stock patch to an existing entry.
    async fn update_entry(&self, id: EntryId, patch: EntryPatch) -> Result<(), CatalogError>;

    /// Attach a primary image by source URL. The implementation may dedupe by
    /// URL; only success or failure matters here.
    async fn attach_primary_image(&self, id: EntryId, source_url: &str)
    -> Result<(), CatalogError>;
}

/// In-memory catalog for tests and development.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    entries: RwLock<HashMap<EntryId, CatalogEntry>>,
    by_sku: RwLock<HashMap<String, EntryId>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Replace an entry snapshot wholesale (fixtures; simulates out-of-band
    /// catalog curation that a sync must not clobber).
    pub fn put(&self, entry: CatalogEntry) {
        self.by_sku
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(entry.sku.clone(), entry.id);
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(entry.id, entry);
    }

    /// Fetch a full entry snapshot (test/introspection helper).
    pub fn get(&self, id: EntryId) -> Option<CatalogEntry> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&id)
            .cloned()
    }

    /// Fetch a full entry snapshot by sku.
    pub fn get_by_sku(&self, sku: &str) -> Option<CatalogEntry> {
        let id = *self
            .by_sku
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(sku)?;
        self.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn find_by_sku(&self, sku: &str) -> Result<Option<EntryId>, CatalogError> {
        Ok(self
            .by_sku
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(sku)
            .copied())
    }

    async fn create_entry(&self, entry: NewEntry) -> Result<EntryId, CatalogError> {
        let mut by_sku = self.by_sku.write().unwrap_or_else(|e| e.into_inner());
        if by_sku.contains_key(&entry.sku) {
            return Err(CatalogError::DuplicateSku(entry.sku));
        }

        let entry: CatalogEntry = entry.into();
        let id = entry.id;
        by_sku.insert(entry.sku.clone(), id);
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, entry);
        Ok(id)
    }

    async fn update_entry(&self, id: EntryId, patch: EntryPatch) -> Result<(), CatalogError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let entry = entries.get_mut(&id).ok_or(CatalogError::NotFound(id))?;
        entry.apply(&patch);
        Ok(())
    }

    async fn attach_primary_image(
        &self,
        id: EntryId,
        source_url: &str,
    ) -> Result<(), CatalogError> {
        if source_url.trim().is_empty() {
            return Err(CatalogError::Image("image URL is empty".to_string()));
        }

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let entry = entries.get_mut(&id).ok_or(CatalogError::NotFound(id))?;
        entry.primary_image = Some(source_url.to_string());
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for Arc<InMemoryCatalog> {
    async fn find_by_sku(&self, sku: &str) -> Result<Option<EntryId>, CatalogError> {
        (**self).find_by_sku(sku).await
    }

    async fn create_entry(&self, entry: NewEntry) -> Result<EntryId, CatalogError> {
        (**self).create_entry(entry).await
    }

    async fn update_entry(&self, id: EntryId, patch: EntryPatch) -> Result<(), CatalogError> {
        (**self).update_entry(id, patch).await
    }

    async fn attach_primary_image(
        &self,
        id: EntryId,
        source_url: &str,
    ) -> Result<(), CatalogError> {
        (**self).attach_primary_image(id, source_url).await
    }
}
