//! Category mapping configuration.
//!
//! Maps source category names to destination categories. The mapping is edited
//! out-of-band (settings UI, config file) and is a read-only input to candidate
//! selection: only `enabled` categories contribute candidates.

use std::collections::BTreeMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::candidate::CategoryId;

/// Mapping for one source category.
///
/// Unknown fields are rejected on deserialization rather than silently kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MappingEntry {
    pub enabled: bool,
    #[serde(default)]
    pub destination_category_id: Option<CategoryId>,
    /// Cached item count shown by the mapping editor; informational only.
    #[serde(default)]
    pub item_count: u32,
}

impl MappingEntry {
    pub fn enabled(destination_category_id: Option<CategoryId>) -> Self {
        Self {
            enabled: true,
            destination_category_id,
            item_count: 0,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            destination_category_id: None,
            item_count: 0,
        }
    }
}

/// Full category mapping, keyed by source category name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryMappings(BTreeMap<String, MappingEntry>);

impl CategoryMappings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, category: impl Into<String>, entry: MappingEntry) {
        self.0.insert(category.into(), entry);
    }

    pub fn get(&self, category: &str) -> Option<&MappingEntry> {
        self.0.get(category)
    }

    /// The mapping entry for `category` if it exists and is enabled.
    pub fn enabled_entry(&self, category: &str) -> Option<&MappingEntry> {
        self.0.get(category).filter(|entry| entry.enabled)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MappingEntry)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, MappingEntry)> for CategoryMappings {
    fn from_iter<T: IntoIterator<Item = (String, MappingEntry)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Read access to the current category mapping.
///
/// Written by an external mapping editor; the sync pipeline only reads it.
pub trait MappingStore: Send + Sync {
    fn current(&self) -> CategoryMappings;

    fn replace(&self, mappings: CategoryMappings);
}

/// In-memory mapping store (settings cache, tests).
#[derive(Debug, Default)]
pub struct InMemoryMappingStore {
    inner: RwLock<CategoryMappings>,
}

impl InMemoryMappingStore {
    pub fn new(mappings: CategoryMappings) -> Self {
        Self {
            inner: RwLock::new(mappings),
        }
    }
}

impl MappingStore for InMemoryMappingStore {
    fn current(&self) -> CategoryMappings {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn replace(&self, mappings: CategoryMappings) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = mappings;
    }
}
