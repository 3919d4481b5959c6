//! `catsync-core`: shared domain primitives for the catalog synchronizer.
//!
//! This crate contains **pure domain** types (no I/O, no storage concerns):
//! sync candidates, category mappings and the run-type taxonomy.

pub mod candidate;
pub mod mapping;
pub mod run;

pub use candidate::{CategoryId, SyncCandidate};
pub use mapping::{CategoryMappings, InMemoryMappingStore, MappingEntry, MappingStore};
pub use run::RunType;
