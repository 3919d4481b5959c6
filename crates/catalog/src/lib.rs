//! `catsync-catalog`: destination catalog interface and reconciliation policy.
//!
//! The catalog itself is an external collaborator; this crate defines the
//! store contract the engine writes through, an in-memory implementation for
//! tests and development, and the create/update reconciliation policy
//! ("sync locking").

pub mod entry;
pub mod reconcile;
pub mod store;

pub use entry::{CatalogEntry, EntryId, EntryPatch, EntryStatus, NewEntry, StockStatus};
pub use reconcile::{ItemOutcome, Reconciler};
pub use store::{CatalogError, CatalogStore, InMemoryCatalog};
