//! `catsync-client`: HTTP client for the remote vendor catalog API.
//!
//! Authenticates against the vendor API, caches the bearer token in memory,
//! fetches the inventory tree and flattens it into sync candidates filtered by
//! the category mapping.

pub mod client;
pub mod credentials;
pub mod source;
pub mod wire;

pub use client::{ClientError, ConnectionReport, RemoteClient};
pub use credentials::{CredentialStore, Credentials, EnvCredentialStore, StaticCredentialStore};
pub use source::{CandidateSource, RemoteCandidateSource};
pub use wire::{CategorySummary, RemoteInventory, RemoteItem};
