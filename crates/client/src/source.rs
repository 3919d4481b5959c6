//! Candidate source seam between the client and the sync engine.

use std::sync::Arc;

use async_trait::async_trait;

use catsync_core::{MappingStore, SyncCandidate};

use crate::client::{ClientError, RemoteClient};

/// Produces the candidate list for a new run.
///
/// The engine depends on this seam rather than on the HTTP client directly,
/// so runs can be driven from fixtures in tests.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn fetch_candidates(&self) -> Result<Vec<SyncCandidate>, ClientError>;
}

/// Candidate source backed by the remote API and the current category mapping.
pub struct RemoteCandidateSource {
    client: Arc<RemoteClient>,
    mappings: Arc<dyn MappingStore>,
}

impl RemoteCandidateSource {
    pub fn new(client: Arc<RemoteClient>, mappings: Arc<dyn MappingStore>) -> Self {
        Self { client, mappings }
    }
}

#[async_trait]
impl CandidateSource for RemoteCandidateSource {
    async fn fetch_candidates(&self) -> Result<Vec<SyncCandidate>, ClientError> {
        let mappings = self.mappings.current();
        self.client.list_sync_candidates(&mappings).await
    }
}
