//! HTTP application wiring (Axum router + service wiring).
//!
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs and query parameters
//! - `errors.rs`: consistent `{ success, ... }` envelopes and error mapping

use std::sync::Arc;

use axum::{Extension, Router, routing::get};

use catsync_catalog::{InMemoryCatalog, Reconciler};
use catsync_client::{EnvCredentialStore, RemoteCandidateSource, RemoteClient};
use catsync_core::{CategoryMappings, InMemoryMappingStore, MappingStore};
use catsync_engine::{InMemoryRunStateStore, SyncService};
use catsync_synclog::{SqliteSyncLogStore, SyncLogStore, SyncLogger};

use crate::config::ApiConfig;

pub mod dto;
pub mod errors;
pub mod routes;

/// Shared handler state.
pub struct AppState {
    pub service: SyncService,
    pub logs: Arc<dyn SyncLogStore>,
    pub client: Arc<RemoteClient>,
    pub mappings: Arc<dyn MappingStore>,
}

/// Wire production services from configuration.
pub async fn build_state(config: &ApiConfig) -> anyhow::Result<Arc<AppState>> {
    let logs: Arc<dyn SyncLogStore> =
        Arc::new(SqliteSyncLogStore::connect(&config.database_url).await?);

    let client = Arc::new(RemoteClient::new(
        config.remote_base_url.clone(),
        Arc::new(EnvCredentialStore::default()),
    )?);

    let mappings: Arc<dyn MappingStore> =
        Arc::new(InMemoryMappingStore::new(CategoryMappings::new()));

    // In-memory destination catalog; a durable implementation plugs in here.
    let catalog = InMemoryCatalog::arc();

    let service = SyncService::new(
        Arc::new(RemoteCandidateSource::new(client.clone(), mappings.clone())),
        Reconciler::new(catalog),
        SyncLogger::new(logs.clone()),
        InMemoryRunStateStore::arc(),
    )
    .with_batch_size(config.batch_size);

    Ok(Arc::new(AppState {
        service,
        logs,
        client,
        mappings,
    }))
}

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(Extension(state))
}
