//! Remote vendor API client with in-memory token caching.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use catsync_core::{CategoryMappings, SyncCandidate};
use serde::Serialize;

use crate::credentials::CredentialStore;
use crate::wire::{
    ApiMessage, CategorySummary, LoginRequest, LoginResponse, RemoteInventory, flatten_candidates,
    summarize_categories,
};

/// Cached bearer tokens are considered valid for this long.
const TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to initialize HTTP client: {0}")]
    Init(String),
    #[error("API credentials are not configured")]
    MissingCredentials,
    #[error("failed to connect to API: {0}")]
    Connection(String),
    #[error("authentication failed (HTTP {status}): {message}")]
    AuthFailed { status: u16, message: String },
    #[error("API did not return a valid token")]
    InvalidToken,
    #[error("API returned error code: {0}")]
    Status(u16),
    #[error("API returned invalid data format: {0}")]
    InvalidResponse(String),
}

/// Result of a connection test with explicit credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionReport {
    pub categories: usize,
    pub items: usize,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// HTTP client for the vendor catalog API.
///
/// The bearer token is cached in memory and refreshed transparently when
/// absent or expired. Credentials are re-read from the store on every
/// authentication, so settings changes apply on the next login.
pub struct RemoteClient {
    base_url: String,
    http: reqwest::Client,
    credentials: Arc<dyn CredentialStore>,
    token: Mutex<Option<CachedToken>>,
}

impl RemoteClient {
    /// Fails only when the underlying HTTP client cannot be constructed; a
    /// fallback client without the request timeout is not an option here.
    pub fn new(
        base_url: impl Into<String>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Init(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into(),
            http,
            credentials,
            token: Mutex::new(None),
        })
    }

    /// Authenticate with explicit credentials and cache the returned token.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<String, ClientError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ClientError::MissingCredentials);
        }

        let url = format!("{}/User/Login", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&LoginRequest {
                email: email.trim(),
                password,
            })
            .send()
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body: ApiMessage = response.json().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "authentication rejected");
            return Err(ClientError::AuthFailed {
                status: status.as_u16(),
                message: if body.message.is_empty() {
                    "unknown error".to_string()
                } else {
                    body.message
                },
            });
        }

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

        if body.token.is_empty() {
            return Err(ClientError::InvalidToken);
        }

        let mut cached = self.token.lock().unwrap_or_else(|e| e.into_inner());
        *cached = Some(CachedToken {
            token: body.token.clone(),
            expires_at: Instant::now() + TOKEN_TTL,
        });

        Ok(body.token)
    }

    /// A valid bearer token, re-authenticating with stored credentials when
    /// the cached one is absent or expired.
    pub async fn token(&self) -> Result<String, ClientError> {
        {
            let cached = self.token.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(cached) = cached.as_ref() {
                if Instant::now() < cached.expires_at {
                    return Ok(cached.token.clone());
                }
            }
        }

        let credentials = self
            .credentials
            .get()
            .filter(|c| c.is_complete())
            .ok_or(ClientError::MissingCredentials)?;

        tracing::debug!("token cache miss, re-authenticating");
        self.authenticate(&credentials.email, &credentials.password)
            .await
    }

    /// Fetch the full inventory tree (all source categories with items).
    pub async fn fetch_inventories(&self) -> Result<Vec<RemoteInventory>, ClientError> {
        let token = self.token().await?;
        self.fetch_inventories_with(&token).await
    }

    async fn fetch_inventories_with(&self, token: &str) -> Result<Vec<RemoteInventory>, ClientError> {
        let url = format!("{}/Data/GetAllInventories", self.base_url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    /// Fetch and flatten sync candidates for the enabled mapping entries.
    ///
    /// An empty result is valid: zero enabled categories or an empty feed.
    pub async fn list_sync_candidates(
        &self,
        mappings: &CategoryMappings,
    ) -> Result<Vec<SyncCandidate>, ClientError> {
        let inventories = self.fetch_inventories().await?;
        let candidates = flatten_candidates(&inventories, mappings);
        tracing::debug!(
            categories = inventories.len(),
            candidates = candidates.len(),
            "flattened sync candidates"
        );
        Ok(candidates)
    }

    /// Category names + item counts for the mapping editor.
    pub async fn categories_for_mapping(&self) -> Result<Vec<CategorySummary>, ClientError> {
        let inventories = self.fetch_inventories().await?;
        Ok(summarize_categories(&inventories))
    }

    /// Verify explicit credentials end to end: authenticate, then fetch the
    /// inventory tree to confirm data access.
    pub async fn test_connection(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ConnectionReport, ClientError> {
        let token = self.authenticate(email, password).await?;
        let inventories = self.fetch_inventories_with(&token).await?;

        Ok(ConnectionReport {
            categories: inventories.len(),
            items: inventories.iter().map(|i| i.items.len()).sum(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{Credentials, StaticCredentialStore};

    #[test]
    fn construction_surfaces_builder_failures() {
        let store = Arc::new(StaticCredentialStore::new(Credentials::new(
            "ops@example.com",
            "secret",
        )));
        let client = RemoteClient::new("http://localhost:9000", store);
        assert!(client.is_ok());
    }
}
