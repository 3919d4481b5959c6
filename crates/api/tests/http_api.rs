use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Value, json};

use catsync_api::app::{AppState, build_app};
use catsync_catalog::{InMemoryCatalog, Reconciler};
use catsync_client::{CandidateSource, ClientError, EnvCredentialStore, RemoteClient};
use catsync_core::{CategoryId, CategoryMappings, InMemoryMappingStore, SyncCandidate};
use catsync_engine::{InMemoryRunStateStore, SyncService};
use catsync_synclog::{InMemorySyncLogStore, SyncLogger};

struct FixtureSource(Vec<SyncCandidate>);

#[async_trait]
impl CandidateSource for FixtureSource {
    async fn fetch_candidates(&self) -> Result<Vec<SyncCandidate>, ClientError> {
        Ok(self.0.clone())
    }
}

fn candidates(n: usize) -> Vec<SyncCandidate> {
    (0..n)
        .map(|i| SyncCandidate {
            source_id: format!("SKU{i}"),
            name: format!("Item {i}"),
            price: 10.0 + i as f64,
            stock_quantity: i as i64,
            stock_managed: true,
            image_urls: vec![],
            destination_category_id: Some(CategoryId(3)),
        })
        .collect()
}

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Same router as prod, but with a fixture candidate source and
    /// in-memory stores, bound to an ephemeral port.
    async fn spawn(feed: Vec<SyncCandidate>, batch_size: usize) -> Self {
        let client = Arc::new(
            RemoteClient::new(
                "http://127.0.0.1:9".to_string(),
                Arc::new(EnvCredentialStore::default()),
            )
            .unwrap(),
        );
        let logs = InMemorySyncLogStore::arc();
        let service = SyncService::new(
            Arc::new(FixtureSource(feed)),
            Reconciler::new(InMemoryCatalog::arc()),
            SyncLogger::new(logs.clone()),
            InMemoryRunStateStore::arc(),
        )
        .with_batch_size(batch_size);

        let state = Arc::new(AppState {
            service,
            logs,
            client,
            mappings: Arc::new(InMemoryMappingStore::new(CategoryMappings::new())),
        });
        let app = build_app(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn post_json(client: &reqwest::Client, url: String, body: Value) -> (StatusCode, Value) {
    let res = client.post(url).json(&body).send().await.unwrap();
    let status = res.status();
    (status, res.json().await.unwrap())
}

#[tokio::test]
async fn health_endpoint_is_up() {
    let server = TestServer::spawn(vec![], 10).await;
    let res = reqwest::get(format!("{}/health", server.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn full_sync_over_http() {
    let server = TestServer::spawn(candidates(5), 2).await;
    let client = reqwest::Client::new();

    let (status, body) = post_json(
        &client,
        format!("{}/sync/start", server.base_url),
        json!({ "run_type": "manual" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["total"], 5);

    let run_id = body["data"]["run_id"].as_str().unwrap().to_string();
    let log_id = body["data"]["log_id"].as_str().unwrap().to_string();

    // Drive the run chunk by chunk, echoing the cursor back each time.
    let mut cursor = 0u64;
    loop {
        let (status, body) = post_json(
            &client,
            format!("{}/sync/batch", server.base_url),
            json!({ "run_id": run_id, "log_id": log_id, "cursor": cursor }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        cursor = body["data"]["processed"].as_u64().unwrap();
        if body["data"]["complete"] == true {
            assert_eq!(body["data"]["created"], 5);
            break;
        }
    }

    let body: Value = client
        .get(format!("{}/sync/status", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["state"], "idle");
    assert_eq!(body["data"]["latest"]["status"], "completed");

    let body: Value = client
        .get(format!("{}/logs", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn concurrent_start_conflicts_until_cancelled() {
    let server = TestServer::spawn(candidates(3), 1).await;
    let client = reqwest::Client::new();

    let (status, body) =
        post_json(&client, format!("{}/sync/start", server.base_url), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let log_id = body["data"]["log_id"].as_str().unwrap().to_string();

    let (status, body) =
        post_json(&client, format!("{}/sync/start", server.base_url), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let (status, body) = post_json(
        &client,
        format!("{}/sync/cancel", server.base_url),
        json!({ "log_id": log_id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["cancelled"], true);

    let (status, _body) =
        post_json(&client, format!("{}/sync/start", server.base_url), json!({})).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn batch_for_an_unknown_session_is_gone() {
    let server = TestServer::spawn(candidates(3), 1).await;
    let client = reqwest::Client::new();

    let (status, body) = post_json(
        &client,
        format!("{}/sync/batch", server.base_url),
        json!({
            "run_id": uuid::Uuid::now_v7(),
            "log_id": uuid::Uuid::now_v7(),
            "cursor": 0,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn empty_selection_is_a_bad_request() {
    let server = TestServer::spawn(vec![], 10).await;
    let client = reqwest::Client::new();

    let (status, body) =
        post_json(&client, format!("{}/sync/start", server.base_url), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("no products"));
}

#[tokio::test]
async fn log_endpoints_round_trip() {
    let server = TestServer::spawn(candidates(2), 10).await;
    let client = reqwest::Client::new();

    let (_, body) =
        post_json(&client, format!("{}/sync/start", server.base_url), json!({})).await;
    let run_id = body["data"]["run_id"].as_str().unwrap().to_string();
    let log_id = body["data"]["log_id"].as_str().unwrap().to_string();
    post_json(
        &client,
        format!("{}/sync/batch", server.base_url),
        json!({ "run_id": run_id, "log_id": log_id, "cursor": 0 }),
    )
    .await;

    let res = client
        .get(format!("{}/logs/{}", server.base_url, log_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["created_count"], 2);

    let body: Value = client
        .get(format!("{}/logs/statistics?days=7", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["total_runs"], 1);
    assert_eq!(body["data"]["total_created"], 2);

    let res = client
        .delete(format!("{}/logs/{}", server.base_url, log_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/logs/{}", server.base_url, log_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
