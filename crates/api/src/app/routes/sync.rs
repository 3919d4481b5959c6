use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    routing::{get, post},
};

use catsync_core::RunType;

use crate::app::{AppState, dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/start", post(start))
        .route("/batch", post(batch))
        .route("/status", get(status))
        .route("/cancel", post(cancel))
        .route("/report-failure", post(report_failure))
}

pub async fn start(
    Extension(state): Extension<Arc<AppState>>,
    body: Option<Json<dto::StartSyncRequest>>,
) -> axum::response::Response {
    let run_type = body
        .and_then(|Json(body)| body.run_type)
        .unwrap_or(RunType::Manual);

    match state.service.start(run_type).await {
        Ok(report) => errors::ok(report),
        Err(e) => errors::engine_error_to_response(e),
    }
}

/// One chunk of an in-flight run. The caller echoes back the run id, log id
/// and cursor it was handed.
pub async fn batch(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<dto::BatchRequest>,
) -> axum::response::Response {
    match state
        .service
        .advance(body.run_id, body.log_id, body.cursor)
        .await
    {
        Ok(report) => errors::ok(report),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn status(Extension(state): Extension<Arc<AppState>>) -> axum::response::Response {
    match state.service.status().await {
        Ok(report) => errors::ok(report),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn cancel(
    Extension(state): Extension<Arc<AppState>>,
    body: Option<Json<dto::CancelRequest>>,
) -> axum::response::Response {
    let log_id = body.and_then(|Json(body)| body.log_id);

    match state.service.cancel(log_id).await {
        Ok(was_active) => errors::ok(serde_json::json!({ "cancelled": was_active })),
        Err(e) => errors::engine_error_to_response(e),
    }
}

/// The driving side saw a failure the engine never did (e.g. a dropped
/// connection mid-chunk); close the run as failed.
pub async fn report_failure(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<dto::ReportFailureRequest>,
) -> axum::response::Response {
    match state
        .service
        .record_external_failure(body.run_id, body.log_id, body.message)
        .await
    {
        Ok(()) => errors::ok(serde_json::json!({ "recorded": true })),
        Err(e) => errors::engine_error_to_response(e),
    }
}
