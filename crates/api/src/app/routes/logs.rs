use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    routing::get,
};
use serde_json::json;

use catsync_synclog::LogId;

use crate::app::{AppState, dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list).delete(delete_all))
        .route("/statistics", get(statistics))
        .route("/:id", get(get_one).delete(delete_one))
}

pub async fn list(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<dto::LogListQuery>,
) -> axum::response::Response {
    let page = query.page.max(1);
    let per_page = query.per_page.clamp(1, 100);

    let entries = match state.logs.list(page, per_page).await {
        Ok(entries) => entries,
        Err(e) => return errors::log_store_error_to_response(e),
    };
    let total = match state.logs.count().await {
        Ok(total) => total,
        Err(e) => return errors::log_store_error_to_response(e),
    };

    errors::ok(json!({
        "entries": entries,
        "page": page,
        "per_page": per_page,
        "total": total,
    }))
}

pub async fn get_one(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let Ok(id) = id.parse::<LogId>() else {
        return errors::error(StatusCode::BAD_REQUEST, "invalid log id");
    };

    match state.logs.get(id).await {
        Ok(Some(entry)) => errors::ok(entry),
        Ok(None) => errors::error(StatusCode::NOT_FOUND, format!("log entry not found: {id}")),
        Err(e) => errors::log_store_error_to_response(e),
    }
}

pub async fn delete_one(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let Ok(id) = id.parse::<LogId>() else {
        return errors::error(StatusCode::BAD_REQUEST, "invalid log id");
    };

    match state.logs.delete(id).await {
        Ok(true) => errors::ok(json!({ "deleted": true })),
        Ok(false) => errors::error(StatusCode::NOT_FOUND, format!("log entry not found: {id}")),
        Err(e) => errors::log_store_error_to_response(e),
    }
}

pub async fn delete_all(Extension(state): Extension<Arc<AppState>>) -> axum::response::Response {
    match state.logs.delete_all().await {
        Ok(removed) => errors::ok(json!({ "deleted": removed })),
        Err(e) => errors::log_store_error_to_response(e),
    }
}

pub async fn statistics(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<dto::StatisticsQuery>,
) -> axum::response::Response {
    match state.logs.statistics(query.days).await {
        Ok(stats) => errors::ok(stats),
        Err(e) => errors::log_store_error_to_response(e),
    }
}
