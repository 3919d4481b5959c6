use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode};

use crate::app::{AppState, dto, errors};

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Verify explicit credentials against the vendor API before saving them.
pub async fn test_connection(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<dto::TestConnectionRequest>,
) -> axum::response::Response {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return errors::error(StatusCode::BAD_REQUEST, "email and password are required");
    }

    match state.client.test_connection(&body.email, &body.password).await {
        Ok(report) => errors::ok(report),
        Err(e) => errors::client_error_to_response(e),
    }
}

/// Vendor categories with item counts, for building the category mapping.
pub async fn categories(Extension(state): Extension<Arc<AppState>>) -> axum::response::Response {
    match state.client.categories_for_mapping().await {
        Ok(categories) => errors::ok(categories),
        Err(e) => errors::client_error_to_response(e),
    }
}
