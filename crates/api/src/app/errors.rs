//! JSON envelopes: `{ success: true, data }` or `{ success: false, error }`,
//! with `fatal: true` on unrecoverable sync failures.

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use serde_json::json;

use catsync_client::ClientError;
use catsync_engine::EngineError;
use catsync_synclog::LogStoreError;

pub fn ok(data: impl Serialize) -> axum::response::Response {
    Json(json!({ "success": true, "data": data })).into_response()
}

pub fn error(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        Json(json!({ "success": false, "error": message.into() })),
    )
        .into_response()
}

pub fn fatal_error(message: impl Into<String>) -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "success": false, "error": message.into(), "fatal": true })),
    )
        .into_response()
}

pub fn engine_error_to_response(err: EngineError) -> axum::response::Response {
    match &err {
        EngineError::AlreadyRunning => error(StatusCode::CONFLICT, err.to_string()),
        EngineError::NothingToSync => error(StatusCode::BAD_REQUEST, err.to_string()),
        EngineError::SessionExpired => error(StatusCode::GONE, err.to_string()),
        EngineError::Source(_) => error(StatusCode::BAD_GATEWAY, err.to_string()),
        EngineError::Fatal(_) => fatal_error(err.to_string()),
    }
}

pub fn client_error_to_response(err: ClientError) -> axum::response::Response {
    match &err {
        ClientError::Init(_) => error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        ClientError::MissingCredentials => error(StatusCode::BAD_REQUEST, err.to_string()),
        ClientError::AuthFailed { .. } | ClientError::InvalidToken => {
            error(StatusCode::UNAUTHORIZED, err.to_string())
        }
        _ => error(StatusCode::BAD_GATEWAY, err.to_string()),
    }
}

pub fn log_store_error_to_response(err: LogStoreError) -> axum::response::Response {
    match &err {
        LogStoreError::NotFound(_) => error(StatusCode::NOT_FOUND, err.to_string()),
        _ => error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}
