use axum::{
    Router,
    routing::{get, post},
};

pub mod logs;
pub mod sync;
pub mod system;

pub fn router() -> Router {
    Router::new()
        .nest("/sync", sync::router())
        .nest("/logs", logs::router())
        .route("/connection/test", post(system::test_connection))
        .route("/categories", get(system::categories))
}
