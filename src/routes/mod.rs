use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{StatusCode, Uri},
    routing::get,
};

use crate::{response::ErrorBody, state::AppState};

pub mod doc;
pub mod health;
pub mod interpret;
pub mod transcription;

/// Full application router with state bound; transport layers are added by the binary.
pub fn create_router(state: AppState) -> Router {
    let max_upload_bytes = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/engine", get(health::engine_health))
        .merge(interpret::router())
        .merge(transcription::router())
        .merge(doc::scalar_docs())
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ErrorBody>) {
    let body = ErrorBody::with_details("Not Found", uri.path());
    (StatusCode::NOT_FOUND, Json(body))
}
