use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct HealthData {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct EngineHealth {
    pub status: String,
    pub model: String,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "OK", body = HealthData),
    ),
        tag = "Health"
)]
pub async fn health_check() -> Json<HealthData> {
    Json(HealthData {
        status: "ok".to_string(),
        timestamp: Utc::now(),
    })
}

#[utoipa::path(
    get,
    path = "/health/engine",
    responses(
        (status = 200, description = "Engine reachable", body = EngineHealth),
        (status = 503, description = "Engine unreachable", body = EngineHealth),
    ),
        tag = "Health"
)]
pub async fn engine_health(State(state): State<AppState>) -> (StatusCode, Json<EngineHealth>) {
    let model = state.engine.model().to_string();
    match state.engine.model_available().await {
        Ok(available) => (
            StatusCode::OK,
            Json(EngineHealth {
                status: if available { "ok" } else { "model_missing" }.to_string(),
                model,
                available,
                details: None,
            }),
        ),
        Err(err) => {
            tracing::warn!(error = %err, "engine health probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(EngineHealth {
                    status: "unavailable".to_string(),
                    model,
                    available: false,
                    details: Some(err.to_string()),
                }),
            )
        }
    }
}
