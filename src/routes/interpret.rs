use axum::{
    Json, Router,
    extract::{
        Multipart, State,
        multipart::MultipartRejection,
        rejection::JsonRejection,
    },
    routing::post,
};
use serde_json::Value;

use crate::{
    dto::{
        interpret::{InterpretVoiceRequest, InterpretVoiceResponse},
        upload::{UploadForm, UploadedFile},
    },
    error::{AppError, AppResult},
    models::DocumentProduct,
    response::ErrorBody,
    services::interpretation_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/interpretar", post(interpret_document))
        .route("/interpretar-voz", post(interpret_voice))
}

#[utoipa::path(
    post,
    path = "/interpretar",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Products found in the document", body = Vec<DocumentProduct>),
        (status = 400, description = "No file or no extractable text", body = ErrorBody),
        (status = 500, description = "Generation engine failure", body = ErrorBody),
    ),
    tag = "Interpretation"
)]
pub async fn interpret_document(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<Vec<Value>>> {
    let multipart = multipart.map_err(|_| AppError::MissingFile)?;
    let upload = UploadedFile::from_multipart(multipart).await?;
    let products = interpretation_service::interpret_document(&state, upload).await?;
    Ok(Json(products))
}

#[utoipa::path(
    post,
    path = "/interpretar-voz",
    request_body = InterpretVoiceRequest,
    responses(
        (status = 200, description = "Catalog products matched from the transcript", body = InterpretVoiceResponse),
        (status = 400, description = "Malformed request body", body = ErrorBody),
        (status = 500, description = "Generation engine failure", body = ErrorBody),
        (status = 502, description = "Model reply rejected by the catalog policy", body = ErrorBody),
    ),
    tag = "Interpretation"
)]
pub async fn interpret_voice(
    State(state): State<AppState>,
    payload: Result<Json<InterpretVoiceRequest>, JsonRejection>,
) -> AppResult<Json<InterpretVoiceResponse>> {
    let Json(payload) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    tracing::info!(
        texto = %payload.texto,
        catalog_size = payload.productos.len(),
        "voice interpretation requested"
    );
    let response =
        interpretation_service::interpret_voice(&state, payload.texto, payload.productos).await?;
    Ok(Json(response))
}
