use axum::{
    Json, Router,
    extract::{Multipart, State, multipart::MultipartRejection},
    routing::post,
};

use crate::{
    dto::{
        transcription::TranscriptionResponse,
        upload::{UploadForm, UploadedFile},
    },
    error::{AppError, AppResult},
    response::ErrorBody,
    services::transcription_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/transcribir-audio", post(transcribe_audio))
}

#[utoipa::path(
    post,
    path = "/transcribir-audio",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Transcribed text", body = TranscriptionResponse),
        (status = 400, description = "No file sent", body = ErrorBody),
        (status = 500, description = "Saving or transcribing the audio failed", body = ErrorBody),
    ),
    tag = "Transcription"
)]
pub async fn transcribe_audio(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<TranscriptionResponse>> {
    let multipart = multipart.map_err(|_| AppError::MissingFile)?;
    let upload = UploadedFile::from_multipart(multipart).await?;
    let response = transcription_service::transcribe_upload(&state, upload).await?;
    Ok(Json(response))
}
