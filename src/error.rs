use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    response::ErrorBody,
    services::{engine::EngineError, transcription_service::TranscriptionError},
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("No se envió archivo")]
    MissingFile,

    #[error("No se pudo extraer texto del archivo")]
    NoExtractableText,

    #[error("{0}")]
    BadRequest(String),

    #[error("Error llamando a Ollama")]
    Engine(#[from] EngineError),

    #[error("Error transcribiendo audio")]
    Transcription(#[from] TranscriptionError),

    #[error("Error guardando archivo: {0}")]
    AudioStorage(#[source] std::io::Error),

    #[error("La respuesta del modelo no respeta el catálogo")]
    CatalogMismatch(String),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingFile | AppError::NoExtractableText | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::CatalogMismatch(_) => StatusCode::BAD_GATEWAY,
            AppError::Engine(_)
            | AppError::Transcription(_)
            | AppError::AudioStorage(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            AppError::Engine(err) => Some(err.to_string()),
            AppError::Transcription(err) => Some(err.to_string()),
            AppError::AudioStorage(err) => Some(err.to_string()),
            AppError::CatalogMismatch(details) => Some(details.clone()),
            AppError::Internal(err) => Some(format!("{err:#}")),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let details = self.details();

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, details = ?details, "request failed");
        } else {
            tracing::warn!(status = %status, error = %self, "request rejected");
        }

        let body = ErrorBody {
            error: self.to_string(),
            details,
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
