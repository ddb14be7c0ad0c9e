use std::path::Path;

use axum::{body::Bytes, extract::Multipart};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

const FILE_FIELD: &str = "file";

/// Multipart form accepted by the upload routes.
#[derive(Debug, ToSchema)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    /// Reads the `file` part of a multipart body; any other part is ignored.
    pub async fn from_multipart(mut multipart: Multipart) -> AppResult<Self> {
        loop {
            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => return Err(AppError::MissingFile),
                Err(err) => {
                    tracing::warn!(error = %err, "malformed multipart body");
                    return Err(AppError::MissingFile);
                }
            };
            if field.name() != Some(FILE_FIELD) {
                continue;
            }

            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|err| AppError::BadRequest(format!("Error leyendo archivo: {err}")))?;

            tracing::info!(file_name = %file_name, size = bytes.len(), "file received");
            return Ok(Self { file_name, bytes });
        }
    }

    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
    }
}
