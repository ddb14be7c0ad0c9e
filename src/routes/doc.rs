use utoipa::{OpenApi, openapi::OpenApi as OpenApiSpec};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        interpret::{InterpretVoiceRequest, InterpretVoiceResponse},
        transcription::TranscriptionResponse,
        upload::UploadForm,
    },
    models::{CatalogEntry, DocumentProduct, VoiceProduct},
    response::ErrorBody,
    routes::{health, interpret, transcription},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::engine_health,
        interpret::interpret_document,
        interpret::interpret_voice,
        transcription::transcribe_audio
    ),
    components(
        schemas(
            DocumentProduct,
            VoiceProduct,
            CatalogEntry,
            UploadForm,
            InterpretVoiceRequest,
            InterpretVoiceResponse,
            TranscriptionResponse,
            ErrorBody,
            health::HealthData,
            health::EngineHealth
        )
    ),
    tags(
        (name = "Health", description = "Liveness and engine availability"),
        (name = "Interpretation", description = "Product extraction from documents and voice"),
        (name = "Transcription", description = "Speech to text"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
