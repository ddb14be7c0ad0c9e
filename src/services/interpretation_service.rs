use serde_json::Value;

use crate::{
    dto::{interpret::InterpretVoiceResponse, upload::UploadedFile},
    error::{AppError, AppResult},
    services::{
        catalog::{self, Catalog},
        engine::GenerationOptions,
        prompt,
        reply::parse_reply,
        text_extractor,
    },
    state::AppState,
};

/// Extracts text from an uploaded document and asks the model for its products.
pub async fn interpret_document(state: &AppState, upload: UploadedFile) -> AppResult<Vec<Value>> {
    let file_name = upload.file_name.clone();
    let text = tokio::task::spawn_blocking(move || {
        text_extractor::extract_text(&upload.file_name, &upload.bytes)
    })
    .await
    .unwrap_or_else(|err| {
        tracing::error!(error = %err, "text extraction panicked");
        None
    });

    let Some(text) = text.filter(|text| !text.trim().is_empty()) else {
        return Err(AppError::NoExtractableText);
    };

    tracing::debug!(file_name = %file_name, chars = text.chars().count(), "document text extracted");
    extract_from_text(state, &text).await
}

/// Document mode: any reply that is not a JSON array becomes an empty list.
pub async fn extract_from_text(state: &AppState, raw_text: &str) -> AppResult<Vec<Value>> {
    let prompt = prompt::document_prompt(raw_text);
    let raw = state
        .engine
        .generate(&prompt, &GenerationOptions::document())
        .await?;

    let products = parse_reply(&raw, state.config.lenient_replies).into_products(&raw);
    tracing::info!(products = products.len(), "document interpreted");
    Ok(products)
}

/// Voice mode: matches a transcript against the caller's catalog.
pub async fn interpret_voice(
    state: &AppState,
    transcript: String,
    catalog_values: Vec<Value>,
) -> AppResult<InterpretVoiceResponse> {
    let prompt = prompt::voice_prompt(&transcript, &catalog_values);
    let raw = state
        .engine
        .generate(&prompt, &GenerationOptions::voice())
        .await?;

    let candidates = parse_reply(&raw, state.config.lenient_replies).into_products(&raw);
    let catalog = Catalog::from_values(&catalog_values);
    let proposed = candidates.len();

    let productos = catalog::reconcile(candidates, &catalog, state.config.catalog_policy)
        .map_err(|violations| {
            let details = violations
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            AppError::CatalogMismatch(details)
        })?;

    tracing::info!(
        proposed,
        accepted = productos.len(),
        catalog_size = catalog.len(),
        catalog_skipped = catalog.skipped(),
        policy = %state.config.catalog_policy,
        "voice interpreted"
    );

    Ok(InterpretVoiceResponse {
        productos,
        texto_original: transcript,
    })
}
