pub mod catalog;
pub mod engine;
pub mod interpretation_service;
pub mod launcher;
pub mod prompt;
pub mod reply;
pub mod text_extractor;
pub mod transcription_service;
