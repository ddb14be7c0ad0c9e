pub mod interpret;
pub mod upload;
pub mod transcription;
