use std::sync::Arc;

use crate::{
    config::AppConfig,
    services::{engine::GenerationEngine, transcription_service::Transcriber},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub engine: Arc<dyn GenerationEngine>,
    pub transcriber: Arc<dyn Transcriber>,
}
