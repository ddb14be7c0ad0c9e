//! Client for the locally hosted generation engine (Ollama).

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::EngineConfig;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("generation engine timed out after {0} seconds")]
    Timeout(u64),

    #[error("generation engine unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("generation engine returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("generation engine sent an unreadable response: {0}")]
    InvalidEnvelope(#[source] reqwest::Error),

    #[error("invalid engine endpoint: {0}")]
    Endpoint(String),
}

/// Sampling options forwarded verbatim as Ollama `options`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub num_predict: u32,
    pub top_p: f32,
    pub top_k: u32,
    pub repeat_penalty: f32,
    pub stop: Vec<String>,
}

impl GenerationOptions {
    fn precise(num_predict: u32) -> Self {
        Self {
            temperature: 0.05,
            num_predict,
            top_p: 0.9,
            top_k: 40,
            repeat_penalty: 1.1,
            stop: ["```", "---", "###"].into_iter().map(String::from).collect(),
        }
    }

    pub fn document() -> Self {
        Self::precise(3000)
    }

    pub fn voice() -> Self {
        Self::precise(2000)
    }
}

#[async_trait]
pub trait GenerationEngine: Send + Sync {
    /// Name of the model every prompt is sent to.
    fn model(&self) -> &str;

    async fn generate(&self, prompt: &str, options: &GenerationOptions)
    -> Result<String, EngineError>;

    /// Whether the engine is reachable and has the configured model pulled.
    async fn model_available(&self) -> Result<bool, EngineError>;
}

pub struct OllamaEngine {
    http: reqwest::Client,
    generate_url: Url,
    tags_url: Url,
    model: String,
    timeout_secs: u64,
}

impl OllamaEngine {
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| EngineError::Endpoint(err.to_string()))?;
        let tags_url = config
            .url
            .join("/api/tags")
            .map_err(|err| EngineError::Endpoint(err.to_string()))?;

        Ok(Self {
            http,
            generate_url: config.url.clone(),
            tags_url,
            model: config.model.clone(),
            timeout_secs: config.timeout.as_secs(),
        })
    }

    fn classify(&self, err: reqwest::Error) -> EngineError {
        if err.is_timeout() {
            EngineError::Timeout(self.timeout_secs)
        } else if err.is_decode() {
            EngineError::InvalidEnvelope(err)
        } else {
            EngineError::Unreachable(err)
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: &'a GenerationOptions,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    total_duration: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

#[async_trait]
impl GenerationEngine for OllamaEngine {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, EngineError> {
        let payload = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options,
        };

        tracing::debug!(
            url = %self.generate_url,
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "sending prompt to engine"
        );

        let response = self
            .http
            .post(self.generate_url.clone())
            .json(&payload)
            .send()
            .await
            .map_err(|err| self.classify(err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Status { status, body });
        }

        let data: GenerateResponse = response.json().await.map_err(|err| self.classify(err))?;
        tracing::info!(
            reply_chars = data.response.chars().count(),
            total_duration_ns = data.total_duration,
            "engine reply received"
        );
        Ok(data.response)
    }

    async fn model_available(&self) -> Result<bool, EngineError> {
        let response = self
            .http
            .get(self.tags_url.clone())
            .send()
            .await
            .map_err(|err| self.classify(err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Status { status, body });
        }

        let tags: TagsResponse = response.json().await.map_err(|err| self.classify(err))?;
        let base = self.model.split(':').next().unwrap_or(&self.model);
        Ok(tags
            .models
            .iter()
            .any(|tag| tag.name == self.model || tag.name.starts_with(base)))
    }
}
