#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::Value;
use stock_ia_gateway::{
    config::AppConfig,
    routes::create_router,
    services::{
        engine::{EngineError, GenerationEngine, GenerationOptions},
        transcription_service::{Transcriber, TranscriptionError},
    },
    state::AppState,
};
use tower::ServiceExt;

pub const BOUNDARY: &str = "stock-gateway-test-boundary";

/// What the stub engine answers with.
#[derive(Clone)]
pub enum Scripted {
    Reply(String),
    Timeout,
    ServerError,
}

pub struct StubEngine {
    script: Scripted,
    pub prompts: Mutex<Vec<String>>,
}

impl StubEngine {
    pub fn replying(reply: &str) -> Arc<Self> {
        Self::scripted(Scripted::Reply(reply.to_string()))
    }

    pub fn scripted(script: Scripted) -> Arc<Self> {
        Arc::new(Self {
            script,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl GenerationEngine for StubEngine {
    fn model(&self) -> &str {
        "mistral"
    }

    async fn generate(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<String, EngineError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.script {
            Scripted::Reply(reply) => Ok(reply.clone()),
            Scripted::Timeout => Err(EngineError::Timeout(60)),
            Scripted::ServerError => Err(EngineError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "model crashed".to_string(),
            }),
        }
    }

    async fn model_available(&self) -> Result<bool, EngineError> {
        match self.script {
            Scripted::Reply(_) => Ok(true),
            Scripted::Timeout => Err(EngineError::Timeout(60)),
            Scripted::ServerError => Ok(false),
        }
    }
}

/// Records what it was asked to transcribe.
pub struct StubTranscriber {
    result: Result<String, String>,
    pub seen: Mutex<Vec<(PathBuf, String, Vec<u8>)>>,
}

impl StubTranscriber {
    pub fn ok(text: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(text.to_string()),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Err(message.to_string()),
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Transcriber for StubTranscriber {
    async fn transcribe(
        &self,
        audio: &Path,
        language: &str,
    ) -> Result<String, TranscriptionError> {
        let bytes = tokio::fs::read(audio).await.map_err(TranscriptionError::Output)?;
        self.seen
            .lock()
            .unwrap()
            .push((audio.to_path_buf(), language.to_string(), bytes));
        self.result
            .clone()
            .map_err(|message| TranscriptionError::Output(std::io::Error::other(message)))
    }
}

pub fn test_config() -> AppConfig {
    AppConfig::builtin().expect("built-in config")
}

pub fn app_with(
    config: AppConfig,
    engine: Arc<dyn GenerationEngine>,
    transcriber: Arc<dyn Transcriber>,
) -> Router {
    create_router(AppState {
        config: Arc::new(config),
        engine,
        transcriber,
    })
}

pub fn app(engine: Arc<dyn GenerationEngine>) -> Router {
    app_with(test_config(), engine, StubTranscriber::ok(""))
}

pub fn multipart_request(uri: &str, field: &str, file_name: &str, content: &[u8]) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .expect("multipart request")
}

pub fn json_request(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("json request")
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("response body")
        .to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}
