use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;
use tokio::process::Command;

use crate::{
    config::{SpeechBackend, SpeechConfig},
    dto::{transcription::TranscriptionResponse, upload::UploadedFile},
    error::{AppError, AppResult},
    state::AppState,
};

const DEFAULT_AUDIO_EXTENSION: &str = "m4a";

#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("transcript not readable: {0}")]
    Output(#[source] std::io::Error),

    #[error("transcription request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("transcription service returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("transcription service reply has no transcript: {0}")]
    InvalidReply(String),

    #[error("transcription timed out after {0} seconds")]
    Timeout(u64),
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Path, language: &str)
    -> Result<String, TranscriptionError>;
}

/// Runs the local `whisper` command line tool.
pub struct WhisperCli {
    program: String,
    model: String,
    timeout: Duration,
}

impl WhisperCli {
    pub fn new(program: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            model: model.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Transcriber for WhisperCli {
    async fn transcribe(
        &self,
        audio: &Path,
        language: &str,
    ) -> Result<String, TranscriptionError> {
        let output_dir = tempfile::tempdir().map_err(TranscriptionError::Output)?;

        let run = Command::new(&self.program)
            .arg(audio)
            .args(["--model", &self.model, "--language", language])
            .args(["--output_format", "txt", "--output_dir"])
            .arg(output_dir.path())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| TranscriptionError::Timeout(self.timeout.as_secs()))?
            .map_err(|source| TranscriptionError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(TranscriptionError::Failed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let transcript = transcript_path(output_dir.path(), audio);
        let text = tokio::fs::read_to_string(&transcript)
            .await
            .map_err(TranscriptionError::Output)?;
        Ok(text.trim().to_string())
    }
}

/// `whisper` names its output after the input file stem.
fn transcript_path(output_dir: &Path, audio: &Path) -> PathBuf {
    let stem = audio.file_stem().unwrap_or(audio.as_os_str());
    output_dir.join(format!("{}.txt", stem.to_string_lossy()))
}

/// Posts the audio to an OpenAI-compatible `/audio/transcriptions` endpoint.
pub struct WhisperHttp {
    http: reqwest::Client,
    url: Url,
    model: String,
    timeout_secs: u64,
}

impl WhisperHttp {
    pub fn new(
        url: Url,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TranscriptionError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url,
            model: model.into(),
            timeout_secs: timeout.as_secs(),
        })
    }

    fn classify(&self, err: reqwest::Error) -> TranscriptionError {
        if err.is_timeout() {
            TranscriptionError::Timeout(self.timeout_secs)
        } else {
            TranscriptionError::Request(err)
        }
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionReply {
    text: String,
}

#[async_trait]
impl Transcriber for WhisperHttp {
    async fn transcribe(
        &self,
        audio: &Path,
        language: &str,
    ) -> Result<String, TranscriptionError> {
        let bytes = tokio::fs::read(audio)
            .await
            .map_err(TranscriptionError::Output)?;
        let file_name = audio
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("audio.{DEFAULT_AUDIO_EXTENSION}"));

        let form = reqwest::multipart::Form::new()
            .text("model", self.model.clone())
            .text("language", language.to_string())
            .part("file", reqwest::multipart::Part::bytes(bytes).file_name(file_name));

        let response = self
            .http
            .post(self.url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|err| self.classify(err))?;

        let status = response.status();
        let body = response.text().await.map_err(|err| self.classify(err))?;
        if !status.is_success() {
            return Err(TranscriptionError::Status { status, body });
        }

        let reply: TranscriptionReply = serde_json::from_str(&body)
            .map_err(|err| TranscriptionError::InvalidReply(format!("{err}; body: {body}")))?;
        Ok(reply.text.trim().to_string())
    }
}

pub fn build_transcriber(config: &SpeechConfig) -> Result<Arc<dyn Transcriber>, TranscriptionError> {
    Ok(match &config.backend {
        SpeechBackend::Command { program } => {
            Arc::new(WhisperCli::new(program, &config.model, config.timeout))
        }
        SpeechBackend::Http { url } => {
            Arc::new(WhisperHttp::new(url.clone(), &config.model, config.timeout)?)
        }
    })
}

/// Saves the uploaded audio to a temporary file and transcribes it.
pub async fn transcribe_upload(
    state: &AppState,
    upload: UploadedFile,
) -> AppResult<TranscriptionResponse> {
    let extension = upload
        .extension()
        .unwrap_or_else(|| DEFAULT_AUDIO_EXTENSION.to_string());

    let audio = tempfile::Builder::new()
        .prefix("audio-")
        .suffix(&format!(".{extension}"))
        .tempfile()
        .map_err(AppError::AudioStorage)?;
    tokio::fs::write(audio.path(), &upload.bytes)
        .await
        .map_err(AppError::AudioStorage)?;

    tracing::debug!(
        path = %audio.path().display(),
        bytes = upload.bytes.len(),
        "audio saved for transcription"
    );

    let text = state
        .transcriber
        .transcribe(audio.path(), &state.config.speech.language)
        .await?;

    tracing::info!(chars = text.chars().count(), "audio transcribed");
    Ok(TranscriptionResponse { text })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_is_named_after_audio_stem() {
        let path = transcript_path(Path::new("/tmp/out"), Path::new("/tmp/audio-x1.m4a"));
        assert_eq!(path, PathBuf::from("/tmp/out/audio-x1.txt"));

        let dotted = transcript_path(Path::new("/tmp/out"), Path::new("/tmp/nota.voz.m4a"));
        assert_eq!(dotted, PathBuf::from("/tmp/out/nota.voz.txt"));
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let cli = WhisperCli::new("definitely-not-a-whisper-binary", "base", Duration::from_secs(5));
        let err = cli
            .transcribe(Path::new("/tmp/nothing.m4a"), "es")
            .await
            .unwrap_err();
        assert!(matches!(err, TranscriptionError::Spawn { .. }));
    }
}
