mod common;

use common::{StubEngine, StubTranscriber, app_with, multipart_request, send, test_config};
use serde_json::json;

#[tokio::test]
async fn audio_is_saved_and_transcribed_in_spanish() {
    let transcriber = StubTranscriber::ok("quiero dos cachafaz");
    let router = app_with(test_config(), StubEngine::replying("[]"), transcriber.clone());

    let (status, body) = send(
        router,
        multipart_request("/transcribir-audio", "file", "grabacion.m4a", b"fake-m4a-bytes"),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body, json!({"text": "quiero dos cachafaz"}));

    let seen = transcriber.seen.lock().unwrap();
    let (path, language, bytes) = &seen[0];
    assert_eq!(language, "es");
    assert_eq!(bytes, b"fake-m4a-bytes");
    assert_eq!(path.extension().unwrap(), "m4a");
    assert!(!path.exists(), "temporary audio file should be removed");
}

#[tokio::test]
async fn missing_audio_is_rejected() {
    let transcriber = StubTranscriber::ok("");
    let router = app_with(test_config(), StubEngine::replying("[]"), transcriber.clone());

    let (status, body) = send(
        router,
        multipart_request("/transcribir-audio", "audio", "grabacion.m4a", b"bytes"),
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(body, json!({"error": "No se envió archivo"}));
    assert!(transcriber.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn transcription_failure_is_a_server_error_with_details() {
    let router = app_with(
        test_config(),
        StubEngine::replying("[]"),
        StubTranscriber::failing("whisper model not found"),
    );

    let (status, body) = send(
        router,
        multipart_request("/transcribir-audio", "file", "grabacion.wav", b"RIFF"),
    )
    .await;

    assert_eq!(status, 500);
    assert_eq!(body["error"], "Error transcribiendo audio");
    assert!(body["details"].as_str().unwrap().contains("whisper model not found"));
}
