//! Adapter tests against mocked provider APIs
//!
//! These tests run the real HTTP clients behind the application ports, so
//! they cover the full path from port call to provider request.

use ai_core::InferenceConfig;
use ai_speech::SpeechConfig;
use application::{
    ApplicationError, ClipStorePort, ResponseGeneratorPort, SpeechSynthesizerPort,
};
use domain::TranscriptEntry;
use infrastructure::{InMemoryClipStore, LlmResponseGenerator, TtsSpeechSynthesizer};
use secrecy::SecretString;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path},
};

fn inference_config(uri: &str) -> InferenceConfig {
    InferenceConfig {
        base_url: format!("{uri}/v1"),
        api_key: Some(SecretString::from("sk-test")),
        timeout_ms: 1000,
        system_prompt: Some("You answer phone calls.".to_string()),
        ..Default::default()
    }
}

fn speech_config(uri: &str) -> SpeechConfig {
    SpeechConfig {
        base_url: format!("{uri}/v1"),
        api_key: Some(SecretString::from("xi-test")),
        timeout_ms: 1000,
        ..Default::default()
    }
}

fn completion(content: &str) -> serde_json::Value {
    serde_json::json!({
        "model": "gpt-4o-mini",
        "choices": [{"message": {"role": "assistant", "content": content}, "finish_reason": "stop"}]
    })
}

#[tokio::test]
async fn generator_sends_system_prompt_history_and_transcript() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(serde_json::json!({
            "messages": [
                {"role": "system", "content": "You answer phone calls."},
                {"role": "user", "content": "Hi"},
                {"role": "assistant", "content": "Hello! How can I help?"},
                {"role": "user", "content": "What are your hours?"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("We're open nine to five.")))
        .expect(1)
        .mount(&server)
        .await;

    let generator = LlmResponseGenerator::from_config(inference_config(&server.uri())).unwrap();
    let history = vec![
        TranscriptEntry::caller("Hi"),
        TranscriptEntry::agent("Hello! How can I help?"),
    ];

    let reply = generator
        .generate("What are your hours?", &history)
        .await
        .unwrap();
    assert_eq!(reply, "We're open nine to five.");
}

#[tokio::test]
async fn generator_timeout_surfaces_as_upstream_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("too late"))
                .set_delay(std::time::Duration::from_millis(1500)),
        )
        .mount(&server)
        .await;

    let generator = LlmResponseGenerator::from_config(inference_config(&server.uri())).unwrap();
    let err = generator.generate("Hello?", &[]).await.unwrap_err();
    assert!(matches!(
        err,
        ApplicationError::UpstreamTimeout {
            timeout_ms: 1000,
            ..
        }
    ));
}

#[tokio::test]
async fn generator_health_follows_models_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
        .mount(&server)
        .await;

    let generator = LlmResponseGenerator::from_config(inference_config(&server.uri())).unwrap();
    assert!(generator.is_healthy().await);
}

#[tokio::test]
async fn synthesized_audio_round_trips_through_clip_store() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/text-to-speech/WLjZnm4PkNmYtNCyiCq8"))
        .and(header("xi-api-key", "xi-test"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"b1".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let synthesizer = TtsSpeechSynthesizer::from_config(speech_config(&server.uri())).unwrap();
    let clips = InMemoryClipStore::default();

    let audio = synthesizer.synthesize("We're open nine to five.").await.unwrap();
    let id = clips.register(audio);

    let fetched = clips.fetch(&id).unwrap();
    assert_eq!(fetched.data.as_ref(), b"b1");
    assert_eq!(fetched.content_type, "audio/mpeg");
}

#[tokio::test]
async fn synthesizer_rate_limit_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(
            serde_json::json!({"detail": {"status": "too_many_concurrent_requests", "message": "Busy"}}),
        ))
        .mount(&server)
        .await;

    let synthesizer = TtsSpeechSynthesizer::from_config(speech_config(&server.uri())).unwrap();
    assert!(matches!(
        synthesizer.synthesize("Hello").await,
        Err(ApplicationError::RateLimited)
    ));
}

#[tokio::test]
async fn synthesizer_without_key_never_calls_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1]))
        .expect(0)
        .mount(&server)
        .await;

    let config = SpeechConfig {
        api_key: None,
        ..speech_config(&server.uri())
    };
    let synthesizer = TtsSpeechSynthesizer::from_config(config).unwrap();
    assert!(synthesizer.synthesize("Hello").await.is_err());
    assert!(!synthesizer.is_available().await);
}
