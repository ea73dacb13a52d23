//! Response generator adapter - Implements ResponseGeneratorPort using ai_core

use std::{fmt, sync::Arc, time::Instant};

use ai_core::{InferenceConfig, InferenceEngine, InferenceError, InferenceRequest, OpenAiChatEngine};
use application::{error::ApplicationError, ports::ResponseGeneratorPort};
use async_trait::async_trait;
use domain::TranscriptEntry;
use tracing::{debug, info, instrument, warn};

const SERVICE: &str = "response generator";

/// Writes the agent's reply with a chat-completions model
pub struct LlmResponseGenerator {
    engine: Arc<dyn InferenceEngine>,
    system_prompt: Option<String>,
    max_tokens: Option<u32>,
}

impl fmt::Debug for LlmResponseGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmResponseGenerator")
            .field("model", &self.engine.default_model())
            .field("system_prompt", &self.system_prompt.is_some())
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

impl LlmResponseGenerator {
    /// Wrap an existing engine
    pub fn new(engine: Arc<dyn InferenceEngine>) -> Self {
        Self {
            engine,
            system_prompt: None,
            max_tokens: None,
        }
    }

    /// Build the chat-completions engine from configuration
    pub fn from_config(config: InferenceConfig) -> Result<Self, ApplicationError> {
        let system_prompt = config.system_prompt.clone();
        let engine = OpenAiChatEngine::new(config)
            .map_err(|e| ApplicationError::Configuration(e.to_string()))?;

        let generator = Self::new(Arc::new(engine));
        Ok(match system_prompt {
            Some(prompt) => generator.with_system_prompt(prompt),
            None => generator,
        })
    }

    /// Set the system prompt sent before the conversation
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Override the engine's token limit
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    fn map_error(e: InferenceError) -> ApplicationError {
        match e {
            InferenceError::Timeout(ms) => ApplicationError::UpstreamTimeout {
                service: SERVICE,
                timeout_ms: ms,
            },
            InferenceError::RateLimited => ApplicationError::RateLimited,
            other => ApplicationError::upstream(SERVICE, other.to_string()),
        }
    }
}

#[async_trait]
impl ResponseGeneratorPort for LlmResponseGenerator {
    #[instrument(skip(self, transcript, recent), fields(transcript_len = transcript.len(), history = recent.len()))]
    async fn generate(
        &self,
        transcript: &str,
        recent: &[TranscriptEntry],
    ) -> Result<String, ApplicationError> {
        let start = Instant::now();

        let mut request =
            InferenceRequest::conversation(self.system_prompt.as_deref(), recent, transcript);
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        let response = self.engine.generate(request).await.map_err(|e| {
            warn!(error = %e, "Reply generation failed");
            Self::map_error(e)
        })?;

        let reply = response.content.trim();
        if reply.is_empty() {
            return Err(ApplicationError::upstream(SERVICE, "model returned an empty reply"));
        }

        if response.was_truncated() {
            debug!("Reply hit the token limit and will be shortened for speech");
        }

        info!(
            model = %response.model,
            reply_len = reply.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Generated reply"
        );

        Ok(reply.to_string())
    }

    async fn is_healthy(&self) -> bool {
        match self.engine.health_check().await {
            Ok(healthy) => healthy,
            Err(e) => {
                warn!(error = %e, "Response generator health check failed");
                false
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use ai_core::{InferenceResponse, TokenUsage};
    use mockall::{mock, predicate::function};

    use super::*;

    mock! {
        Engine {}

        #[async_trait]
        impl InferenceEngine for Engine {
            async fn generate(&self, request: InferenceRequest) -> Result<InferenceResponse, InferenceError>;
            async fn health_check(&self) -> Result<bool, InferenceError>;
            async fn list_models(&self) -> Result<Vec<String>, InferenceError>;
            fn default_model(&self) -> &str;
        }
    }

    fn reply(content: &str) -> InferenceResponse {
        InferenceResponse {
            content: content.to_string(),
            model: "test-model".to_string(),
            usage: Some(TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            finish_reason: Some("stop".to_string()),
        }
    }

    #[tokio::test]
    async fn builds_conversation_request() {
        let mut engine = MockEngine::new();
        engine
            .expect_generate()
            .with(function(|req: &InferenceRequest| {
                let roles: Vec<&str> = req.messages.iter().map(|m| m.role.as_str()).collect();
                roles == ["system", "user", "assistant", "user"]
                    && req.messages[3].content == "What are your hours?"
                    && req.max_tokens == Some(60)
            }))
            .times(1)
            .returning(|_| Ok(reply("  We're open nine to five.  ")));

        let generator = LlmResponseGenerator::new(Arc::new(engine))
            .with_system_prompt("Be brief")
            .with_max_tokens(60);
        let history = vec![
            TranscriptEntry::caller("Hello"),
            TranscriptEntry::agent("Hi, how can I help?"),
        ];

        let text = generator
            .generate("What are your hours?", &history)
            .await
            .unwrap();
        assert_eq!(text, "We're open nine to five.");
    }

    #[tokio::test]
    async fn empty_reply_is_upstream_error() {
        let mut engine = MockEngine::new();
        engine.expect_generate().returning(|_| Ok(reply("   ")));

        let generator = LlmResponseGenerator::new(Arc::new(engine));
        let err = generator.generate("Hi", &[]).await.unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::UpstreamError { service: SERVICE, .. }
        ));
    }

    #[tokio::test]
    async fn engine_timeout_maps_to_upstream_timeout() {
        let mut engine = MockEngine::new();
        engine
            .expect_generate()
            .returning(|_| Err(InferenceError::Timeout(3500)));

        let generator = LlmResponseGenerator::new(Arc::new(engine));
        let err = generator.generate("Hi", &[]).await.unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::UpstreamTimeout {
                service: SERVICE,
                timeout_ms: 3500
            }
        ));
    }

    #[tokio::test]
    async fn rate_limit_and_server_errors_map() {
        let mut engine = MockEngine::new();
        engine
            .expect_generate()
            .times(1)
            .returning(|_| Err(InferenceError::RateLimited));
        engine
            .expect_generate()
            .times(1)
            .returning(|_| Err(InferenceError::ServerError("Status 500".to_string())));

        let generator = LlmResponseGenerator::new(Arc::new(engine));
        assert!(matches!(
            generator.generate("Hi", &[]).await,
            Err(ApplicationError::RateLimited)
        ));
        assert!(matches!(
            generator.generate("Hi", &[]).await,
            Err(ApplicationError::UpstreamError { ref message, .. }) if message.contains("Status 500")
        ));
    }

    #[tokio::test]
    async fn health_reflects_engine() {
        let mut engine = MockEngine::new();
        engine.expect_health_check().times(1).returning(|| Ok(true));
        engine
            .expect_health_check()
            .times(1)
            .returning(|| Err(InferenceError::ConnectionFailed("refused".to_string())));

        let generator = LlmResponseGenerator::new(Arc::new(engine));
        assert!(generator.is_healthy().await);
        assert!(!generator.is_healthy().await);
    }

    #[test]
    fn from_config_applies_system_prompt() {
        let generator = LlmResponseGenerator::from_config(InferenceConfig::default()).unwrap();
        assert!(generator.system_prompt.is_some());

        let without = LlmResponseGenerator::from_config(InferenceConfig {
            system_prompt: None,
            ..Default::default()
        })
        .unwrap();
        assert!(without.system_prompt.is_none());
        assert!(format!("{without:?}").contains("gpt-4o-mini"));
    }
}
