//! Chat-completions client implementation

use std::{fmt, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::InferenceConfig;
use crate::error::InferenceError;
use crate::ports::{
    InferenceEngine, InferenceMessage, InferenceRequest, InferenceResponse, TokenUsage,
};

/// Inference engine speaking the OpenAI chat-completions protocol
pub struct OpenAiChatEngine {
    client: Client,
    config: InferenceConfig,
}

impl fmt::Debug for OpenAiChatEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiChatEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OpenAiChatEngine {
    /// Create a new chat engine
    pub fn new(config: InferenceConfig) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| InferenceError::ConnectionFailed(e.to_string()))?;

        info!(
            base_url = %config.base_url,
            model = %config.default_model,
            "Initialized chat-completions engine"
        );

        Ok(Self { client, config })
    }

    pub const fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Build the API URL for a given endpoint
    fn api_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.config.api_key_str() {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    /// Get the model to use for a request
    fn resolve_model<'a>(&'a self, request: &'a InferenceRequest) -> &'a str {
        request
            .model
            .as_deref()
            .unwrap_or(&self.config.default_model)
    }
}

/// Map a non-success response to an error, preferring the API's message
async fn error_from_response(
    response: reqwest::Response,
    model: &str,
) -> InferenceError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);

    warn!(status = %status, error = %message, "Chat completion request failed");

    match status {
        StatusCode::TOO_MANY_REQUESTS => InferenceError::RateLimited,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            InferenceError::Unauthorized(message)
        },
        StatusCode::NOT_FOUND => InferenceError::ModelNotAvailable(model.to_string()),
        _ => InferenceError::ServerError(format!("Status {status}: {message}")),
    }
}

/// Chat-completions request body
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [InferenceMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    model: String,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[async_trait]
impl InferenceEngine for OpenAiChatEngine {
    #[instrument(skip(self, request), fields(model = %self.resolve_model(&request), messages = request.messages.len()))]
    async fn generate(&self, request: InferenceRequest) -> Result<InferenceResponse, InferenceError> {
        let model = self.resolve_model(&request).to_string();

        let body = ChatCompletionRequest {
            model: &model,
            messages: &request.messages,
            max_tokens: request.max_tokens.unwrap_or(self.config.max_tokens),
            temperature: request.temperature.unwrap_or(self.config.temperature),
        };

        debug!("Sending chat completion request");

        let response = self
            .authorize(self.client.post(self.api_url("chat/completions")))
            .json(&body)
            .send()
            .await
            .map_err(|e| InferenceError::from_transport(&e, self.config.timeout_ms))?;

        if !response.status().is_success() {
            return Err(error_from_response(response, &model).await);
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::InvalidResponse(e.to_string()))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| InferenceError::InvalidResponse("response has no choices".to_string()))?;

        let usage = completion.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        debug!(tokens = ?usage, finish_reason = ?choice.finish_reason, "Chat completion finished");

        Ok(InferenceResponse {
            content: choice.message.content.unwrap_or_default(),
            model: completion.model,
            usage,
            finish_reason: choice.finish_reason,
        })
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<bool, InferenceError> {
        let response = self
            .authorize(self.client.get(self.api_url("models")))
            .timeout(Duration::from_secs(5))
            .send()
            .await;

        match response {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(e) if e.is_timeout() || e.is_connect() => Ok(false),
            Err(e) => Err(InferenceError::RequestFailed(e.to_string())),
        }
    }

    #[instrument(skip(self))]
    async fn list_models(&self) -> Result<Vec<String>, InferenceError> {
        let response = self
            .authorize(self.client.get(self.api_url("models")))
            .send()
            .await
            .map_err(|e| InferenceError::from_transport(&e, self.config.timeout_ms))?;

        if !response.status().is_success() {
            let model = self.config.default_model.clone();
            return Err(error_from_response(response, &model).await);
        }

        let models: ModelsResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::InvalidResponse(e.to_string()))?;

        Ok(models.data.into_iter().map(|m| m.id).collect())
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }
}
