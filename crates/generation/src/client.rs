//! OpenAI-chat-compatible generation client.
//!
//! One bounded-timeout call per request with clamped sampling parameters and
//! streaming disabled. Any transport, status, or shape failure surfaces as
//! `AppError::Generation` and aborts the pipeline.

use async_trait::async_trait;
use citegate_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::{ChatMessage, Completion, SamplingParams, TokenUsage};

/// Hard upper bound on a generation call. Wider than retrieval to absorb
/// generation latency variance.
pub const GENERATION_TIMEOUT: Duration = Duration::from_secs(120);

/// Fixed nucleus sampling value sent with every request.
const TOP_P: f64 = 0.9;

/// Wire request in the OpenAI chat completions format.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    top_p: f64,
    max_tokens: u32,
    stream: bool,
}

/// Wire response from the backend.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,

    #[serde(default)]
    usage: TokenUsage,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Trait for generation backends.
///
/// Abstracts the completion service behind a request/response contract so
/// the pipeline can be exercised against deterministic implementations in
/// tests.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Run one non-streaming completion over a full message sequence.
    ///
    /// Implementations clamp `params` before sending; callers never need to
    /// pre-validate.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
        params: SamplingParams,
    ) -> AppResult<Completion>;
}

/// HTTP client for an OpenAI-chat-compatible backend.
pub struct OpenAiCompatClient {
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiCompatClient {
    /// Create a client for a generation backend base URL.
    pub fn new(base_url: impl Into<String>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(GENERATION_TIMEOUT)
            .build()
            .map_err(|e| AppError::Generation(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }
}

#[async_trait]
impl Generator for OpenAiCompatClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
        params: SamplingParams,
    ) -> AppResult<Completion> {
        let params = params.clamped();
        let payload = ChatCompletionRequest {
            model,
            messages,
            temperature: params.temperature,
            top_p: TOP_P,
            max_tokens: params.max_tokens,
            stream: false,
        };

        let url = format!("{}/v1/chat/completions", self.base_url);
        tracing::debug!(
            url = %url,
            model = model,
            temperature = params.temperature,
            max_tokens = params.max_tokens,
            "Calling generation backend"
        );

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Generation(format!("Request to backend failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Generation(format!(
                "Backend returned {}: {}",
                status, body
            )));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::Generation(format!("Failed to parse backend response: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                AppError::Generation("Backend response contained no choices".to_string())
            })?;

        tracing::debug!(
            prompt_tokens = parsed.usage.prompt_tokens,
            completion_tokens = parsed.usage.completion_tokens,
            "Generation complete"
        );

        Ok(Completion {
            content,
            usage: parsed.usage,
        })
    }
}
