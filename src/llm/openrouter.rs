//! OpenRouter API client
//!
//! Direct HTTP client for the OpenRouter chat completions endpoint
//! (OpenAI-compatible wire format).
//!
//! # Authentication
//!
//! Uses an OpenRouter API key (set via `OPENROUTER_API_KEY` or passed directly).
//!
//! ```ignore
//! // From environment variables
//! let llm = OpenRouterProvider::from_env()?;
//!
//! // With explicit settings
//! let llm = OpenRouterProvider::new("sk-or-...").with_model("google/gemini-2.0-flash-001");
//! ```

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use super::provider::CodeGenerationBackend;
use crate::agent::config::LlmSettings;
use crate::conversation::ChatHistory;

pub const DEFAULT_API_BASE: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "google/gemini-2.0-flash-001";
const DEFAULT_MAX_TOKENS: u32 = 8192;
const DEFAULT_TIMEOUT_SECS: u64 = 120;

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    include_reasoning: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[allow(dead_code)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

// ============================================================================
// Provider
// ============================================================================

/// OpenRouter chat completion backend
#[derive(Debug, Clone)]
pub struct OpenRouterProvider {
    client: Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    api_base: String,
    include_reasoning: bool,
}

impl OpenRouterProvider {
    /// Create a new OpenRouter provider from environment variables
    ///
    /// Reads from:
    /// - `OPENROUTER_API_KEY` (required)
    /// - `OPENROUTER_MODEL` (optional)
    /// - `OPENROUTER_BASE_URL` (optional)
    /// - `OPENROUTER_MAX_TOKENS` (optional, defaults to 8192)
    pub fn from_env() -> Result<Self> {
        tracing::info!("Creating OpenRouter provider from environment");

        let api_key = env::var("OPENROUTER_API_KEY")
            .context("OPENROUTER_API_KEY environment variable not set")?;
        let model = env::var("OPENROUTER_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let api_base =
            env::var("OPENROUTER_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        let max_tokens = env::var("OPENROUTER_MAX_TOKENS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);

        tracing::info!("Using model: {}", model);
        tracing::info!("Max tokens: {}", max_tokens);

        Ok(Self::new(api_key)
            .with_model(model)
            .with_base_url(api_base)
            .with_max_tokens(max_tokens))
    }

    /// Create a provider from loaded settings
    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .or_else(|| env::var("OPENROUTER_API_KEY").ok())
            .context("No OpenRouter API key configured (llm.api_key or OPENROUTER_API_KEY)")?;

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key,
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            api_base: settings.base_url.clone(),
            include_reasoning: settings.include_reasoning,
        })
    }

    /// Create a new OpenRouter provider with a specific API key
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            api_base: DEFAULT_API_BASE.to_string(),
            include_reasoning: false,
        }
    }

    /// Set the model to use
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the max tokens for responses
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Override the API base URL (e.g. a proxy or a test server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Ask OpenRouter to include reasoning tokens where the model supports it
    pub fn with_reasoning(mut self, include: bool) -> Self {
        self.include_reasoning = include;
        self
    }

    fn build_request<'a>(&'a self, history: &'a ChatHistory) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages: history
                .iter()
                .map(|m| WireMessage {
                    role: m.role().as_str(),
                    content: m.content(),
                })
                .collect(),
            max_tokens: self.max_tokens,
            include_reasoning: self.include_reasoning,
        }
    }

    /// Send a non-streaming request to the chat completions endpoint
    async fn send_request(&self, request: &ChatCompletionRequest<'_>) -> Result<ChatCompletionResponse> {
        let url = format!("{}/chat/completions", self.api_base);

        let request_json =
            serde_json::to_string(request).context("Failed to serialize OpenRouter request")?;
        tracing::debug!("[OpenRouter] Request JSON: {}", request_json);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .bearer_auth(&self.api_key)
            .body(request_json)
            .send()
            .await
            .context("Failed to send request to OpenRouter API")?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .context("Failed to read OpenRouter response body")?;

        tracing::debug!("[OpenRouter] Response status: {}", status);
        tracing::debug!("[OpenRouter] Response body: {}", response_text);

        if !status.is_success() {
            tracing::error!("[OpenRouter] API error: {} - {}", status, response_text);
            anyhow::bail!("OpenRouter API error ({}): {}", status, response_text);
        }

        serde_json::from_str(&response_text).context("Failed to parse OpenRouter API response")
    }
}

#[async_trait::async_trait]
impl CodeGenerationBackend for OpenRouterProvider {
    async fn completion(&self, history: &ChatHistory) -> Result<String> {
        tracing::info!("[OpenRouter] Sending {} messages", history.len());

        let request = self.build_request(history);
        let response = self.send_request(&request).await?;

        if let Some(error) = response.error {
            anyhow::bail!("OpenRouter returned an error: {}", error.message);
        }

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .context("OpenRouter response contained no message content")?;

        tracing::info!("[OpenRouter] Received response, length: {} chars", text.len());

        Ok(text)
    }

    fn model(&self) -> String {
        self.model.clone()
    }

    fn provider_name(&self) -> &str {
        "openrouter"
    }
}
