//! Code-generation backend trait
//!
//! Abstracts the LLM interface so that different providers (OpenRouter, a
//! scripted stub in tests, ...) can drive the agent interchangeably.

use anyhow::Result;

use super::extract::extract_code_blocks;
use crate::conversation::ChatHistory;

/// Trait for LLM backends that can be used with `AffiliatePromoterAgent`.
#[async_trait::async_trait]
pub trait CodeGenerationBackend: Send + Sync {
    /// Plain chat completion over the full history.
    async fn completion(&self, history: &ChatHistory) -> Result<String>;

    /// Completion followed by code extraction.
    ///
    /// Returns every fenced code block found (in order) together with the
    /// raw reply. Fails when the reply holds no code.
    async fn generate_code(&self, history: &ChatHistory) -> Result<(Vec<String>, String)> {
        let raw = self.completion(history).await?;
        let codes = extract_code_blocks(&raw);

        if codes.is_empty() {
            anyhow::bail!("No code block found in response: {}", raw);
        }

        Ok((codes, raw))
    }

    /// Get the current model name.
    fn model(&self) -> String;

    /// Get the provider name (e.g., "openrouter").
    fn provider_name(&self) -> &str;
}
