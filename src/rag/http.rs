//! HTTP retrieval client

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{build_save_payload, RetrievalClient, ScoredStrategy, StrategyData};
use crate::agent::config::RetrievalSettings;

#[derive(Debug, Serialize)]
struct RelevantStrategyRequest<'a> {
    query: &'a str,
    agent_id: &'a str,
    session_id: &'a str,
    top_k: usize,
}

#[derive(Debug, Deserialize)]
struct SaveResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
}

/// Client for the strategy retrieval service.
///
/// - `POST {base}/relevant_strategy_raw_v4` -> `[{"strategy": {..}, "score": f}]`
/// - `POST {base}/save_result_v4` with the batch payload
#[derive(Debug, Clone)]
pub struct HttpRetrievalClient {
    client: Client,
    base_url: String,
    agent_id: String,
    session_id: String,
    top_k: usize,
}

impl HttpRetrievalClient {
    pub fn new(
        base_url: impl Into<String>,
        agent_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            agent_id: agent_id.into(),
            session_id: session_id.into(),
            top_k: 5,
        }
    }

    /// Build from settings; `None` when no service URL is configured
    pub fn from_settings(
        settings: &RetrievalSettings,
        agent_id: &str,
        session_id: &str,
    ) -> Result<Option<Self>> {
        let Some(ref base_url) = settings.base_url else {
            return Ok(None);
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Some(Self {
            client,
            ..Self::new(base_url.as_str(), agent_id, session_id).with_top_k(settings.top_k)
        }))
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
}

#[async_trait::async_trait]
impl RetrievalClient for HttpRetrievalClient {
    async fn relevant_strategies(&self, query: &str) -> Result<Vec<ScoredStrategy>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/relevant_strategy_raw_v4", self.base_url);
        let request = RelevantStrategyRequest {
            query,
            agent_id: &self.agent_id,
            session_id: &self.session_id,
            top_k: self.top_k,
        };

        tracing::debug!("[Retrieval] Querying {} (top {})", url, self.top_k);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to reach retrieval service")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Retrieval service error ({}): {}", status, body);
        }

        let strategies: Vec<ScoredStrategy> = response
            .json()
            .await
            .context("Failed to parse retrieval response")?;

        tracing::info!("[Retrieval] {} relevant strategies", strategies.len());
        Ok(strategies)
    }

    async fn save_result_batch(&self, batch: &[StrategyData]) -> Result<usize> {
        let payload = build_save_payload(&self.agent_id, &self.session_id, batch);
        if payload.is_empty() {
            tracing::debug!("[Retrieval] Nothing to save");
            return Ok(0);
        }

        let url = format!("{}/save_result_v4", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .context("Failed to reach retrieval service")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Retrieval save failed ({}): {}", status, body);
        }

        let ack: SaveResponse = response
            .json()
            .await
            .context("Failed to parse retrieval save response")?;
        tracing::info!(
            "[Retrieval] Saved {} strategies ({}: {})",
            payload.len(),
            ack.status,
            ack.message
        );

        Ok(payload.len())
    }
}
