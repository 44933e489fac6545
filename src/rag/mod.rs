//! Strategy retrieval
//!
//! Past strategies are stored keyed by the notification that prompted them,
//! so the next cycle can look up how similar situations were handled.

mod http;

pub use http::HttpRetrievalClient;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Parameter key holding the notification a strategy responded to
pub const NOTIFICATION_PARAM: &str = "notif_str";

/// A strategy the agent carried out, and what came of it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyData {
    pub strategy_id: String,
    pub agent_id: String,
    pub summarized_desc: String,
    #[serde(default)]
    pub full_desc: String,
    pub created_at: DateTime<Utc>,
    /// Free-form run parameters; older records store them JSON-encoded
    #[serde(default)]
    pub parameters: Value,
    #[serde(default)]
    pub strategy_result: String,
}

impl StrategyData {
    pub fn new(
        agent_id: impl Into<String>,
        summarized_desc: impl Into<String>,
        full_desc: impl Into<String>,
    ) -> Self {
        Self {
            strategy_id: uuid::Uuid::new_v4().to_string(),
            agent_id: agent_id.into(),
            summarized_desc: summarized_desc.into(),
            full_desc: full_desc.into(),
            created_at: Utc::now(),
            parameters: Value::Object(Map::new()),
            strategy_result: String::new(),
        }
    }

    pub fn with_notification(mut self, notification: impl Into<String>) -> Self {
        let mut params = self.parameter_map();
        params.insert(NOTIFICATION_PARAM.to_string(), Value::String(notification.into()));
        self.parameters = Value::Object(params);
        self
    }

    pub fn with_result(mut self, result: impl Into<String>) -> Self {
        self.strategy_result = result.into();
        self
    }

    /// Parameters as an object, decoding JSON-encoded (even doubly encoded) strings
    pub fn parameter_map(&self) -> Map<String, Value> {
        let mut value = self.parameters.clone();
        for _ in 0..2 {
            match value {
                Value::String(ref raw) => match serde_json::from_str(raw) {
                    Ok(decoded) => value = decoded,
                    Err(_) => return Map::new(),
                },
                _ => break,
            }
        }
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    /// Notification this strategy responded to, if recorded
    pub fn notification(&self) -> Option<String> {
        self.parameter_map()
            .get(NOTIFICATION_PARAM)
            .and_then(|v| v.as_str().map(str::to_string))
    }
}

/// A stored strategy with its similarity to the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredStrategy {
    pub strategy: StrategyData,
    pub score: f64,
}

/// Store and look up past strategies
#[async_trait::async_trait]
pub trait RetrievalClient: Send + Sync {
    /// Strategies relevant to `query`, best first
    async fn relevant_strategies(&self, query: &str) -> Result<Vec<ScoredStrategy>>;

    /// Save a batch; returns how many records were accepted
    async fn save_result_batch(&self, batch: &[StrategyData]) -> Result<usize>;
}

/// Request body for a batch save.
///
/// Strategies without a recorded notification cannot be keyed and are skipped.
pub fn build_save_payload(agent_id: &str, session_id: &str, batch: &[StrategyData]) -> Vec<Value> {
    batch
        .iter()
        .filter_map(|data| {
            let Some(notification) = data.notification() else {
                tracing::warn!(
                    "[Retrieval] Strategy {} has no {} parameter, skipping",
                    data.strategy_id,
                    NOTIFICATION_PARAM
                );
                return None;
            };
            let strategy_data = serde_json::to_string(data).ok()?;

            Some(json!({
                "notification_key": notification,
                "strategy_data": strategy_data,
                "reference_id": data.strategy_id,
                "agent_id": agent_id,
                "session_id": session_id,
                "created_at": data.created_at.to_rfc3339(),
            }))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_skips_strategies_without_notification() {
        let keyed = StrategyData::new("agent-1", "Post deals at noon", "").with_notification("likes up");
        let unkeyed = StrategyData::new("agent-1", "Post memes", "");

        let payload = build_save_payload("agent-1", "session-9", &[keyed.clone(), unkeyed]);
        assert_eq!(payload.len(), 1);

        let record = &payload[0];
        assert_eq!(record["notification_key"], "likes up");
        assert_eq!(record["reference_id"], keyed.strategy_id.as_str());
        assert_eq!(record["session_id"], "session-9");

        let embedded: StrategyData =
            serde_json::from_str(record["strategy_data"].as_str().unwrap()).unwrap();
        assert_eq!(embedded, keyed);
    }

    #[test]
    fn test_encoded_parameters_are_decoded() {
        let mut data = StrategyData::new("agent-1", "s", "");
        let inner = r#"{"notif_str": "follower spike"}"#;
        data.parameters = Value::String(serde_json::to_string(inner).unwrap());
        assert_eq!(data.notification().as_deref(), Some("follower spike"));

        data.parameters = Value::String("not json".into());
        assert!(data.notification().is_none());
    }
}
