//! Metric and notification sensors
//!
//! The agent's goal is phrased in terms of one named metric (followers,
//! likes, ...). A sensor reads its current value before and after a cycle and
//! reports what happened in the environment since the last look.

use std::collections::BTreeMap;
use std::sync::Mutex;

use anyhow::Result;

#[async_trait::async_trait]
pub trait MetricsSensor: Send + Sync {
    /// Current value of `metric_name`; unsupported names are an error
    async fn metric(&self, metric_name: &str) -> Result<i64>;

    /// Notifications received since the previous call
    async fn notifications(&self) -> Result<Vec<String>>;
}

/// Sensor with fixed metric values and a queue of notifications
#[derive(Debug)]
pub struct StaticMetricsSensor {
    metrics: BTreeMap<String, i64>,
    pending: Mutex<Vec<String>>,
}

impl StaticMetricsSensor {
    pub fn new(metrics: impl IntoIterator<Item = (String, i64)>) -> Self {
        Self {
            metrics: metrics.into_iter().collect(),
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn with_metric(mut self, name: impl Into<String>, value: i64) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }

    /// Queue a notification for the next `notifications` call
    pub fn push_notification(&self, notification: impl Into<String>) -> Result<()> {
        let mut pending = self.pending.lock().map_err(|_| Self::poisoned())?;
        pending.push(notification.into());
        Ok(())
    }

    fn poisoned() -> anyhow::Error {
        anyhow::anyhow!("notification queue poisoned")
    }
}

impl Default for StaticMetricsSensor {
    fn default() -> Self {
        Self::new([("followers".to_string(), 1000), ("likes".to_string(), 4000)])
    }
}

#[async_trait::async_trait]
impl MetricsSensor for StaticMetricsSensor {
    async fn metric(&self, metric_name: &str) -> Result<i64> {
        tracing::debug!("[Sensor] Reading {}", metric_name);
        self.metrics
            .get(metric_name)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("Unsupported metric: {}", metric_name))
    }

    async fn notifications(&self) -> Result<Vec<String>> {
        let mut pending = self
            .pending
            .lock()
            .map_err(|_| Self::poisoned())?;
        Ok(std::mem::take(&mut *pending))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_metrics() {
        let sensor = StaticMetricsSensor::default();
        assert_eq!(sensor.metric("followers").await.unwrap(), 1000);
        assert_eq!(sensor.metric("likes").await.unwrap(), 4000);
    }

    #[tokio::test]
    async fn test_unsupported_metric() {
        let err = StaticMetricsSensor::default().metric("retweets").await.unwrap_err();
        assert_eq!(err.to_string(), "Unsupported metric: retweets");
    }

    #[tokio::test]
    async fn test_notifications_are_drained() {
        let sensor = StaticMetricsSensor::default();
        sensor.push_notification("@buyer asked about the laptop deal").unwrap();

        assert_eq!(sensor.notifications().await.unwrap().len(), 1);
        assert!(sensor.notifications().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_poisoned_queue_is_an_error() {
        let sensor = std::sync::Arc::new(StaticMetricsSensor::default());
        let holder = sensor.clone();
        let panicked = std::thread::spawn(move || {
            let _guard = holder.pending.lock().unwrap();
            panic!("sensor thread died");
        })
        .join();
        assert!(panicked.is_err());

        let err = sensor.push_notification("@fan: lost?").unwrap_err();
        assert_eq!(err.to_string(), "notification queue poisoned");
        assert!(sensor.notifications().await.is_err());
    }
}
