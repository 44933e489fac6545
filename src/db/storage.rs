//! JSONL file storage
//!
//! Layout under the base directory:
//!
//! ```text
//! sessions/<session_id>/history.jsonl   one message per line
//! strategies/<agent_id>.jsonl           one strategy per line, oldest first
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::PersistenceClient;
use crate::conversation::{ChatHistory, Message};
use crate::rag::StrategyData;

const SESSIONS_DIR: &str = "sessions";
const STRATEGIES_DIR: &str = "strategies";

/// Append-only JSONL store
#[derive(Debug, Clone)]
pub struct JsonlStore {
    base_dir: PathBuf,
}

impl JsonlStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn history_path(&self, session_id: &str) -> PathBuf {
        self.base_dir
            .join(SESSIONS_DIR)
            .join(session_id)
            .join("history.jsonl")
    }

    pub fn strategies_path(&self, agent_id: &str) -> PathBuf {
        self.base_dir
            .join(STRATEGIES_DIR)
            .join(format!("{}.jsonl", agent_id))
    }

    /// Load a session transcript; empty when the session has none yet
    pub fn load_history(&self, session_id: &str) -> Result<ChatHistory> {
        read_jsonl::<Message>(&self.history_path(session_id)).map(ChatHistory::from)
    }

    /// All strategies recorded for `agent_id`, oldest first
    pub fn load_strategies(&self, agent_id: &str) -> Result<Vec<StrategyData>> {
        read_jsonl(&self.strategies_path(agent_id))
    }
}

#[async_trait::async_trait]
impl PersistenceClient for JsonlStore {
    async fn insert_chat_history(&self, session_id: &str, history: &ChatHistory) -> Result<()> {
        let path = self.history_path(session_id);
        let mut writer = open_append(&path)?;
        for message in history {
            writeln!(writer, "{}", serde_json::to_string(message)?)?;
        }
        writer.flush()?;

        tracing::debug!(
            "[Storage] Appended {} messages to {:?}",
            history.len(),
            path
        );
        Ok(())
    }

    async fn insert_strategy_and_result(&self, strategy: &StrategyData) -> Result<()> {
        let path = self.strategies_path(&strategy.agent_id);
        let mut writer = open_append(&path)?;
        writeln!(writer, "{}", serde_json::to_string(strategy)?)?;
        writer.flush()?;

        tracing::debug!("[Storage] Recorded strategy {}", strategy.strategy_id);
        Ok(())
    }

    async fn latest_strategy(&self, agent_id: &str) -> Result<Option<StrategyData>> {
        Ok(self.load_strategies(agent_id)?.pop())
    }
}

fn open_append(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {:?}", path))?;
    Ok(BufWriter::new(file))
}

fn read_jsonl<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut items = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let item = serde_json::from_str(&line)
            .with_context(|| format!("{:?} line {} is not valid JSON", path, index + 1))?;
        items.push(item);
    }
    Ok(items)
}
