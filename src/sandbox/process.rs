//! Local process sandbox
//!
//! Writes the code to a temp file and runs it with an interpreter under a
//! timeout.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tokio::time::timeout;

use super::{CodeExecutionSandbox, ExecutionOutput};
use crate::agent::config::SandboxSettings;

/// Default timeout (2 minutes)
const DEFAULT_TIMEOUT_SECS: u64 = 120;
/// Maximum captured length per stream, in characters
const MAX_OUTPUT_LENGTH: usize = 30000;

/// Runs code with a local interpreter (`python3` by default)
#[derive(Debug, Clone)]
pub struct ProcessSandbox {
    interpreter: String,
    timeout: Duration,
    workdir: Option<PathBuf>,
}

impl ProcessSandbox {
    pub fn new() -> Self {
        Self {
            interpreter: "python3".to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            workdir: None,
        }
    }

    pub fn from_settings(settings: &SandboxSettings) -> Self {
        Self {
            interpreter: settings.interpreter.clone(),
            timeout: Duration::from_secs(settings.timeout_secs),
            workdir: settings.workdir.clone(),
        }
    }

    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(workdir.into());
        self
    }
}

impl Default for ProcessSandbox {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CodeExecutionSandbox for ProcessSandbox {
    async fn run(&self, code: &str) -> Result<ExecutionOutput> {
        let mut script = NamedTempFile::new().context("Failed to create script file")?;
        script
            .write_all(code.as_bytes())
            .context("Failed to write script file")?;
        script.flush()?;

        tracing::info!(
            "[Sandbox] Running {} bytes with {}",
            code.len(),
            self.interpreter
        );
        tracing::debug!("[Sandbox] Script: {:?}", script.path());

        let mut command = Command::new(&self.interpreter);
        command
            .arg(script.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(ref dir) = self.workdir {
            command.current_dir(dir);
        }

        let child = command
            .spawn()
            .with_context(|| format!("Failed to start interpreter {:?}", self.interpreter))?;

        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.context("Failed to collect interpreter output")?,
            Err(_) => {
                tracing::warn!("[Sandbox] Timed out after {:?}", self.timeout);
                return Ok(ExecutionOutput {
                    stdout: String::new(),
                    stderr: format!("Execution timed out after {}s", self.timeout.as_secs()),
                    exit_code: None,
                });
            }
        };

        let result = ExecutionOutput {
            stdout: truncate_output(String::from_utf8_lossy(&output.stdout).into_owned()),
            stderr: truncate_output(String::from_utf8_lossy(&output.stderr).into_owned()),
            exit_code: output.status.code(),
        };

        tracing::debug!("[Sandbox] Exit code: {:?}", result.exit_code);
        tracing::debug!(
            "[Sandbox] Output length: {} stdout / {} stderr chars",
            result.stdout.len(),
            result.stderr.len()
        );

        Ok(result)
    }
}

fn truncate_output(mut text: String) -> String {
    if let Some((cut, _)) = text.char_indices().nth(MAX_OUTPUT_LENGTH) {
        text.truncate(cut);
        text.push_str("\n... (output truncated)");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sh() -> ProcessSandbox {
        ProcessSandbox::new().with_interpreter("sh")
    }

    #[tokio::test]
    async fn test_successful_run() {
        let output = sh().run("echo hello").await.unwrap();
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.exit_code, Some(0));
        assert!(!output.failed());
    }

    #[tokio::test]
    async fn test_failing_run_reports_stderr() {
        let output = sh().run("echo broken >&2\nexit 3").await.unwrap();
        assert_eq!(output.exit_code, Some(3));
        assert!(output.failed());
        assert!(output.error_text().contains("broken"));
    }

    #[tokio::test]
    async fn test_timeout() {
        let output = sh()
            .with_timeout(Duration::from_millis(200))
            .run("sleep 5")
            .await
            .unwrap();
        assert!(output.failed());
        assert_eq!(output.exit_code, None);
        assert!(output.stderr.contains("timed out"));
    }

    #[tokio::test]
    async fn test_workdir() {
        let dir = TempDir::new().unwrap();
        let output = sh().with_workdir(dir.path()).run("touch marker && ls").await.unwrap();
        assert!(output.stdout.contains("marker"));
        assert!(dir.path().join("marker").exists());
    }

    #[tokio::test]
    async fn test_missing_interpreter_is_an_error() {
        let sandbox = ProcessSandbox::new().with_interpreter("definitely-not-an-interpreter");
        assert!(sandbox.run("print(1)").await.is_err());
    }

    #[test]
    fn test_truncate_output() {
        let long = "é".repeat(MAX_OUTPUT_LENGTH + 10);
        let truncated = truncate_output(long);
        assert!(truncated.ends_with("(output truncated)"));
        assert_eq!(
            truncated.chars().count(),
            MAX_OUTPUT_LENGTH + "\n... (output truncated)".chars().count()
        );

        assert_eq!(truncate_output("short".into()), "short");
    }
}
