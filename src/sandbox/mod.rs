//! Code execution sandbox
//!
//! Generated code never runs in-process. A `CodeExecutionSandbox` takes the
//! source text and reports what the run printed and how it exited.

mod process;

pub use process::ProcessSandbox;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// What a sandboxed run printed and how it exited
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed (timeout or signal)
    pub exit_code: Option<i32>,
}

impl ExecutionOutput {
    /// A run failed when it exited non-zero, was killed, or wrote to stderr
    pub fn failed(&self) -> bool {
        self.exit_code != Some(0) || !self.stderr.trim().is_empty()
    }

    /// Error report handed to the regeneration prompt
    pub fn error_text(&self) -> String {
        if !self.stderr.trim().is_empty() {
            return self.stderr.clone();
        }
        match self.exit_code {
            Some(code) => format!("Process exited with code {}\n{}", code, self.stdout),
            None => format!("Process was terminated\n{}", self.stdout),
        }
    }
}

/// Runs generated code and reports its output
#[async_trait::async_trait]
pub trait CodeExecutionSandbox: Send + Sync {
    /// Run `code` to completion (or timeout).
    ///
    /// `Err` means the sandbox itself could not run the code; a program that
    /// ran and failed is an `Ok` output with `failed() == true`.
    async fn run(&self, code: &str) -> Result<ExecutionOutput>;
}
