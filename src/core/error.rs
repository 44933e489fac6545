//! Agent error types

use thiserror::Error;

use super::stage::Stage;

/// Invalid prompt templates or settings, detected while assembling the agent.
///
/// Placeholders are reported in their `{name}` form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// One or more required templates were not supplied
    #[error("Missing required prompts: {}", .0.join(", "))]
    MissingTemplates(Vec<String>),

    /// A template does not declare every placeholder it must
    #[error("Missing required placeholders in {template}: {}", .placeholders.join(", "))]
    MissingPlaceholders {
        template: String,
        placeholders: Vec<String>,
    },

    /// A template declares placeholders that nothing will fill
    #[error("Unexpected placeholders in {template}: {}", .placeholders.join(", "))]
    UnexpectedPlaceholders {
        template: String,
        placeholders: Vec<String>,
    },

    /// Invalid setting value
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigurationError {
    /// Create an invalid setting error
    pub fn invalid(msg: impl Into<String>) -> Self {
        ConfigurationError::Invalid(msg.into())
    }
}

/// The code-generation backend failed, or its reply could not be unwrapped,
/// while running a stage.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("AffiliatePromoterAgent.{stage}, err: \n{message}")]
pub struct GenerationError {
    pub stage: Stage,
    pub message: String,
}

impl GenerationError {
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

/// Errors that can occur while running the agent
#[derive(Error, Debug)]
pub enum AgentError {
    /// Invalid templates or settings
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A stage failed to generate
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Generated code kept failing in the sandbox
    #[error("Execution error: {0}")]
    Execution(String),

    /// A collaborator (sandbox, retrieval, persistence, sensor) failed
    #[error("{context}: {error:#}")]
    Collaborator {
        context: String,
        error: anyhow::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Cycle interrupted by the operator
    #[error("Agent interrupted")]
    Interrupted,
}

impl AgentError {
    /// Wrap a collaborator failure with a short description of the call
    pub fn collaborator(context: impl Into<String>, error: anyhow::Error) -> Self {
        AgentError::Collaborator {
            context: context.into(),
            error,
        }
    }
}

/// Result type alias for agent operations
pub type AgentResult<T> = Result<T, AgentError>;
