//! Core types for the affiliate promoter agent
//!
//! - `Stage` - The backend-calling steps of a promotion cycle
//! - `ConfigurationError` / `GenerationError` / `AgentError` - Error types

pub mod error;
pub mod stage;

pub use error::{AgentError, AgentResult, ConfigurationError, GenerationError};
pub use stage::Stage;
