use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures local to a single tool call. These never end a run: each one is
/// folded into an error result and handed back to the model.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum AgentError {
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Tool execution failed: {0}")]
    ExecutionError(String),
}

impl AgentError {
    /// The text placed in the error result the model sees
    pub fn tool_output(&self) -> String {
        match self {
            AgentError::ToolNotFound(_) => "tool not found".to_string(),
            AgentError::InvalidParameters(message) => message.clone(),
            AgentError::ExecutionError(message) => message.clone(),
        }
    }
}

pub type AgentResult<T> = Result<T, AgentError>;

/// A malformed tool declaration. Raised while the registry is built, so the
/// agent never starts with it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StartupError {
    #[error("Duplicate tool name: {0}")]
    DuplicateTool(String),

    #[error("Invalid schema for tool input {type_name}: {reason}")]
    Schema { type_name: String, reason: String },
}

/// Conditions that end a run of the turn loop.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Inference request failed: {0:#}")]
    Transport(anyhow::Error),

    #[error("Failed to read input: {0:#}")]
    Input(anyhow::Error),

    #[error("Protocol violation: {0}")]
    Protocol(String),

    #[error("Run cancelled")]
    Cancelled,
}

pub type RunResult<T> = Result<T, RunError>;
