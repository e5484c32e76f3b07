//! Domain error types for taskpilot
//!
//! - `AgentError` for failures surfaced while driving the agent CLI
//! - `PilotError` as the top-level error type

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for taskpilot
#[derive(Debug, Error)]
pub enum PilotError {
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("Console error: {0}")]
    Console(#[from] std::io::Error),
}

/// Errors related to agent communication
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent CLI not installed ({})", .0.display())]
    CliNotFound(PathBuf),

    #[error("agent process exited with code {}", exit_code.map(|c| c.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    Process {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Failed to spawn agent: {0}")]
    SpawnFailed(String),

    #[error("Agent connection lost")]
    Disconnected,

    #[error("Agent stream ended before the turn completed")]
    IncompleteTurn,

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AgentError {
    /// Console line shown when a run ends on this error.
    pub fn report(&self) -> String {
        match self {
            AgentError::CliNotFound(path) => {
                format!("Error: agent CLI not installed ({})", path.display())
            }
            AgentError::Process { exit_code, .. } => match exit_code {
                Some(code) => format!("Tool execution failed with exit code: {}", code),
                None => "Tool execution failed with exit code: unknown".to_string(),
            },
            other => format!("SDK error: {}", other),
        }
    }
}

/// Result type alias for PilotError
pub type Result<T> = std::result::Result<T, PilotError>;

/// Result type alias for AgentError
pub type AgentResult<T> = std::result::Result<T, AgentError>;
