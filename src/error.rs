//! Error types for mapagent
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

use crate::llm::LlmError;
use crate::tools::AdapterError;

/// Errors that escape the agent library
#[derive(Debug, Error)]
pub enum AgentError {
    /// A language-model call failed or timed out; fatal for the current turn only
    #[error("Model call failed: {0}")]
    ModelCall(#[from] LlmError),

    /// A request that cannot be turned into a turn (e.g. a blank message)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Map-service clients could not be constructed
    #[error("Service setup failed: {0}")]
    ServiceSetup(#[from] AdapterError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AgentError {
    pub fn is_model_call(&self) -> bool {
        matches!(self, Self::ModelCall(_))
    }
}

/// Result type alias for mapagent operations
pub type Result<T> = std::result::Result<T, AgentError>;
