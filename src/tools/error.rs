//! Tool invocation errors
//!
//! `AdapterError` is what a handler reports; `ToolError` is the classified
//! failure the registry hands back to the orchestrator.

use serde_json::Value;

/// Failure reported by a tool handler
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// Arguments were well-typed but semantically unusable
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("no usable result: {0}")]
    EmptyResult(String),

    #[error("unexpected response: {0}")]
    Malformed(String),
}

/// Classified failure of a single tool invocation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for tool '{tool}': {detail}")]
    InvalidArguments { tool: String, args: Value, detail: String },

    #[error("Tool '{tool}' failed: {detail}")]
    ExecutionFailed { tool: String, detail: String },
}

impl ToolError {
    pub fn invalid_arguments(tool: impl Into<String>, args: &Value, detail: impl Into<String>) -> Self {
        Self::InvalidArguments {
            tool: tool.into(),
            args: args.clone(),
            detail: detail.into(),
        }
    }

    pub fn execution_failed(tool: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            tool: tool.into(),
            detail: detail.into(),
        }
    }

    /// Name of the tool the error refers to
    pub fn tool_name(&self) -> &str {
        match self {
            Self::UnknownTool(name) => name,
            Self::InvalidArguments { tool, .. } | Self::ExecutionFailed { tool, .. } => tool,
        }
    }

    /// Sentence shown to the user at the turn boundary
    pub fn user_message(&self) -> String {
        match self {
            Self::UnknownTool(name) => {
                format!("I tried to call an unknown tool '{}'. Please refine your request.", name)
            }
            Self::InvalidArguments { tool, args, detail } => {
                format!("There was an error calling tool '{}' with arguments {}: {}", tool, args, detail)
            }
            Self::ExecutionFailed { tool, detail } => format!("Tool '{}' failed: {}", tool, detail),
        }
    }
}
