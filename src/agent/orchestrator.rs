//! Turn orchestrator - decide, invoke, explain
//!
//! One turn makes at most two model calls and one tool call. Tool failures
//! are folded into user-facing text; only a failed model call escapes.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use serde_json::Value;

use super::decision::{Decision, build_system_prompt, parse_decision};
use super::explain::build_explanation_messages;
use crate::config::LlmConfig;
use crate::error::Result;
use crate::llm::{LlmClient, LlmError, Message};
use crate::tools::{ToolError, ToolRegistry};

/// Token limits and timeout for the two model calls of a turn
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub decision_max_tokens: u32,
    pub explain_max_tokens: u32,
    pub llm_timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            decision_max_tokens: 512,
            explain_max_tokens: 512,
            llm_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&LlmConfig> for AgentConfig {
    fn from(config: &LlmConfig) -> Self {
        Self {
            decision_max_tokens: config.decision_max_tokens,
            explain_max_tokens: config.explain_max_tokens,
            llm_timeout: config.timeout(),
        }
    }
}

/// How a turn ended
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The model answered without a tool
    Answered(String),
    /// A tool ran and the model explained its result
    Explained { tool: String, text: String },
    /// The requested tool could not be run
    ToolFailed { error: ToolError, text: String },
}

impl TurnOutcome {
    /// User-facing text
    pub fn text(&self) -> &str {
        match self {
            Self::Answered(text) | Self::Explained { text, .. } | Self::ToolFailed { text, .. } => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Answered(text) | Self::Explained { text, .. } | Self::ToolFailed { text, .. } => text,
        }
    }

    /// Name of the tool the turn asked for, if any
    pub fn tool(&self) -> Option<&str> {
        match self {
            Self::Answered(_) => None,
            Self::Explained { tool, .. } => Some(tool),
            Self::ToolFailed { error, .. } => Some(error.tool_name()),
        }
    }
}

/// The dispatch loop. Immutable after construction and shareable across tasks.
pub struct Agent {
    llm: Arc<dyn LlmClient>,
    registry: Arc<ToolRegistry>,
    config: AgentConfig,
    system_prompt: String,
}

impl Agent {
    pub fn new(llm: Arc<dyn LlmClient>, registry: Arc<ToolRegistry>) -> Self {
        let system_prompt = build_system_prompt(&registry);
        Self {
            llm,
            registry,
            config: AgentConfig::default(),
            system_prompt,
        }
    }

    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn model(&self) -> &str {
        self.llm.model()
    }

    /// Ask the model whether to answer directly or call a tool
    pub async fn decide(&self, user_message: &str) -> std::result::Result<Decision, LlmError> {
        let messages = [Message::system(self.system_prompt.as_str()), Message::user(user_message)];
        let raw = self.chat(&messages, self.config.decision_max_tokens).await?;
        debug!("Decision output: {}", raw);
        Ok(parse_decision(&raw))
    }

    /// Ask the model to explain a tool result; `args` are the bound arguments the tool ran with
    pub async fn explain(
        &self,
        user_message: &str,
        tool_name: &str,
        args: &Value,
        result: &Value,
    ) -> std::result::Result<String, LlmError> {
        let description = self
            .registry
            .descriptor(tool_name)
            .map(|d| d.description.as_str())
            .unwrap_or_default();

        let messages = build_explanation_messages(user_message, tool_name, description, args, result);
        self.chat(&messages, self.config.explain_max_tokens).await
    }

    /// Run one turn and report how it ended
    pub async fn run_turn(&self, user_message: &str) -> Result<TurnOutcome> {
        info!("Turn started ({} chars)", user_message.chars().count());

        let (tool_name, args) = match self.decide(user_message).await? {
            Decision::DirectAnswer { text } => {
                info!("Turn answered directly");
                return Ok(TurnOutcome::Answered(text));
            }
            Decision::ToolCall { tool_name, args } => (tool_name, args),
        };

        info!("Model requested tool {}", tool_name);
        let invocation = match self.registry.invoke(&tool_name, &args).await {
            Ok(invocation) => invocation,
            Err(error) => {
                warn!("Turn ended with tool error: {}", error);
                let text = error.user_message();
                return Ok(TurnOutcome::ToolFailed { error, text });
            }
        };

        let used = invocation.args.to_value();
        let text = self.explain(user_message, &tool_name, &used, &invocation.result).await?;
        info!("Turn explained result of {}", tool_name);
        Ok(TurnOutcome::Explained { tool: tool_name, text })
    }

    /// Run one turn and return the user-facing text
    pub async fn handle_turn(&self, user_message: &str) -> Result<String> {
        Ok(self.run_turn(user_message).await?.into_text())
    }

    async fn chat(&self, messages: &[Message], max_tokens: u32) -> std::result::Result<String, LlmError> {
        let timeout = self.config.llm_timeout;
        match tokio::time::timeout(timeout, self.llm.chat(messages, max_tokens)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout(timeout)),
        }
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("model", &self.llm.model())
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}
