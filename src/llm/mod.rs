//! LLM Client Layer - chat-completion adapter used by the dispatch loop
//!
//! This module provides:
//! - Message types for LLM communication
//! - LlmClient trait for API abstraction
//! - HuggingFaceClient implementation
//! - MockLlmClient for scripted tests

pub mod client;
pub mod huggingface;
pub mod types;

pub use client::{LlmClient, LlmError, MockLlmClient};
pub use huggingface::{HuggingFaceClient, HuggingFaceConfig};
pub use types::{Message, Role, Usage};
