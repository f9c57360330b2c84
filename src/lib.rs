//! mapagent - a map assistant built on a tool-dispatch loop
//!
//! A language model reads the user's message and either answers directly or
//! picks one geospatial tool (geocoding, POI search, routing, road snapping).
//! The tool runs against OpenStreetMap services and the model explains the
//! result in plain language.

pub mod agent;
pub mod config;
pub mod error;
pub mod llm;
pub mod repl;
pub mod server;
pub mod services;
pub mod tools;

pub use error::{AgentError, Result};
