//! Agent - the decide / invoke / explain dispatch loop

mod decision;
mod explain;
mod orchestrator;

pub use decision::{Decision, build_system_prompt, parse_decision};
pub use explain::build_explanation_messages;
pub use orchestrator::{Agent, AgentConfig, TurnOutcome};
