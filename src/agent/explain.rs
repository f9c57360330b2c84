//! Explanation stage prompt

use serde_json::Value;

use crate::llm::Message;

const EXPLAIN_SYSTEM: &str = "You are a helpful geospatial assistant.";

/// Build the `[system, user]` messages asking the model to explain a tool result
pub fn build_explanation_messages(
    user_message: &str,
    tool_name: &str,
    tool_description: &str,
    args: &Value,
    result: &Value,
) -> Vec<Message> {
    let prompt = format!(
        "You are a geospatial assistant. A tool has been called on behalf of the user.\n\n\
         User message:\n{user_message}\n\n\
         Tool used: {tool_name}\n\
         Tool description: {tool_description}\n\
         Arguments: {}\n\n\
         Raw tool result (JSON):\n{}\n\n\
         Now explain the result to the user in clear natural language. \
         Summarize key distances, durations, coordinates, and any useful POI details. \
         Do not show the raw JSON, just a human-readable explanation.",
        pretty(args),
        pretty(result),
    );

    vec![Message::system(EXPLAIN_SYSTEM), Message::user(prompt)]
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
