//! Decision stage - tool catalog prompt and model-output parsing
//!
//! The model is asked to answer with either `{"tool": ..., "args": {...}}`
//! or `{"answer": ...}`. Parsing never fails: anything that is not a
//! well-formed tool call degrades to a direct answer.

use serde_json::{Map, Value};

use crate::tools::ToolRegistry;

/// What the model chose to do with a user message
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    DirectAnswer { text: String },
    ToolCall { tool_name: String, args: Value },
}

impl Decision {
    pub fn is_tool_call(&self) -> bool {
        matches!(self, Self::ToolCall { .. })
    }
}

/// Build the system instruction listing every tool and the output contract
pub fn build_system_prompt(registry: &ToolRegistry) -> String {
    let tools_text = registry
        .descriptors()
        .iter()
        .map(|d| d.prompt_entry())
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a geospatial assistant that can call a set of tools (map servers).\n\
         Tools available:\n\
         {tools_text}\n\n\
         You MUST decide if you need to call a tool.\n\
         If you need a tool, respond ONLY with a JSON object of the form:\n\
         {{\n  \"tool\": \"<tool_name>\",\n  \"args\": {{ ... }}\n}}\n\
         where <tool_name> is one of the tools above, and args contains only simple JSON types.\n\
         If you can answer directly without tools (e.g., conceptual explanation), respond ONLY with:\n\
         {{ \"answer\": \"<your natural language answer>\" }}\n\
         Do not add any extra text outside the JSON. The JSON must be the entire response."
    )
}

/// Interpret raw model output as a `Decision`
pub fn parse_decision(raw: &str) -> Decision {
    let fallback = || Decision::DirectAnswer { text: raw.to_string() };

    let object = match serde_json::from_str::<Value>(strip_code_fence(raw.trim())) {
        Ok(Value::Object(object)) => object,
        _ => return fallback(),
    };

    if let Some(Value::String(tool_name)) = object.get("tool") {
        let args = match object.get("args") {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(args) => args.clone(),
        };
        return Decision::ToolCall {
            tool_name: tool_name.clone(),
            args,
        };
    }

    match object.get("answer") {
        Some(Value::String(text)) => Decision::DirectAnswer { text: text.clone() },
        _ => fallback(),
    }
}

/// Remove one surrounding markdown code fence, e.g. ```` ```json ... ``` ````
fn strip_code_fence(text: &str) -> &str {
    let Some(inner) = text.strip_prefix("```").and_then(|t| t.strip_suffix("```")) else {
        return text;
    };
    // Drop the info string (`json`) on the opening line, unless JSON starts there
    match inner.split_once('\n') {
        Some((first, body)) if !first.contains(['{', '[']) => body.trim(),
        _ => inner.trim(),
    }
}
