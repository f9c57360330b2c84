//! Tool descriptors and parameter specifications
//!
//! A descriptor is what the model sees when choosing a tool, and what the
//! registry checks arguments against before a handler ever runs.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

/// Primitive type a parameter is coerced to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    #[serde(rename = "float")]
    Number,
    Integer,
    Boolean,
}

impl ParamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "float",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extra check applied after coercion
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Constraint {
    None,
    /// Reject values outside `[min, max]`
    Range { min: f64, max: f64 },
    /// Pull values into `[min, max]`
    Clamp { min: f64, max: f64 },
    /// Accept only the listed strings (case-insensitive)
    OneOf { values: Vec<String> },
}

/// A single named parameter of a tool
#[derive(Debug, Clone, Serialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    pub description: String,
    pub constraint: Constraint,
}

impl ParamSpec {
    /// A parameter the caller must supply
    pub fn required(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            default: None,
            description: description.into(),
            constraint: Constraint::None,
        }
    }

    /// An optional parameter filled with `default` when absent
    pub fn optional(
        name: impl Into<String>,
        kind: ParamKind,
        default: impl Into<Value>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            default: Some(default.into()),
            description: description.into(),
            constraint: Constraint::None,
        }
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.constraint = Constraint::Range { min, max };
        self
    }

    pub fn with_clamp(mut self, min: f64, max: f64) -> Self {
        self.constraint = Constraint::Clamp { min, max };
        self
    }

    pub fn one_of(mut self, values: &[&str]) -> Self {
        self.constraint = Constraint::OneOf {
            values: values.iter().map(|v| v.to_string()).collect(),
        };
        self
    }

    /// One-line summary used in the decision prompt,
    /// e.g. `integer (optional, default=5) - max number of results (1-10).`
    pub fn summary(&self) -> String {
        let presence = match (self.required, &self.default) {
            (true, _) => "required".to_string(),
            (false, Some(Value::String(s))) => format!("optional, default='{}'", s),
            (false, Some(v)) => format!("optional, default={}", v),
            (false, None) => "optional".to_string(),
        };

        let mut line = format!("{} ({})", self.kind, presence);
        if !self.description.is_empty() {
            line.push_str(" - ");
            line.push_str(&self.description);
        }
        if let Constraint::OneOf { values } = &self.constraint {
            line.push_str(&format!(" One of: {}.", values.join(", ")));
        }
        line
    }
}

/// Immutable description of a tool, built once at start-up
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
    /// Per-tool invocation timeout; falls back to the registry default
    #[serde(skip)]
    pub timeout: Option<Duration>,
}

impl ToolDescriptor {
    /// Create a descriptor with no parameters
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
            timeout: None,
        }
    }

    /// Append a parameter
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Look up a parameter by name
    pub fn find_param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Render the catalog entry shown to the model
    pub fn prompt_entry(&self) -> String {
        let mut entry = format!("- {}:\n  description: {}\n  args:", self.name, self.description);
        if self.params.is_empty() {
            entry.push_str(" none");
        }
        for param in &self.params {
            entry.push_str(&format!("\n    {}: {}", param.name, param.summary()));
        }
        entry
    }
}
