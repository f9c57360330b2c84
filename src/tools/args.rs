//! Argument binding and coercion
//!
//! Binds the model-supplied argument object to a tool's parameter list:
//! unknown keys, missing required values and uncoercible types are all
//! rejected here, before any handler runs.

use serde_json::{Map, Number, Value};

use super::definition::{Constraint, ParamKind, ParamSpec, ToolDescriptor};
use super::error::AdapterError;

/// Why an argument object failed to bind
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BindError {
    #[error("arguments must be a JSON object, got {0}")]
    NotAnObject(String),

    #[error("unexpected argument '{0}'")]
    Unexpected(String),

    #[error("missing required argument '{0}'")]
    Missing(String),

    #[error("argument '{name}' must be {expected}, got {found}")]
    WrongType {
        name: String,
        expected: ParamKind,
        found: String,
    },

    #[error("argument '{name}' = {value} is outside {min}..{max}")]
    OutOfRange { name: String, value: f64, min: f64, max: f64 },

    #[error("argument '{name}' = '{value}' is not one of: {allowed}")]
    NotAllowed { name: String, value: String, allowed: String },
}

/// Arguments that passed binding, keyed by parameter name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArgs {
    values: Map<String, Value>,
}

impl BoundArgs {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn str(&self, name: &str) -> Result<&str, AdapterError> {
        self.get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| missing(name, "string"))
    }

    pub fn f64(&self, name: &str) -> Result<f64, AdapterError> {
        self.get(name).and_then(Value::as_f64).ok_or_else(|| missing(name, "number"))
    }

    pub fn i64(&self, name: &str) -> Result<i64, AdapterError> {
        self.get(name).and_then(Value::as_i64).ok_or_else(|| missing(name, "integer"))
    }

    /// Bound values as a JSON object
    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }
}

fn missing(name: &str, kind: &str) -> AdapterError {
    AdapterError::InvalidInput(format!("argument '{}' is not a bound {}", name, kind))
}

/// Bind `args` against `descriptor`
pub fn bind(descriptor: &ToolDescriptor, args: &Value) -> Result<BoundArgs, BindError> {
    let empty = Map::new();
    let supplied = match args {
        Value::Object(map) => map,
        Value::Null => &empty,
        other => return Err(BindError::NotAnObject(type_name(other).to_string())),
    };

    if let Some(extra) = supplied.keys().find(|key| descriptor.find_param(key).is_none()) {
        return Err(BindError::Unexpected(extra.clone()));
    }

    let mut values = Map::new();
    for spec in &descriptor.params {
        match supplied.get(&spec.name).filter(|v| !v.is_null()) {
            Some(raw) => {
                let coerced = coerce(spec.kind, raw).ok_or_else(|| BindError::WrongType {
                    name: spec.name.clone(),
                    expected: spec.kind,
                    found: describe(raw),
                })?;
                values.insert(spec.name.clone(), constrain(spec, coerced)?);
            }
            None if spec.required => return Err(BindError::Missing(spec.name.clone())),
            None => {
                if let Some(default) = &spec.default {
                    values.insert(spec.name.clone(), default.clone());
                }
            }
        }
    }

    Ok(BoundArgs { values })
}

/// Coerce a raw JSON value to `kind`; `None` when it cannot be
pub fn coerce(kind: ParamKind, raw: &Value) -> Option<Value> {
    match kind {
        ParamKind::String => match raw {
            Value::String(s) => Some(Value::String(s.clone())),
            Value::Number(n) => Some(Value::String(n.to_string())),
            Value::Bool(b) => Some(Value::String(b.to_string())),
            _ => None,
        },
        ParamKind::Number => {
            let n = match raw {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            }?;
            Number::from_f64(n).map(Value::Number)
        }
        ParamKind::Integer => {
            let n = match raw {
                Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
                Value::String(s) => {
                    let s = s.trim();
                    s.parse::<i64>().ok().or_else(|| s.parse::<f64>().ok().and_then(integral))
                }
                _ => None,
            }?;
            Some(Value::from(n))
        }
        ParamKind::Boolean => match raw {
            Value::Bool(b) => Some(Value::Bool(*b)),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Some(Value::Bool(true)),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Some(Value::Bool(false)),
            _ => None,
        },
    }
}

fn integral(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

fn constrain(spec: &ParamSpec, value: Value) -> Result<Value, BindError> {
    match &spec.constraint {
        Constraint::None => Ok(value),
        Constraint::Range { min, max } => match value.as_f64() {
            Some(v) if v < *min || v > *max => Err(BindError::OutOfRange {
                name: spec.name.clone(),
                value: v,
                min: *min,
                max: *max,
            }),
            _ => Ok(value),
        },
        Constraint::Clamp { min, max } => Ok(match (spec.kind, value.as_f64()) {
            (ParamKind::Integer, Some(v)) => Value::from(v.clamp(min.ceil(), max.floor()) as i64),
            (_, Some(v)) => Number::from_f64(v.clamp(*min, *max)).map(Value::Number).unwrap_or(value),
            (_, None) => value,
        }),
        Constraint::OneOf { values } => {
            let given = value.as_str().unwrap_or_default();
            values
                .iter()
                .find(|allowed| allowed.eq_ignore_ascii_case(given.trim()))
                .map(|allowed| Value::String(allowed.clone()))
                .ok_or_else(|| BindError::NotAllowed {
                    name: spec.name.clone(),
                    value: given.to_string(),
                    allowed: values.join(", "),
                })
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Array(_) | Value::Object(_) => type_name(value).to_string(),
        other => format!("{} {}", type_name(other), other),
    }
}
