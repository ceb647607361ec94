//! Typed flag values.

use serde::Serialize;
use serde_json::Value as JsonValue;

/// Value kind a flag key is declared with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlagKind {
    Boolean,
    Number,
    String,
    Json,
}

impl FlagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagKind::Boolean => "boolean",
            FlagKind::Number => "number",
            FlagKind::String => "string",
            FlagKind::Json => "json",
        }
    }
}

/// A single flag value. Serialises as the bare JSON value.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FlagValue {
    Boolean(bool),
    Number(f64),
    String(String),
    Json(JsonValue),
}

impl FlagValue {
    pub fn kind(&self) -> FlagKind {
        match self {
            FlagValue::Boolean(_) => FlagKind::Boolean,
            FlagValue::Number(_) => FlagKind::Number,
            FlagValue::String(_) => FlagKind::String,
            FlagValue::Json(_) => FlagKind::Json,
        }
    }

    /// Interprets a wire value as `kind`, returning `None` on a kind mismatch.
    ///
    /// JSON flags accept any value, including `null`.
    pub fn from_json(kind: FlagKind, value: &JsonValue) -> Option<Self> {
        match kind {
            FlagKind::Boolean => value.as_bool().map(FlagValue::Boolean),
            FlagKind::Number => value.as_f64().map(FlagValue::Number),
            FlagKind::String => value.as_str().map(|s| FlagValue::String(s.to_owned())),
            FlagKind::Json => Some(FlagValue::Json(value.clone())),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FlagValue::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FlagValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FlagValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&JsonValue> {
        match self {
            FlagValue::Json(value) => Some(value),
            _ => None,
        }
    }
}
