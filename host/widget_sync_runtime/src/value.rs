use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum WireValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
}

impl WireValue {
    pub fn kind(&self) -> WireKind {
        match self {
            WireValue::Bool(_) => WireKind::Bool,
            WireValue::Int(_) => WireKind::Int,
            WireValue::Double(_) => WireKind::Double,
            WireValue::String(_) => WireKind::String,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireKind {
    Bool,
    Int,
    Double,
    String,
}

impl fmt::Display for WireKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WireKind::Bool => "bool",
            WireKind::Int => "int",
            WireKind::Double => "double",
            WireKind::String => "string",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    ScriptDefault,
    Client,
    SessionState,
}
