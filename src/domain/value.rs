// Tagged values produced by parameter resolution

use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use super::html::HtmlValue;

/// A resolved parameter. `Undefined` means "no value" and is never an error.
#[derive(Debug, Clone, Default)]
pub enum ParameterValue {
    Number(Decimal),
    String(String),
    Boolean(bool),
    Json(Value),
    Html(HtmlValue),
    #[default]
    Undefined,
}

impl ParameterValue {
    pub fn is_undefined(&self) -> bool {
        matches!(self, ParameterValue::Undefined)
    }

    /// Kind name, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            ParameterValue::Number(_) => "number",
            ParameterValue::String(_) => "string",
            ParameterValue::Boolean(_) => "boolean",
            ParameterValue::Json(_) => "json",
            ParameterValue::Html(_) => "html",
            ParameterValue::Undefined => "undefined",
        }
    }

    /// Canonical text form.
    ///
    /// JSON strings yield their raw content, other JSON values their compact
    /// serialization. HTML yields node text, one line per node for a node set.
    pub fn to_text(&self) -> String {
        match self {
            ParameterValue::Number(n) => n.to_string(),
            ParameterValue::String(s) => s.clone(),
            ParameterValue::Boolean(b) => b.to_string(),
            ParameterValue::Json(v) => json_text(v),
            ParameterValue::Html(h) => h.text(),
            ParameterValue::Undefined => String::new(),
        }
    }

    /// JSON form of the value, for diagnostics and typed reads
    pub fn to_json(&self) -> Value {
        match self {
            ParameterValue::Number(n) => decimal_to_json(n),
            ParameterValue::String(s) => Value::String(s.clone()),
            ParameterValue::Boolean(b) => Value::Bool(*b),
            ParameterValue::Json(v) => v.clone(),
            ParameterValue::Html(h) => Value::String(h.text()),
            ParameterValue::Undefined => Value::Null,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ParameterValue::Json(v) => Some(v),
            _ => None,
        }
    }
}

impl PartialEq for ParameterValue {
    fn eq(&self, other: &Self) -> bool {
        use ParameterValue::*;
        match (self, other) {
            (Number(a), Number(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Boolean(a), Boolean(b)) => a == b,
            (Json(_), Json(_)) | (Html(_), Html(_)) => self.to_text() == other.to_text(),
            (Undefined, Undefined) => true,
            _ => false,
        }
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        ParameterValue::String(value.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        ParameterValue::String(value)
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        ParameterValue::Boolean(value)
    }
}

impl From<Decimal> for ParameterValue {
    fn from(value: Decimal) -> Self {
        ParameterValue::Number(value)
    }
}

impl From<i64> for ParameterValue {
    fn from(value: i64) -> Self {
        ParameterValue::Number(Decimal::from(value))
    }
}

impl From<Value> for ParameterValue {
    fn from(value: Value) -> Self {
        ParameterValue::Json(value)
    }
}

impl From<HtmlValue> for ParameterValue {
    fn from(value: HtmlValue) -> Self {
        ParameterValue::Html(value)
    }
}

/// Text of a JSON value as seen by templates
pub(crate) fn json_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Parse a JSON number (or numeric text) as a decimal
pub(crate) fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(text)
        .ok()
        .or_else(|| Decimal::from_scientific(text).ok())
}

pub(crate) fn decimal_to_json(value: &Decimal) -> Value {
    serde_json::from_str(&value.to_string()).unwrap_or(Value::Null)
}
