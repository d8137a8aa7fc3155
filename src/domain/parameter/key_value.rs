// Exact-key parameter backed by an insertion-ordered map

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

use super::Parameter;
use crate::domain::value::{parse_decimal, ParameterValue};
use crate::error::{Error, Result};

/// Named values; adding an existing key replaces its value
#[derive(Debug, Clone, Default)]
pub struct KeyValueParameter {
    values: IndexMap<String, ParameterValue>,
}

impl KeyValueParameter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or overwrite `key`
    pub fn add(&mut self, key: impl Into<String>, value: ParameterValue) {
        self.values.insert(key.into(), value);
    }

    /// Builder-style `add`
    pub fn insert(mut self, key: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.add(key, value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParameterValue> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Flatten the top-level fields of a JSON object into typed entries.
    /// Nulls are skipped.
    pub fn extend_from_json(&mut self, object: &Value) -> Result<()> {
        let Value::Object(map) = object else {
            return Err(Error::Precondition(format!(
                "key/value parameters need a JSON object, got {}",
                json_kind(object)
            )));
        };

        for (key, value) in map {
            let typed = match value {
                Value::Null => continue,
                Value::Bool(b) => ParameterValue::Boolean(*b),
                Value::String(s) => ParameterValue::String(s.clone()),
                Value::Number(n) => match parse_decimal(&n.to_string()) {
                    Some(d) => ParameterValue::Number(d),
                    None => ParameterValue::Json(value.clone()),
                },
                Value::Array(_) | Value::Object(_) => ParameterValue::Json(value.clone()),
            };
            self.add(key.clone(), typed);
        }
        Ok(())
    }

    /// Build from any serializable struct or map
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self> {
        let json = serde_json::to_value(value)?;
        let mut parameter = Self::new();
        parameter.extend_from_json(&json)?;
        Ok(parameter)
    }
}

impl Parameter for KeyValueParameter {
    fn resolve(&self, key: &str) -> Result<ParameterValue> {
        Ok(self.values.get(key).cloned().unwrap_or_default())
    }

    fn write_json(&self) -> Value {
        let map: Map<String, Value> = self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        Value::Object(map)
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;

    #[test]
    fn test_last_write_wins() {
        let mut kv = KeyValueParameter::new();
        kv.add("name", "first".into());
        kv.add("name", "second".into());
        assert_eq!(kv.len(), 1);
        assert_eq!(kv.resolve("name").unwrap(), ParameterValue::from("second"));
    }

    #[test]
    fn test_missing_key_is_undefined() {
        let kv = KeyValueParameter::new().insert("a", "1");
        assert!(kv.resolve("b").unwrap().is_undefined());
        // Keys are exact, paths are not interpreted
        assert!(kv.resolve("$.a").unwrap().is_undefined());
    }

    #[test]
    fn test_extend_from_json_types_fields() {
        let mut kv = KeyValueParameter::new();
        kv.extend_from_json(&json!({
            "page": 2,
            "title": "dune",
            "adult": false,
            "tags": ["a"],
            "skip": null
        }))
        .unwrap();

        assert_eq!(kv.get("page"), Some(&ParameterValue::Number(Decimal::from(2))));
        assert_eq!(kv.get("title"), Some(&ParameterValue::from("dune")));
        assert_eq!(kv.get("adult"), Some(&ParameterValue::Boolean(false)));
        assert_eq!(kv.get("tags"), Some(&ParameterValue::Json(json!(["a"]))));
        assert!(kv.get("skip").is_none());
    }

    #[test]
    fn test_extend_from_json_rejects_scalars() {
        let mut kv = KeyValueParameter::new();
        let err = kv.extend_from_json(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
    }

    #[test]
    fn test_from_serialize() {
        #[derive(Serialize)]
        struct Search {
            query: String,
            page: u32,
        }

        let kv = KeyValueParameter::from_serialize(&Search {
            query: "rust".to_string(),
            page: 3,
        })
        .unwrap();
        assert_eq!(kv.resolve("query").unwrap().to_text(), "rust");
        assert_eq!(kv.resolve("page").unwrap().to_text(), "3");
    }

    #[test]
    fn test_write_json_keeps_order() {
        let kv = KeyValueParameter::new().insert("z", "1").insert("a", true);
        assert_eq!(kv.write_json().to_string(), r#"{"z":"1","a":true}"#);
    }
}
