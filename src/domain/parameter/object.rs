// Path-addressed parameter over JSON and HTML roots

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::{is_html_path, is_json_path, Parameter};
use crate::domain::html::{HtmlNode, HtmlValue};
use crate::domain::path;
use crate::domain::value::ParameterValue;
use crate::error::{Error, Result};

/// A document root a path can be evaluated against
#[derive(Debug, Clone)]
pub enum ObjectRoot {
    Json(Value),
    Html(HtmlValue),
}

/// Stack of document roots. Paths are tried newest root first.
#[derive(Debug, Clone, Default)]
pub struct ObjectParameter {
    roots: Vec<ObjectRoot>,
}

impl ObjectParameter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(root: Value) -> Self {
        let mut parameter = Self::new();
        parameter.push_json(root);
        parameter
    }

    pub fn with_html(root: Arc<dyn HtmlNode>) -> Self {
        let mut parameter = Self::new();
        parameter.push_html(HtmlValue::Node(root));
        parameter
    }

    /// Push a resolved value as a new root.
    ///
    /// Only JSON and HTML values can be roots; anything else is a
    /// precondition violation.
    pub fn add(&mut self, value: ParameterValue) -> Result<()> {
        match value {
            ParameterValue::Json(v) => self.push_json(v),
            ParameterValue::Html(h) => self.push_html(h),
            other => {
                return Err(Error::Precondition(format!(
                    "object parameters only hold json or html values, got {}",
                    other.kind()
                )))
            }
        }
        Ok(())
    }

    pub fn push_json(&mut self, root: Value) {
        self.roots.push(ObjectRoot::Json(root));
    }

    pub fn push_html(&mut self, root: HtmlValue) {
        self.roots.push(ObjectRoot::Html(root));
    }

    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Self::with_json(serde_json::to_value(value)?))
    }

    pub fn roots(&self) -> &[ObjectRoot] {
        &self.roots
    }
}

impl Parameter for ObjectParameter {
    fn resolve(&self, key: &str) -> Result<ParameterValue> {
        let json = is_json_path(key);
        let html = is_html_path(key);
        if !json && !html {
            return Ok(ParameterValue::Undefined);
        }

        for root in self.roots.iter().rev() {
            match root {
                ObjectRoot::Json(value) if json => {
                    if let Some(found) = path::evaluate(value, key)? {
                        return Ok(ParameterValue::Json(found));
                    }
                }
                ObjectRoot::Html(node) if html => {
                    if let Some(found) = node.select(&key[1..]) {
                        return Ok(ParameterValue::Html(found));
                    }
                }
                _ => {}
            }
        }

        tracing::trace!(key, "no object root matched");
        Ok(ParameterValue::Undefined)
    }

    fn write_json(&self) -> Value {
        let mut roots: Vec<Value> = self
            .roots
            .iter()
            .filter_map(|root| match root {
                ObjectRoot::Json(v) => Some(v.clone()),
                ObjectRoot::Html(_) => None,
            })
            .collect();

        if roots.len() == 1 {
            roots.pop().unwrap_or(Value::Null)
        } else {
            Value::Array(roots)
        }
    }

    fn is_object_scope(&self) -> bool {
        true
    }
}
