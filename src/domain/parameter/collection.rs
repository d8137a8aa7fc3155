// Scope stack of parameters

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;
use std::sync::Arc;

use super::{KeyValueParameter, ObjectParameter, Parameter};
use crate::domain::value::ParameterValue;
use crate::error::Result;

/// Ordered parameters, searched from the last pushed to the first.
///
/// Cloning is cheap: entries are shared, so a clone is a new scope over the
/// same sources.
#[derive(Debug, Clone, Default)]
pub struct ParameterCollection {
    parameters: Vec<Arc<dyn Parameter>>,
}

impl ParameterCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// View any parameter as a scope stack. A collection is used as is,
    /// anything else becomes a one-entry stack.
    pub fn scope_of(ctx: &dyn Parameter) -> Cow<'_, ParameterCollection> {
        match ctx.as_collection() {
            Some(collection) => Cow::Borrowed(collection),
            None => {
                let mut scope = Self::new();
                scope.push_shared(ctx.clone_shared());
                Cow::Owned(scope)
            }
        }
    }

    pub fn push(&mut self, parameter: impl Parameter + 'static) {
        self.parameters.push(Arc::new(parameter));
    }

    pub fn push_shared(&mut self, parameter: Arc<dyn Parameter>) {
        self.parameters.push(parameter);
    }

    pub fn pop(&mut self) -> Option<Arc<dyn Parameter>> {
        self.parameters.pop()
    }

    /// Remove the innermost entry if it is a bare object scope
    pub fn pop_object_scope(&mut self) -> bool {
        let trailing = self
            .parameters
            .last()
            .map(|p| p.is_object_scope())
            .unwrap_or(false);
        if trailing {
            self.parameters.pop();
        }
        trailing
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Push a serializable value as a JSON object scope
    pub fn push_object_value<T: Serialize>(&mut self, value: &T) -> Result<()> {
        self.push(ObjectParameter::from_serialize(value)?);
        Ok(())
    }

    /// Push a serializable struct as named key/value entries
    pub fn push_key_value<T: Serialize>(&mut self, value: &T) -> Result<()> {
        self.push(KeyValueParameter::from_serialize(value)?);
        Ok(())
    }

    /// Resolve `key` and deserialize the JSON form of the result.
    /// Returns `None` on a miss.
    pub fn resolve_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let value = self.resolve(key)?;
        if value.is_undefined() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value.to_json())?))
    }
}

impl Parameter for ParameterCollection {
    fn resolve(&self, key: &str) -> Result<ParameterValue> {
        for parameter in self.parameters.iter().rev() {
            let value = parameter.resolve(key)?;
            if !value.is_undefined() {
                return Ok(value);
            }
        }
        Ok(ParameterValue::Undefined)
    }

    fn write_json(&self) -> Value {
        Value::Array(self.parameters.iter().map(|p| p.write_json()).collect())
    }

    fn as_collection(&self) -> Option<&ParameterCollection> {
        Some(self)
    }
}
