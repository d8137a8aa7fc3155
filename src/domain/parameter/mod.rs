// Parameter resolution model: layered, last-wins value sources

mod collection;
mod key_value;
mod object;

pub use collection::ParameterCollection;
pub use key_value::KeyValueParameter;
pub use object::{ObjectParameter, ObjectRoot};

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use super::value::ParameterValue;
use crate::error::Result;

/// A source of named or path-addressed values
pub trait Parameter: fmt::Debug + Send + Sync + ShareParameter {
    /// Look up `key`. A miss is `ParameterValue::Undefined`, not an error;
    /// errors come from malformed path keys.
    fn resolve(&self, key: &str) -> Result<ParameterValue>;

    /// Dump the parameter as JSON
    fn write_json(&self) -> Value;

    /// True for bare object scopes pushed by array-template iteration
    fn is_object_scope(&self) -> bool {
        false
    }

    /// The scope stack behind this parameter, if it is one
    fn as_collection(&self) -> Option<&ParameterCollection> {
        None
    }
}

/// Owned handle to a parameter only held by reference
pub trait ShareParameter {
    fn clone_shared(&self) -> Arc<dyn Parameter>;
}

impl<T: Parameter + Clone + 'static> ShareParameter for T {
    fn clone_shared(&self) -> Arc<dyn Parameter> {
        Arc::new(self.clone())
    }
}

/// True when the key addresses a JSON root (`$...`)
pub fn is_json_path(key: &str) -> bool {
    key.starts_with('$')
}

/// True when the key addresses an HTML root (`/...`)
pub fn is_html_path(key: &str) -> bool {
    key.starts_with('/')
}
