use indexmap::IndexMap;
use std::path::Path;

use super::definition::RequestDefinition;
use crate::error::Result;

/// Named request definitions, in file order. A repeated name replaces the
/// earlier definition.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    definitions: IndexMap<String, RequestDefinition>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_definitions(definitions: impl IntoIterator<Item = RequestDefinition>) -> Self {
        let mut catalog = Self::new();
        for definition in definitions {
            catalog.insert(definition);
        }
        catalog
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let definitions: Vec<RequestDefinition> = serde_json::from_str(text)?;
        Ok(Self::from_definitions(definitions))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let definitions: Vec<RequestDefinition> = serde_yaml::from_str(text)?;
        Ok(Self::from_definitions(definitions))
    }

    /// Load a catalog file; `.yml` and `.yaml` are YAML, anything else JSON
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let catalog = if is_yaml(path) {
            Self::from_yaml_str(&text)?
        } else {
            Self::from_json_str(&text)?
        };
        tracing::debug!(path = %path.display(), definitions = catalog.len(), "loaded catalog");
        Ok(catalog)
    }

    /// Add a definition, returning the one it replaced
    pub fn insert(&mut self, definition: RequestDefinition) -> Option<RequestDefinition> {
        let replaced = self.definitions.insert(definition.name.clone(), definition);
        if let Some(old) = &replaced {
            tracing::debug!(name = %old.name, "duplicate definition replaced");
        }
        replaced
    }

    pub fn get(&self, name: &str) -> Option<&RequestDefinition> {
        self.definitions.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RequestDefinition> {
        self.definitions.values()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml"))
        .unwrap_or(false)
}
