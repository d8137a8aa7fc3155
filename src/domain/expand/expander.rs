// Walks a JSON template and rebuilds it with slots and array templates resolved

use serde_json::{Map, Value};

use super::hooks::{ExpandHooks, NoHooks};
use super::writer::JsonWriter;
use crate::domain::parameter::{ObjectParameter, Parameter, ParameterCollection};
use crate::domain::slot::SlotRenderer;
use crate::domain::value::ParameterValue;
use crate::error::Result;

const PATH_KEY: &str = "path";
const TEMPLATE_KEY: &str = "template";

/// Template expansion engine.
///
/// String leaves go through the slot renderer. An array element shaped
/// `{"path": ..., "template": ...}` is an array template: `template` is
/// expanded once per element found at `path`.
pub struct TemplateExpander<H = NoHooks> {
    hooks: H,
    renderer: SlotRenderer,
}

impl TemplateExpander<NoHooks> {
    pub fn new() -> Self {
        Self::with_hooks(NoHooks)
    }
}

impl Default for TemplateExpander<NoHooks> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ExpandHooks> TemplateExpander<H> {
    pub fn with_hooks(hooks: H) -> Self {
        Self {
            hooks,
            renderer: SlotRenderer::new(),
        }
    }

    pub fn with_renderer(mut self, renderer: SlotRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn into_hooks(self) -> H {
        self.hooks
    }

    /// Expand `template` into `writer`.
    ///
    /// Any parameter works as context; hooks always see it as a scope stack.
    pub fn expand(
        &mut self,
        writer: &mut JsonWriter,
        template: &Value,
        ctx: &dyn Parameter,
    ) -> Result<()> {
        let scope = ParameterCollection::scope_of(ctx);
        self.write_node(writer, template, &scope, None)
    }

    /// Expand the template stored under `name` in `ctx`.
    ///
    /// Returns false, writing nothing, when `name` does not resolve.
    pub fn expand_named(
        &mut self,
        writer: &mut JsonWriter,
        name: &str,
        ctx: &dyn Parameter,
    ) -> Result<bool> {
        let scope = ParameterCollection::scope_of(ctx);
        match named_template(name, &scope)? {
            Some(template) => {
                self.write_node(writer, &template, &scope, None)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Expand into a fresh document
    pub fn expand_to_value(&mut self, template: &Value, ctx: &dyn Parameter) -> Result<Value> {
        let mut writer = JsonWriter::new();
        self.expand(&mut writer, template, ctx)?;
        Ok(writer.into_value()?.unwrap_or(Value::Null))
    }

    fn write_node(
        &mut self,
        writer: &mut JsonWriter,
        template: &Value,
        ctx: &ParameterCollection,
        property: Option<&str>,
    ) -> Result<()> {
        match template {
            Value::Object(map) => self.write_object(writer, map, ctx, property),
            Value::Array(items) => self.write_array(writer, items, ctx, property),
            leaf => {
                if let Some(name) = property {
                    writer.write_property_name(name)?;
                }
                let value = self.leaf_value(leaf, ctx)?;
                writer.write_value(value)
            }
        }
    }

    fn write_object(
        &mut self,
        writer: &mut JsonWriter,
        map: &Map<String, Value>,
        ctx: &ParameterCollection,
        property: Option<&str>,
    ) -> Result<()> {
        self.hooks.before_start_object(writer, property, ctx)?;
        if let Some(name) = property {
            writer.write_property_name(name)?;
        }
        writer.write_start_object()?;
        self.hooks.after_start_object(writer, property, ctx)?;

        for (name, value) in map {
            match value {
                Value::Object(_) | Value::Array(_) => {
                    self.write_node(writer, value, ctx, Some(name))?
                }
                leaf => {
                    if !self.hooks.before_property(writer, name, leaf, ctx)? {
                        writer.write_property_name(name)?;
                        let value = self.leaf_value(leaf, ctx)?;
                        writer.write_value(value)?;
                    }
                    self.hooks.after_property(writer, name, leaf, ctx)?;
                }
            }
        }

        self.hooks.before_end_object(writer, property, ctx)?;
        writer.write_end_object()?;
        self.hooks.after_end_object(writer, property, ctx)
    }

    fn write_array(
        &mut self,
        writer: &mut JsonWriter,
        items: &[Value],
        ctx: &ParameterCollection,
        property: Option<&str>,
    ) -> Result<()> {
        self.hooks.before_start_array(writer, property, ctx)?;
        if let Some(name) = property {
            writer.write_property_name(name)?;
        }
        writer.write_start_array()?;
        self.hooks.after_start_array(writer, property, ctx)?;

        self.write_elements(writer, items, ctx)?;

        self.hooks.before_end_array(writer, property, ctx)?;
        writer.write_end_array()?;
        self.hooks.after_end_array(writer, property, ctx)
    }

    fn write_elements(
        &mut self,
        writer: &mut JsonWriter,
        items: &[Value],
        ctx: &ParameterCollection,
    ) -> Result<()> {
        for item in items {
            match item {
                Value::Object(map) => match array_template(map) {
                    Some((path, template)) => self.write_array_template(writer, path, template, ctx)?,
                    None => self.write_object(writer, map, ctx, None)?,
                },
                other => self.write_node(writer, other, ctx, None)?,
            }
        }
        Ok(())
    }

    fn write_array_template(
        &mut self,
        writer: &mut JsonWriter,
        path: &Value,
        template: &Value,
        ctx: &ParameterCollection,
    ) -> Result<()> {
        match template {
            Value::Object(_) => self.repeat(writer, path, template, ctx),
            // nested entries share the current scope
            Value::Array(entries) => self.write_elements(writer, entries, ctx),
            Value::String(name) => match named_template(name, ctx)? {
                Some(named) => self.repeat(writer, path, &named, ctx),
                None => {
                    tracing::debug!(template = %name, "named array template not found");
                    Ok(())
                }
            },
            other => {
                tracing::debug!(template = %other, "array template is not an object, array or name");
                Ok(())
            }
        }
    }

    /// Expand `template` once per element addressed by each path
    fn repeat(
        &mut self,
        writer: &mut JsonWriter,
        path: &Value,
        template: &Value,
        ctx: &ParameterCollection,
    ) -> Result<()> {
        let paths: Vec<&str> = match path {
            Value::String(path) => vec![path.as_str()],
            Value::Array(paths) => paths.iter().filter_map(Value::as_str).collect(),
            other => {
                tracing::debug!(path = %other, "array template path is not a string or list");
                Vec::new()
            }
        };

        for path in paths {
            let elements: Vec<ObjectParameter> = match ctx.resolve(path)? {
                ParameterValue::Json(Value::Array(items)) => {
                    items.into_iter().map(ObjectParameter::with_json).collect()
                }
                ParameterValue::Json(single) => vec![ObjectParameter::with_json(single)],
                ParameterValue::Html(html) => {
                    html.nodes().into_iter().map(ObjectParameter::with_html).collect()
                }
                ParameterValue::Undefined => {
                    tracing::trace!(path, "array template path matched nothing");
                    continue;
                }
                other => {
                    tracing::debug!(path, kind = other.kind(), "array template path is not a collection");
                    continue;
                }
            };

            let mut scope = ctx.clone();
            scope.pop_object_scope();
            for element in elements {
                scope.push(element);
                self.write_node(writer, template, &scope, None)?;
                scope.pop();
            }
        }
        Ok(())
    }

    fn leaf_value(&self, leaf: &Value, ctx: &ParameterCollection) -> Result<Value> {
        match leaf {
            Value::String(text) => {
                let rendered = self.renderer.render(text, ctx)?;
                Ok(match parse_bool(&rendered) {
                    Some(flag) => Value::Bool(flag),
                    None => Value::String(rendered),
                })
            }
            other => Ok(other.clone()),
        }
    }
}

fn array_template(map: &Map<String, Value>) -> Option<(&Value, &Value)> {
    Some((map.get(PATH_KEY)?, map.get(TEMPLATE_KEY)?))
}

fn named_template(name: &str, ctx: &ParameterCollection) -> Result<Option<Value>> {
    let value = ctx.resolve(name)?;
    if value.is_undefined() {
        return Ok(None);
    }
    Ok(Some(value.to_json()))
}

/// `true`/`false`, ignoring case and surrounding whitespace
fn parse_bool(text: &str) -> Option<bool> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
