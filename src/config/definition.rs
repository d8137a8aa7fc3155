use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::domain::expand::{JsonWriter, TemplateExpander};
use crate::domain::parameter::{ObjectParameter, Parameter, ParameterCollection};
use crate::domain::slot;
use crate::error::{Error, Result};

const DEFAULT_METHOD: &str = "GET";

/// Outbound request as written by a template author
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct RequestTemplate {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, String>,
    /// JSON body template, or the name of a template held in the context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// How to turn a response into the output document
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ResponseTemplate {
    /// Charset used to decode HTML bodies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<Value>,
}

/// A named request/response pair
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RequestDefinition {
    pub name: String,
    pub request: RequestTemplate,
    #[serde(default)]
    pub response: ResponseTemplate,
}

/// A request with every slot resolved
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltRequest {
    pub url: Url,
    pub method: String,
    pub headers: IndexMap<String, String>,
    pub body: Option<Value>,
}

impl RequestTemplate {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Resolve the URL, headers and body against `ctx`.
    ///
    /// The URL is rendered twice so a parameter substituted into it may
    /// carry slots of its own.
    pub fn build(&self, ctx: &ParameterCollection) -> Result<BuiltRequest> {
        let once = slot::render(&self.url, ctx)?;
        let rendered = slot::render(&once, ctx)?;
        let url = parse_http_url(&rendered)?;

        let method = self
            .method
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_METHOD)
            .to_ascii_uppercase();

        let mut headers = IndexMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            headers.insert(name.clone(), slot::render(value, ctx)?);
        }

        let body = match &self.body {
            Some(template) => expand_document(template, ctx)?,
            None => None,
        };

        tracing::debug!(%url, %method, "built request");
        Ok(BuiltRequest {
            url,
            method,
            headers,
            body,
        })
    }
}

impl ResponseTemplate {
    /// Expand the response template with `response` as the innermost scope.
    /// Without a template the response's own JSON is returned.
    pub fn materialize(&self, ctx: &ParameterCollection, response: ObjectParameter) -> Result<Value> {
        let Some(template) = &self.template else {
            return Ok(response.write_json());
        };

        let mut scope = ctx.clone();
        scope.push(response);
        Ok(expand_document(template, &scope)?.unwrap_or(Value::Null))
    }
}

/// A string template names a template stored in the context
fn expand_document(template: &Value, ctx: &ParameterCollection) -> Result<Option<Value>> {
    let mut expander = TemplateExpander::new();
    let mut writer = JsonWriter::new();
    match template {
        Value::String(name) => {
            if !expander.expand_named(&mut writer, name, ctx)? {
                tracing::debug!(template = %name, "named template not found");
            }
        }
        other => expander.expand(&mut writer, other, ctx)?,
    }
    writer.into_value()
}

fn parse_http_url(text: &str) -> Result<Url> {
    let url = Url::parse(text.trim()).map_err(|e| Error::Url {
        url: text.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(Error::Url {
            url: text.to_string(),
            reason: format!("unsupported scheme '{scheme}'"),
        }),
    }
}
