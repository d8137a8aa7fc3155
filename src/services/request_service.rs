// Request service - executes request definitions over HTTP

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::{BuiltRequest, RequestDefinition, ResponseTemplate},
    domain::{html::HtmlParser, parameter::ObjectParameter, parameter::ParameterCollection},
    error::{Error, Result},
};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/107.0.0.0 Safari/537.36 Edg/107.0.1418.62";
const TIMEOUT_SECS: u64 = 30;

const APPLICATION_JSON: &str = "application/json";
const TEXT_HTML: &str = "text/html";

/// Turns a request definition into a response scope
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Build and send the request. Returns `None` when the definition has no URL.
    async fn execute(
        &self,
        definition: &RequestDefinition,
        ctx: &ParameterCollection,
    ) -> Result<Option<ObjectParameter>>;
}

pub struct HttpRequestService {
    client: Client,
    html_parser: Option<Arc<dyn HtmlParser>>,
}

impl HttpRequestService {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            html_parser: None,
        }
    }

    /// HTML responses need a parser; without one they are rejected
    pub fn with_html_parser(mut self, parser: Arc<dyn HtmlParser>) -> Self {
        self.html_parser = Some(parser);
        self
    }

    /// Send a built request and wrap the body as a parameter root
    pub async fn send(
        &self,
        request: &BuiltRequest,
        response_template: &ResponseTemplate,
    ) -> Result<ObjectParameter> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| Error::Precondition(format!("invalid HTTP method '{}'", request.method)))?;

        tracing::info!(%method, url = %request.url, "sending request");
        let mut builder = self.client.request(method, request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, url = %request.url, "request failed");
        }
        let response = response.error_for_status()?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();

        match media_type(&content_type).as_str() {
            APPLICATION_JSON => {
                let bytes = response.bytes().await?;
                let root: Value = serde_json::from_slice(&bytes)?;
                Ok(ObjectParameter::with_json(root))
            }
            TEXT_HTML => {
                let parser = self
                    .html_parser
                    .as_ref()
                    .ok_or_else(|| Error::Html("no HTML parser configured".to_string()))?;
                let text = match response_template.encoding.as_deref() {
                    Some(label) => decode(&response.bytes().await?, label)?,
                    None => response.text().await?,
                };
                let root = parser.parse(&text).map_err(Error::Html)?;
                Ok(ObjectParameter::with_html(root))
            }
            _ => Err(Error::UnsupportedContentType(content_type)),
        }
    }

    /// Execute a definition and materialize its response template
    pub async fn run(
        &self,
        definition: &RequestDefinition,
        ctx: &ParameterCollection,
    ) -> Result<Option<Value>> {
        match self.execute(definition, ctx).await? {
            Some(response) => Ok(Some(definition.response.materialize(ctx, response)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl RequestHandler for HttpRequestService {
    async fn execute(
        &self,
        definition: &RequestDefinition,
        ctx: &ParameterCollection,
    ) -> Result<Option<ObjectParameter>> {
        if definition.request.url.trim().is_empty() {
            tracing::debug!(name = %definition.name, "definition has no url, skipped");
            return Ok(None);
        }
        let request = definition.request.build(ctx)?;
        self.send(&request, &definition.response).await.map(Some)
    }
}

/// Decode with the configured encoding, whatever charset the server declared
fn decode(bytes: &[u8], label: &str) -> Result<String> {
    let encoding = encoding_rs::Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| Error::UnknownEncoding(label.to_string()))?;
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!(encoding = encoding.name(), "malformed bytes replaced while decoding");
    }
    Ok(text.into_owned())
}

/// `text/html; charset=utf-8` -> `text/html`
fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
