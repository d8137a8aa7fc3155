// Common test utilities shared across test files

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    Router,
};
use slotquery::HtmlNode;
use std::sync::{Arc, Mutex, Once};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

static INIT: Once = Once::new();

/// Route tracing output through the test harness. Silent unless RUST_LOG is set.
#[allow(dead_code)]
pub fn init_test_logging() {
    INIT.call_once(|| {
        if std::env::var("RUST_LOG").is_err() {
            return;
        }
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Minimal in-memory DOM.
///
/// `select("/tag")` finds all descendants named `tag`; `select("a/b")` walks
/// direct children.
#[derive(Debug)]
pub struct FakeNode {
    pub tag: String,
    pub text: String,
    pub children: Vec<Arc<FakeNode>>,
}

#[allow(dead_code)]
pub fn element(tag: &str, text: &str, children: Vec<Arc<FakeNode>>) -> Arc<FakeNode> {
    Arc::new(FakeNode {
        tag: tag.to_string(),
        text: text.to_string(),
        children,
    })
}

fn descendants(node: &FakeNode, tag: &str, out: &mut Vec<Arc<dyn HtmlNode>>) {
    for child in &node.children {
        if child.tag == tag {
            out.push(child.clone());
        }
        descendants(child, tag, out);
    }
}

impl HtmlNode for FakeNode {
    fn select(&self, path: &str) -> Vec<Arc<dyn HtmlNode>> {
        if let Some(tag) = path.strip_prefix('/') {
            let mut out = Vec::new();
            descendants(self, tag, &mut out);
            return out;
        }

        let mut segments = path.split('/');
        let Some(first) = segments.next() else {
            return Vec::new();
        };
        let mut current: Vec<Arc<FakeNode>> = self
            .children
            .iter()
            .filter(|c| c.tag == first)
            .cloned()
            .collect();
        for segment in segments {
            current = current
                .iter()
                .flat_map(|node| node.children.iter().filter(|c| c.tag == segment).cloned())
                .collect();
        }
        current
            .into_iter()
            .map(|node| node as Arc<dyn HtmlNode>)
            .collect()
    }

    fn text(&self) -> String {
        let mut text = self.text.clone();
        for child in &self.children {
            text.push_str(&child.text());
        }
        text
    }
}

/// `<ul><li><a>Dune</a><span>1965</span></li>...</ul>` as a fake tree
#[allow(dead_code)]
pub fn book_list() -> Arc<FakeNode> {
    let item = |title: &str, year: &str| {
        element(
            "li",
            "",
            vec![element("a", title, vec![]), element("span", year, vec![])],
        )
    };
    element(
        "html",
        "",
        vec![element(
            "body",
            "",
            vec![
                element("h1", "Books", vec![]),
                element(
                    "ul",
                    "",
                    vec![item("Dune", "1965"), item("Solaris", "1961")],
                ),
            ],
        )],
    )
}

/// What the test server saw
#[derive(Debug)]
pub struct RecordedRequest {
    pub method: String,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: String,
}

/// Serve a canned HTTP response from a throwaway router on a random local port.
///
/// Returns the base URL and a receiver for the first request received.
#[allow(dead_code)]
pub async fn serve_once(
    status: u16,
    content_type: &'static str,
    body: impl Into<Vec<u8>>,
) -> (String, oneshot::Receiver<RecordedRequest>) {
    let (tx, rx) = oneshot::channel();
    let tx = Arc::new(Mutex::new(Some(tx)));
    let status = StatusCode::from_u16(status).unwrap();
    let body: Vec<u8> = body.into();

    let app = Router::new().fallback(move |request: Request| {
        let tx = tx.clone();
        let body = body.clone();
        async move {
            let (parts, request_body) = request.into_parts();
            let bytes = axum::body::to_bytes(request_body, usize::MAX).await.unwrap();
            let recorded = RecordedRequest {
                method: parts.method.to_string(),
                uri: parts.uri.to_string(),
                headers: parts.headers,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            };
            if let Some(tx) = tx.lock().unwrap().take() {
                let _ = tx.send(recorded);
            }
            (status, [(header::CONTENT_TYPE, content_type)], body)
        }
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), rx)
}
