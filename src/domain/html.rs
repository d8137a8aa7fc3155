// HTML document capability

use std::fmt;
use std::sync::Arc;

/// A navigable HTML node supplied by an external DOM/XPath implementation
pub trait HtmlNode: fmt::Debug + Send + Sync {
    /// Evaluate an XPath-like expression relative to this node
    fn select(&self, path: &str) -> Vec<Arc<dyn HtmlNode>>;

    /// Text content of the node
    fn text(&self) -> String;
}

/// Turns raw HTML text into a root node
pub trait HtmlParser: Send + Sync {
    fn parse(&self, html: &str) -> Result<Arc<dyn HtmlNode>, String>;
}

/// A single node or an ordered node set
#[derive(Debug, Clone)]
pub enum HtmlValue {
    Node(Arc<dyn HtmlNode>),
    Nodes(Vec<Arc<dyn HtmlNode>>),
}

impl HtmlValue {
    /// Select from this value. Returns `None` when nothing matched.
    ///
    /// A node set is searched node by node and the matches are concatenated.
    pub fn select(&self, path: &str) -> Option<HtmlValue> {
        let mut found = match self {
            HtmlValue::Node(node) => node.select(path),
            HtmlValue::Nodes(nodes) => nodes.iter().flat_map(|n| n.select(path)).collect(),
        };

        match found.len() {
            0 => None,
            1 => found.pop().map(HtmlValue::Node),
            _ => Some(HtmlValue::Nodes(found)),
        }
    }

    /// Node text, or one line per node for a node set
    pub fn text(&self) -> String {
        match self {
            HtmlValue::Node(node) => node.text(),
            HtmlValue::Nodes(nodes) => nodes
                .iter()
                .map(|n| n.text())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// The individual nodes, in document order
    pub fn nodes(&self) -> Vec<Arc<dyn HtmlNode>> {
        match self {
            HtmlValue::Node(node) => vec![node.clone()],
            HtmlValue::Nodes(nodes) => nodes.clone(),
        }
    }
}
