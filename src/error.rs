// Error handling for slotquery

use thiserror::Error;

/// Errors raised while reading or evaluating a path query
#[derive(Debug, Error)]
pub enum PathError {
    #[error("Invalid path syntax at position {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("{construct} not terminated at position {position}")]
    Unterminated {
        construct: &'static str,
        position: usize,
    },

    #[error("Invalid regex '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl PathError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        PathError::Syntax {
            position,
            message: message.into(),
        }
    }
}

/// Errors raised while rendering slot text
#[derive(Debug, Error)]
pub enum SlotError {
    #[error("Invalid slot syntax at position {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("Invalid regex '{pattern}' in slot: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Path in slot failed: {0}")]
    Path(#[from] PathError),
}

impl SlotError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        SlotError::Syntax {
            position,
            message: message.into(),
        }
    }
}

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Slot(#[from] SlotError),

    /// A caller broke an API contract, e.g. pushed a scalar onto an object scope
    #[error("Precondition violated: {0}")]
    Precondition(String),

    #[error("Invalid writer state: {0}")]
    Writer(&'static str),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL '{url}': {reason}")]
    Url { url: String, reason: String },

    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("HTML error: {0}")]
    Html(String),

    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_error_mentions_position() {
        let err = PathError::syntax(4, "unexpected character 'x'");
        assert_eq!(
            err.to_string(),
            "Invalid path syntax at position 4: unexpected character 'x'"
        );
    }

    #[test]
    fn test_unterminated_message() {
        let err = PathError::Unterminated {
            construct: "Filter",
            position: 9,
        };
        assert_eq!(err.to_string(), "Filter not terminated at position 9");
    }

    #[test]
    fn test_slot_error_wraps_path_error() {
        let err: Error = SlotError::from(PathError::syntax(1, "bad")).into();
        assert!(matches!(err, Error::Slot(SlotError::Path(_))));
        assert!(err.to_string().contains("position 1"));
    }
}
