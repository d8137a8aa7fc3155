// Path query engine: `$.store.book[?(@.price < 10)].title`

mod evaluator;
pub mod reader;
pub mod value;

pub use reader::{Checkpoint, FilterOperator, PathReader, Token};
pub use value::PathValue;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{PathError, Result};
use evaluator::Evaluator;

/// Evaluate `path` against `root`.
///
/// Returns `None` when nothing matched. Wildcards, deep scans, lists, slices
/// and filters produce an array; a single index or name produces the value
/// itself.
pub fn evaluate(root: &Value, path: &str) -> std::result::Result<Option<Value>, PathError> {
    let selection = Evaluator::new(root, path).run()?;
    if selection == evaluator::Selection::Undefined {
        tracing::trace!(path, "path matched nothing");
    }
    Ok(selection.into_value())
}

/// Evaluate `path` and deserialize the match
pub fn read_value<T: DeserializeOwned>(root: &Value, path: &str) -> Result<Option<T>> {
    match evaluate(root, path)? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Length in bytes of the path at the start of `text`, which may continue
/// with unrelated characters
pub fn embedded_len(text: &str) -> std::result::Result<usize, PathError> {
    PathReader::embedded(text).read_to_end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bookstore() -> Value {
        json!({
            "store": {
                "book": [
                    {"category": "reference", "author": "Nigel Rees", "title": "Sayings", "price": 8.95},
                    {"category": "fiction", "author": "Evelyn Waugh", "title": "Sword", "price": 12.99},
                    {"category": "fiction", "author": "Herman Melville", "title": "Moby Dick", "isbn": "0-553", "price": 8.99},
                    {"category": "fiction", "author": "J. R. R. Tolkien", "title": "The Lord", "isbn": "0-395", "price": 22.99}
                ],
                "bicycle": {"color": "red", "price": 19.95}
            },
            "expensive": 10
        })
    }

    #[test]
    fn test_root_identity() {
        let doc = bookstore();
        assert_eq!(evaluate(&doc, "$").unwrap(), Some(doc.clone()));
    }

    #[test]
    fn test_child_lookup() {
        let doc = bookstore();
        assert_eq!(
            evaluate(&doc, "$.store.bicycle.color").unwrap(),
            Some(json!("red"))
        );
        assert_eq!(evaluate(&doc, "$.store.car").unwrap(), None);
        assert_eq!(evaluate(&doc, "$.expensive.deeper").unwrap(), None);
    }

    #[test]
    fn test_projection_and_wildcard() {
        let doc = bookstore();
        assert_eq!(
            evaluate(&doc, "$.store.book[*].author").unwrap(),
            Some(json!(["Nigel Rees", "Evelyn Waugh", "Herman Melville", "J. R. R. Tolkien"]))
        );
        assert_eq!(
            evaluate(&doc, "$.store.book.price").unwrap(),
            Some(json!([8.95, 12.99, 8.99, 22.99]))
        );
    }

    #[test]
    fn test_deep_scan_stops_at_first_match() {
        let doc = bookstore();
        assert_eq!(
            evaluate(&doc, "$..price").unwrap(),
            Some(json!([8.95, 12.99, 8.99, 22.99, 19.95]))
        );
        let nested = json!({"a": {"id": 1, "child": {"id": 2}}});
        assert_eq!(evaluate(&nested, "$..id").unwrap(), Some(json!([1])));
    }

    #[test]
    fn test_indices() {
        let doc = bookstore();
        assert_eq!(
            evaluate(&doc, "$.store.book[-1].title").unwrap(),
            Some(json!("The Lord"))
        );
        assert_eq!(
            evaluate(&doc, "$.store.book[0,2].title").unwrap(),
            Some(json!(["Sayings", "Moby Dick"]))
        );
        assert_eq!(
            evaluate(&doc, "$.store.book[1:2].title").unwrap(),
            Some(json!(["Sword", "Moby Dick"]))
        );
    }

    #[test]
    fn test_huge_indices_miss() {
        let doc = json!([1, 2, 3]);
        assert_eq!(evaluate(&doc, "$[99999999999999999999]").unwrap(), None);
        assert_eq!(evaluate(&doc, "$[-99999999999999999999]").unwrap(), None);
        assert_eq!(
            evaluate(&doc, "$[0,99999999999999999999]").unwrap(),
            Some(json!([1]))
        );
        assert_eq!(
            evaluate(&doc, "$[-99999999999999999999:99999999999999999999]").unwrap(),
            Some(json!([1, 2, 3]))
        );
    }

    #[test]
    fn test_filters() {
        let doc = bookstore();
        assert_eq!(
            evaluate(&doc, "$.store.book[?(@.isbn)].title").unwrap(),
            Some(json!(["Moby Dick", "The Lord"]))
        );
        assert_eq!(
            evaluate(&doc, "$.store.book[?(@.price < $.expensive)].title").unwrap(),
            Some(json!(["Sayings", "Moby Dick"]))
        );
        assert_eq!(
            evaluate(&doc, "$.store.book[?(@.category == 'reference')].author").unwrap(),
            Some(json!(["Nigel Rees"]))
        );
        assert_eq!(
            evaluate(&doc, "$.store.book[?(@.author =~ /melville/i)].title").unwrap(),
            Some(json!(["Moby Dick"]))
        );
        assert_eq!(
            evaluate(&doc, "$.store.book[?(@.price > 100)]").unwrap(),
            Some(json!([]))
        );
    }

    #[test]
    fn test_membership_filters() {
        let doc = json!({"items": [
            {"id": 1, "tags": ["a", "b"]},
            {"id": 2, "tags": ["c"]},
            {"id": 3, "tags": []}
        ]});
        assert_eq!(
            evaluate(&doc, "$.items[?(@.id in [1, 3])].id").unwrap(),
            Some(json!([1, 3]))
        );
        assert_eq!(
            evaluate(&doc, "$.items[?(@.id nin [1, 3])].id").unwrap(),
            Some(json!([2]))
        );
        assert_eq!(
            evaluate(&doc, "$.items[?(@.tags anyof ['b', 'c'])].id").unwrap(),
            Some(json!([1, 2]))
        );
        assert_eq!(
            evaluate(&doc, "$.items[?(@.tags subsetof ['a', 'b'])].id").unwrap(),
            Some(json!([1, 3]))
        );
        assert_eq!(
            evaluate(&doc, "$.items[?(@.tags noneof ['a'])].id").unwrap(),
            Some(json!([2, 3]))
        );
        assert_eq!(
            evaluate(&doc, "$.items[?(@.tags size 2)].id").unwrap(),
            Some(json!([1]))
        );
        assert_eq!(
            evaluate(&doc, "$.items[?(@.tags empty)].id").unwrap(),
            Some(json!([3]))
        );
    }

    #[test]
    fn test_errors() {
        let doc = bookstore();
        assert!(matches!(
            evaluate(&doc, "$.store.book[?(@.price < 10)"),
            Err(PathError::Unterminated { .. })
        ));
        assert!(matches!(
            evaluate(&doc, "$.store..[0]"),
            Err(PathError::Syntax { .. })
        ));
        assert!(matches!(
            evaluate(&doc, "$.store.book[?(@.title =~ /(/)]"),
            Err(PathError::InvalidRegex { .. })
        ));
    }

    #[test]
    fn test_read_value() {
        let doc = bookstore();
        let price: Option<f64> = read_value(&doc, "$.store.bicycle.price").unwrap();
        assert_eq!(price, Some(19.95));
        let titles: Option<Vec<String>> = read_value(&doc, "$.store.book[:1].title").unwrap();
        assert_eq!(titles, Some(vec!["Sayings".to_string(), "Sword".to_string()]));
        let missing: Option<String> = read_value(&doc, "$.nope").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_embedded_len() {
        assert_eq!(embedded_len("$.a.b:F2").unwrap(), 5);
        assert_eq!(embedded_len("$['x y'] rest").unwrap(), 8);
    }
}
