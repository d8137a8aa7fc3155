// Slot templates: `Hello {name}`, `{$.price:F2}`, `{count > '1' ? 's'}`

pub mod lexer;
pub mod pipeline;
mod renderer;

pub use lexer::{CompareOp, SlotLexer, SlotToken};
pub use pipeline::{NumericFormat, PipelineOperation, PipelineRegistry};
pub use renderer::{substring, SlotRenderer};

use std::sync::OnceLock;

use crate::domain::parameter::Parameter;
use crate::error::Result;

/// Render `text` with the built-in format operations
pub fn render(text: &str, ctx: &dyn Parameter) -> Result<String> {
    static RENDERER: OnceLock<SlotRenderer> = OnceLock::new();
    RENDERER.get_or_init(SlotRenderer::new).render(text, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::parameter::{KeyValueParameter, ObjectParameter, ParameterCollection};
    use crate::error::{Error, SlotError};
    use serde_json::json;

    fn context() -> ParameterCollection {
        let mut ctx = ParameterCollection::new();
        ctx.push(
            KeyValueParameter::new()
                .insert("name", "World")
                .insert("count", 3i64)
                .insert("query", "rust lang")
                .insert("empty", ""),
        );
        ctx.push(ObjectParameter::with_json(json!({
            "price": 12.5,
            "tags": ["a", "b"],
            "title": "  The Title  "
        })));
        ctx
    }

    #[test]
    fn test_plain_text_passes_through() {
        let ctx = context();
        assert_eq!(render("no slots here", &ctx).unwrap(), "no slots here");
        assert_eq!(render("", &ctx).unwrap(), "");
        assert_eq!(render("{{literal}}", &ctx).unwrap(), "{literal}");
        assert_eq!(render("a } b { 1 }", &ctx).unwrap(), "a } b { 1 }");
    }

    #[test]
    fn test_references() {
        let ctx = context();
        assert_eq!(render("Hello {name}!", &ctx).unwrap(), "Hello World!");
        assert_eq!(render("{ name }", &ctx).unwrap(), "World");
        assert_eq!(render("[{missing}]", &ctx).unwrap(), "[]");
        assert_eq!(render("{$.price}", &ctx).unwrap(), "12.5");
        assert_eq!(render("{$.tags}", &ctx).unwrap(), r#"["a","b"]"#);
        assert_eq!(render("{$.nope}", &ctx).unwrap(), "");
    }

    #[test]
    fn test_format_chain() {
        let ctx = context();
        assert_eq!(render("{$.price:F2}", &ctx).unwrap(), "12.50");
        assert_eq!(render("q={query:urlEncode}", &ctx).unwrap(), "q=rust%20lang");
        assert_eq!(render("{$.title:Trim:urlEncode}", &ctx).unwrap(), "The%20Title");
        assert_eq!(render("{name:F2}", &ctx).unwrap(), "World");
    }

    #[test]
    fn test_match_and_substring() {
        let ctx = context();
        assert_eq!(render("{name:/or/}", &ctx).unwrap(), "or");
        assert_eq!(render("{name:/xyz/}", &ctx).unwrap(), "");
        assert_eq!(render("{name:[1..3]}", &ctx).unwrap(), "or");
        assert_eq!(render("{name:[^2..]}", &ctx).unwrap(), "ld");
        assert_eq!(render("{name:[0]:urlEncode}", &ctx).unwrap(), "W");
    }

    #[test]
    fn test_truthiness_condition() {
        let ctx = context();
        assert_eq!(render("{name ? 'yes' : 'no'}", &ctx).unwrap(), "yes");
        assert_eq!(render("{empty ? 'yes' : 'no'}", &ctx).unwrap(), "no");
        assert_eq!(render("{missing ? 'yes'}", &ctx).unwrap(), "");
    }

    #[test]
    fn test_comparison_condition() {
        let ctx = context();
        assert_eq!(render("item{count > '1' ? 's'}", &ctx).unwrap(), "items");
        assert_eq!(render("{count == '3' ? 'three' : 'other'}", &ctx).unwrap(), "three");
        assert_eq!(render("{name < '5' ? 'lt' : 'ge'}", &ctx).unwrap(), "ge");
        assert_eq!(
            render("{count >= '3' ? 'Hi {name}' : 'Bye {name}'}", &ctx).unwrap(),
            "Hi World"
        );
    }

    #[test]
    fn test_unchosen_branch_is_not_rendered() {
        let ctx = context();
        // the else branch would fail to render if it were evaluated
        assert_eq!(render("{name ? 'ok' : '{$.[}'}", &ctx).unwrap(), "ok");
    }

    #[test]
    fn test_malformed_slot_fails_whole_render() {
        let ctx = context();
        for text in ["{name", "{name:}", "{name = 'x' ? 'y'}", "{name ? yes}"] {
            assert!(
                matches!(render(text, &ctx), Err(Error::Slot(_))),
                "{text} should fail"
            );
        }
        assert!(matches!(
            render("{name:/(/}", &ctx),
            Err(Error::Slot(SlotError::InvalidRegex { .. }))
        ));
    }

    #[test]
    fn test_custom_operation() {
        struct Upper;
        impl PipelineOperation for Upper {
            fn name(&self) -> &'static str {
                "upper"
            }
            fn apply(&self, value: &str) -> String {
                value.to_uppercase()
            }
        }

        let mut registry = PipelineRegistry::new();
        registry.register(Box::new(Upper));
        let renderer = SlotRenderer::with_registry(registry);
        assert_eq!(renderer.render("{name:upper}", &context()).unwrap(), "WORLD");
    }
}
