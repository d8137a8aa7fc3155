// Integration tests for JSON template expansion

use proptest::prelude::*;
use serde_json::{json, Value};
use slotquery::{
    ExpandHooks, JsonWriter, KeyValueParameter, ObjectParameter, ParameterCollection,
    TemplateExpander,
};

mod common;

fn expand(template: &Value, ctx: &ParameterCollection) -> Value {
    TemplateExpander::new().expand_to_value(template, ctx).unwrap()
}

fn json_ctx(root: Value) -> ParameterCollection {
    let mut ctx = ParameterCollection::new();
    ctx.push(ObjectParameter::with_json(root));
    ctx
}

#[test]
fn test_array_template_preserves_order() {
    let ctx = json_ctx(json!({"items": [{"id": 1}, {"id": 2}]}));
    let template = json!([{"path": "$.items[*]", "template": {"id": "{$.id}"}}]);
    assert_eq!(expand(&template, &ctx), json!([{"id": "1"}, {"id": "2"}]));
}

#[test]
fn test_request_body_shape() {
    let mut ctx = ParameterCollection::new();
    ctx.push(
        KeyValueParameter::new()
            .insert("keyword", "space opera")
            .insert("page", 3i64)
            .insert("adult", false),
    );
    ctx.push(ObjectParameter::with_json(json!({
        "filters": [{"field": "genre", "value": "sf"}, {"field": "lang", "value": "en"}]
    })));

    let template = json!({
        "query": {"text": "{keyword}", "page": "{page}", "size": 20},
        "safe": "{adult}",
        "filters": [
            {"path": "$.filters[*]", "template": {"{$.field}": "literal key", "value": "{$.value}"}}
        ]
    });
    assert_eq!(
        expand(&template, &ctx),
        json!({
            "query": {"text": "space opera", "page": "3", "size": 20},
            "safe": false,
            "filters": [
                {"{$.field}": "literal key", "value": "sf"},
                {"{$.field}": "literal key", "value": "en"}
            ]
        })
    );
}

#[test]
fn test_html_array_template() {
    common::init_test_logging();
    let mut ctx = ParameterCollection::new();
    ctx.push(ObjectParameter::with_html(common::book_list()));

    let template = json!({
        "heading": "{/body/h1}",
        "books": [{"path": "//li", "template": {"title": "{/a}", "year": "{/span}"}}]
    });
    assert_eq!(
        expand(&template, &ctx),
        json!({
            "heading": "Books",
            "books": [
                {"title": "Dune", "year": "1965"},
                {"title": "Solaris", "year": "1961"}
            ]
        })
    );
}

#[test]
fn test_nested_array_of_entries() {
    let ctx = json_ctx(json!({"a": [1, 2], "b": [3]}));
    let template = json!([{
        "path": "ignored",
        "template": [
            {"path": "$.a[*]", "template": {"v": "{$}"}},
            {"path": "$.b[*]", "template": {"v": "{$}"}}
        ]
    }]);
    assert_eq!(expand(&template, &ctx), json!([{"v": "1"}, {"v": "2"}, {"v": "3"}]));
}

#[test]
fn test_expand_named_top_level() {
    let mut ctx = json_ctx(json!({"user": {"login": "ursula"}}));
    ctx.push(KeyValueParameter::new().insert("profile", json!({"who": "{$.user.login}"})));

    let mut writer = JsonWriter::new();
    let found = TemplateExpander::new()
        .expand_named(&mut writer, "profile", &ctx)
        .unwrap();
    assert!(found);
    assert_eq!(writer.into_value().unwrap(), Some(json!({"who": "ursula"})));
}

#[test]
fn test_expand_against_single_parameter() {
    let params = KeyValueParameter::new().insert("keyword", "dune");
    let value = TemplateExpander::new()
        .expand_to_value(&json!({"q": "{keyword}", "n": "{missing}"}), &params)
        .unwrap();
    assert_eq!(value, json!({"q": "dune", "n": ""}));

    let mut writer = JsonWriter::new();
    let root = ObjectParameter::with_json(json!({"id": 7}));
    let found = TemplateExpander::new()
        .expand_named(&mut writer, "$", &root)
        .unwrap();
    assert!(found);
    assert_eq!(writer.into_value().unwrap(), Some(json!({"id": 7})));
}

struct PropertyCounter {
    properties: usize,
    arrays: usize,
}

impl ExpandHooks for PropertyCounter {
    fn after_property(
        &mut self,
        _writer: &mut JsonWriter,
        _name: &str,
        _template: &Value,
        _ctx: &ParameterCollection,
    ) -> slotquery::Result<()> {
        self.properties += 1;
        Ok(())
    }

    fn after_start_array(
        &mut self,
        writer: &mut JsonWriter,
        _property: Option<&str>,
        _ctx: &ParameterCollection,
    ) -> slotquery::Result<()> {
        self.arrays += 1;
        // decorate every array with a leading marker element
        writer.write_value(json!("start"))
    }
}

#[test]
fn test_hooks_decorate_output() {
    let ctx = json_ctx(json!({"items": [{"id": 1}]}));
    let mut expander = TemplateExpander::with_hooks(PropertyCounter {
        properties: 0,
        arrays: 0,
    });
    let value = expander
        .expand_to_value(
            &json!({"a": 1, "list": [{"path": "$.items", "template": {"id": "{$.id}"}}]}),
            &ctx,
        )
        .unwrap();
    assert_eq!(value, json!({"a": 1, "list": ["start", {"id": "1"}]}));
    assert_eq!(expander.hooks().properties, 2);
    assert_eq!(expander.hooks().arrays, 1);
}

fn arb_literal() -> impl Strategy<Value = Value> {
    // plain text only: no braces and nothing that reads as a boolean
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(Value::from),
        "[a-z0-9 .,-]{0,10}"
            .prop_filter("boolean text", |s| {
                !matches!(s.trim(), "true" | "false")
            })
            .prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,5}", inner, 0..4)
                .prop_filter("array template shape", |m| {
                    !(m.contains_key("path") && m.contains_key("template"))
                })
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn prop_literal_templates_round_trip(template in arb_literal()) {
        let ctx = json_ctx(json!({"unused": true}));
        prop_assert_eq!(expand(&template, &ctx), template);
    }
}
