//! Loader integration tests.
//!
//! Verifies that parser-shaped JSON decodes into the expected tree and that
//! unknown node types are reported with their location.

use ftl_ast::*;
use ftl_diagnostics::Error;

/// Helper: decode JSON that is expected to be a valid resource.
fn load(json: &str) -> Resource {
    match from_json_str(json) {
        Ok(resource) => resource,
        Err(err) => panic!("failed to load resource: {err}\njson: {json}"),
    }
}

/// Helper: decode JSON that must fail with an unrecognized node type.
fn load_unrecognized(json: &str) -> (String, String) {
    match from_json_str(json) {
        Err(Error::UnrecognizedNode { tag, path }) => (tag, path),
        other => panic!("expected an unrecognized node error, got {other:?}"),
    }
}

// ============================================================================
// Entries
// ============================================================================

#[test]
fn test_load_empty_resource() {
    let resource = load(r#"{"type": "Resource", "body": [], "comment": null}"#);
    assert!(resource.body.is_empty());
    assert!(resource.comment.is_none());
}

#[test]
fn test_load_simple_entity() {
    let resource = load(
        r#"{
            "type": "Resource",
            "body": [{
                "type": "Entity",
                "id": {"type": "Identifier", "name": "greeting"},
                "value": {"type": "Pattern", "source": "Hello", "elements": [
                    {"type": "TextElement", "value": "Hello"}
                ]},
                "traits": [],
                "comment": null
            }],
            "comment": null
        }"#,
    );
    assert_eq!(
        resource.body,
        vec![Entry::Entity(Entity::new("greeting", Some(Pattern::text("Hello"))))]
    );
}

#[test]
fn test_load_entity_without_optional_fields() {
    let resource = load(
        r#"{"body": [{"type": "Entity", "id": {"type": "Identifier", "name": "empty"}}]}"#,
    );
    assert_eq!(resource.body, vec![Entry::Entity(Entity::new("empty", None))]);
}

#[test]
fn test_load_comment_and_junk() {
    let resource = load(
        r#"{"body": [
            {"type": "Comment", "content": "one\ntwo"},
            {"type": "JunkEntry", "content": "= broken"}
        ]}"#,
    );
    assert_eq!(
        resource.body,
        vec![Entry::Comment(Comment::new("one\ntwo")), Entry::Junk(Junk {})]
    );
}

#[test]
fn test_load_nested_sections() {
    let resource = load(
        r#"{"body": [{
            "type": "Section",
            "key": {"type": "Keyword", "name": "menu", "namespace": "app"},
            "comment": {"type": "Comment", "content": "Menu strings"},
            "body": [{
                "type": "Section",
                "key": {"type": "Keyword", "name": "file", "namespace": null},
                "body": []
            }]
        }]}"#,
    );
    let expected = Section::new(
        Keyword::namespaced("app", "menu"),
        vec![Entry::Section(Section::new(Keyword::new("file"), vec![]))],
    )
    .with_comment(Comment::new("Menu strings"));
    assert_eq!(resource.body, vec![Entry::Section(expected)]);
}

// ============================================================================
// Patterns & Expressions
// ============================================================================

#[test]
fn test_load_quoted_pattern() {
    let resource = load(
        r#"{"body": [{
            "type": "Entity",
            "id": {"type": "Identifier", "name": "spaced"},
            "value": {"type": "Pattern", "source": "  padded  ", "elements": [], "_quoteDelim": true}
        }]}"#,
    );
    assert_eq!(
        resource.body,
        vec![Entry::Entity(Entity::new("spaced", Some(Pattern::quoted("  padded  "))))]
    );
}

#[test]
fn test_load_quoted_pattern_without_source_fails() {
    let err = from_json_str(
        r#"{"body": [{
            "type": "Entity",
            "id": {"type": "Identifier", "name": "spaced"},
            "value": {"type": "Pattern", "elements": [], "quoted": true}
        }]}"#,
    )
    .unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
}

#[test]
fn test_load_select_expression() {
    let resource = load(
        r#"{"body": [{
            "type": "Entity",
            "id": {"type": "Identifier", "name": "emails"},
            "value": {"type": "Pattern", "elements": [{
                "type": "Placeable",
                "expressions": [{
                    "type": "SelectExpression",
                    "expression": {
                        "type": "CallExpression",
                        "callee": {"type": "BuiltinReference", "name": "PLURAL"},
                        "args": [{"type": "ExternalArgument", "name": "count"}]
                    },
                    "variants": [
                        {"type": "Member", "key": {"type": "Keyword", "name": "one"},
                         "value": {"type": "Pattern", "elements": [{"type": "TextElement", "value": "One email"}]},
                         "default": false},
                        {"type": "Member", "key": {"type": "Keyword", "name": "other"},
                         "value": {"type": "Pattern", "elements": [{"type": "TextElement", "value": "Many emails"}]},
                         "default": true}
                    ]
                }]
            }]}
        }]}"#,
    );

    let select = Expression::select(
        Expression::call(
            Expression::builtin("PLURAL"),
            vec![Expression::external("count").into()],
        ),
        vec![
            Member::new(Expression::keyword(Keyword::new("one")), Pattern::text("One email")),
            Member::new(Expression::keyword(Keyword::new("other")), Pattern::text("Many emails"))
                .into_default(),
        ],
    );
    let expected = Entity::new(
        "emails",
        Some(Pattern::new(vec![PatternElement::placeable(vec![select])])),
    );
    assert_eq!(resource.body, vec![Entry::Entity(expected)]);
}

#[test]
fn test_load_named_and_positional_arguments() {
    let resource = load(
        r#"{"body": [{
            "type": "Entity",
            "id": {"type": "Identifier", "name": "date"},
            "value": {"type": "Pattern", "elements": [{
                "type": "Placeable",
                "expressions": [{
                    "type": "CallExpression",
                    "callee": {"type": "Identifier", "name": "DATETIME"},
                    "args": [
                        {"type": "ExternalArgument", "name": "when"},
                        {"type": "KeyValueArg", "name": "month", "value": {"type": "Keyword", "name": "long"}},
                        {"type": "Number", "value": "2"}
                    ]
                }]
            }]}
        }]}"#,
    );
    let Entry::Entity(entity) = &resource.body[0] else {
        panic!("expected an entity");
    };
    let Some(Pattern::Elements(elements)) = &entity.value else {
        panic!("expected an element pattern");
    };
    let PatternElement::Placeable(placeable) = &elements[0] else {
        panic!("expected a placeable");
    };
    let Expression::CallExpression(call) = &placeable.expressions[0] else {
        panic!("expected a call expression");
    };
    assert_eq!(
        call.args,
        vec![
            Argument::Positional(Expression::external("when")),
            Argument::named("month", Expression::keyword(Keyword::new("long"))),
            Argument::Positional(Expression::number("2")),
        ]
    );
}

#[test]
fn test_load_member_expression_and_entity_reference() {
    let resource = load(
        r#"{"body": [{
            "type": "Entity",
            "id": {"type": "Identifier", "name": "about"},
            "value": {"type": "Pattern", "elements": [
                {"type": "TextElement", "value": "About "},
                {"type": "Placeable", "expressions": [{
                    "type": "MemberExpression",
                    "object": {"type": "EntityReference", "name": "brand"},
                    "keyword": {"type": "Keyword", "name": "short", "namespace": "xul"}
                }]}
            ]}
        }]}"#,
    );
    let expected = Entity::new(
        "about",
        Some(Pattern::new(vec![
            PatternElement::text("About "),
            PatternElement::placeable(vec![Expression::member(
                Expression::entity("brand"),
                Expression::keyword(Keyword::namespaced("xul", "short")),
            )]),
        ])),
    );
    assert_eq!(resource.body, vec![Entry::Entity(expected)]);
}

// ============================================================================
// Unrecognized nodes
// ============================================================================

#[test]
fn test_unrecognized_entry_type() {
    let (tag, path) = load_unrecognized(
        r#"{"body": [
            {"type": "Comment", "content": "ok"},
            {"type": "Macro", "id": {"type": "Identifier", "name": "m"}}
        ]}"#,
    );
    assert_eq!(tag, "Macro");
    assert_eq!(path, "/body/1");
}

#[test]
fn test_unrecognized_expression_type() {
    let (tag, path) = load_unrecognized(
        r#"{"body": [{
            "type": "Entity",
            "id": {"type": "Identifier", "name": "x"},
            "value": {"type": "Pattern", "elements": [
                {"type": "Placeable", "expressions": [{"type": "HashExpression", "name": "h"}]}
            ]}
        }]}"#,
    );
    assert_eq!(tag, "HashExpression");
    assert_eq!(path, "/body/0/value/elements/0/expressions/0");
}

#[test]
fn test_missing_required_field_is_decode_error() {
    let err = from_json_str(r#"{"body": [{"type": "Entity"}]}"#).unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
    assert_eq!(err.code(), 1002);
}

#[test]
fn test_entry_level_rejects_pattern_element() {
    let (tag, path) = load_unrecognized(r#"{"body": [{"type": "TextElement", "value": "x"}]}"#);
    assert_eq!(tag, "TextElement");
    assert_eq!(path, "/body/0");
}

#[test]
fn test_expression_level_rejects_entry() {
    let (tag, path) = load_unrecognized(
        r#"{"body": [{
            "type": "Entity",
            "id": {"type": "Identifier", "name": "x"},
            "value": {"type": "Pattern", "elements": [
                {"type": "Placeable", "expressions": [{"type": "Comment", "content": "c"}]}
            ]}
        }]}"#,
    );
    assert_eq!(tag, "Comment");
    assert_eq!(path, "/body/0/value/elements/0/expressions/0");
}

#[test]
fn test_pattern_elements_reject_expression() {
    let (tag, path) = load_unrecognized(
        r#"{"body": [{
            "type": "Entity",
            "id": {"type": "Identifier", "name": "x"},
            "value": {"type": "Pattern", "elements": [{"type": "ExternalArgument", "name": "a"}]}
        }]}"#,
    );
    assert_eq!(tag, "ExternalArgument");
    assert_eq!(path, "/body/0/value/elements/0");
}

#[test]
fn test_nested_section_body_is_checked() {
    let (tag, path) = load_unrecognized(
        r#"{"body": [{
            "type": "Section",
            "key": {"type": "Keyword", "name": "menu"},
            "body": [{"type": "Member", "key": {"type": "Keyword", "name": "k"}}]
        }]}"#,
    );
    assert_eq!(tag, "Member");
    assert_eq!(path, "/body/0/body/0");
}

#[test]
fn test_named_argument_only_in_call_args() {
    let (tag, path) = load_unrecognized(
        r#"{"body": [{
            "type": "Entity",
            "id": {"type": "Identifier", "name": "x"},
            "value": {"type": "Pattern", "elements": [{"type": "Placeable", "expressions": [
                {"type": "KeyValueArg", "name": "month", "value": {"type": "Keyword", "name": "long"}}
            ]}]}
        }]}"#,
    );
    assert_eq!(tag, "KeyValueArg");
    assert_eq!(path, "/body/0/value/elements/0/expressions/0");
}

#[test]
fn test_numeric_literal_value() {
    let resource = load(
        r#"{"body": [{
            "type": "Entity",
            "id": {"type": "Identifier", "name": "n"},
            "value": {"type": "Pattern", "elements": [{"type": "Placeable", "expressions": [
                {"type": "Number", "value": 3},
                {"type": "Number", "value": -0.5},
                {"type": "Number", "value": "1.50"}
            ]}]}
        }]}"#,
    );
    let expected = Entity::new(
        "n",
        Some(Pattern::new(vec![PatternElement::placeable(vec![
            Expression::number("3"),
            Expression::number("-0.5"),
            Expression::number("1.50"),
        ])])),
    );
    assert_eq!(resource.body, vec![Entry::Entity(expected)]);
}

#[test]
fn test_number_value_must_be_numeral() {
    let err = from_json_str(
        r#"{"body": [{
            "type": "Entity",
            "id": {"type": "Identifier", "name": "n"},
            "value": {"type": "Pattern", "elements": [{"type": "Placeable", "expressions": [
                {"type": "Number", "value": true}
            ]}]}
        }]}"#,
    )
    .unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
}

// ============================================================================
// Nesting
// ============================================================================

/// Helper: `depth` sections nested inside each other around one comment.
fn nested_sections_json(depth: usize) -> String {
    let mut json = String::from(r#"{"type": "Comment", "content": "leaf"}"#);
    for i in 0..depth {
        json = format!(
            r#"{{"type": "Section", "key": {{"type": "Keyword", "name": "s{i}"}}, "body": [{json}]}}"#
        );
    }
    format!(r#"{{"type": "Resource", "body": [{json}]}}"#)
}

#[test]
fn test_load_deeply_nested_sections() {
    let resource = std::thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(|| load(&nested_sections_json(70)))
        .expect("thread should spawn")
        .join()
        .expect("load should not panic");
    let mut depth = 0;
    let mut entry = &resource.body[0];
    while let Entry::Section(section) = entry {
        depth += 1;
        entry = &section.body[0];
    }
    assert_eq!(depth, 70);
    assert_eq!(entry, &Entry::Comment(Comment::new("leaf")));
}

#[test]
fn test_json_nesting_beyond_limit() {
    let json = nested_sections_json(MAX_JSON_DEPTH);
    let err = from_json_str(&json).unwrap_err();
    assert!(matches!(err, Error::NestingTooDeep { limit } if limit == MAX_JSON_DEPTH));
    assert_eq!(err.code(), 1003);
}
