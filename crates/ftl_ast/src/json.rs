//! Loading trees from the parser's JSON output.
//!
//! Every node in the parser output carries a `type` tag. Before decoding,
//! each tag is checked against the node kinds allowed at its position, so an
//! unknown or misplaced node is reported by name and location instead of as
//! a generic shape mismatch.

use ftl_diagnostics::Error;
use serde::Deserialize;
use serde_json::Value;

use crate::node::Resource;

/// Tags accepted at entry level, in a resource or section body.
pub const ENTRY_TYPES: &[&str] = &["Entity", "Comment", "Section", "JunkEntry"];

/// Tags accepted inside a pattern's `elements`.
pub const PATTERN_ELEMENT_TYPES: &[&str] = &["TextElement", "Placeable"];

/// Tags accepted wherever an expression is expected.
pub const EXPRESSION_TYPES: &[&str] = &[
    "Identifier",
    "BuiltinReference",
    "EntityReference",
    "ExternalArgument",
    "SelectExpression",
    "CallExpression",
    "Pattern",
    "Number",
    "Keyword",
    "MemberExpression",
];

/// Deepest array/object nesting accepted from JSON text. Deeper input fails
/// with [`Error::NestingTooDeep`] before any recursive decoding starts.
pub const MAX_JSON_DEPTH: usize = 1024;

/// What a position in the tree may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Resource,
    Entry,
    Comment,
    Identifier,
    Keyword,
    Pattern,
    PatternElement,
    Expression,
    Argument,
    Member,
}

impl Slot {
    fn allows(self, tag: &str) -> bool {
        match self {
            Slot::Resource => tag == "Resource",
            Slot::Entry => ENTRY_TYPES.contains(&tag),
            Slot::Comment => tag == "Comment",
            Slot::Identifier => tag == "Identifier",
            Slot::Keyword => tag == "Keyword",
            Slot::Pattern => tag == "Pattern",
            Slot::PatternElement => PATTERN_ELEMENT_TYPES.contains(&tag),
            Slot::Expression => EXPRESSION_TYPES.contains(&tag),
            Slot::Argument => tag == "KeyValueArg" || EXPRESSION_TYPES.contains(&tag),
            Slot::Member => tag == "Member",
        }
    }

    /// Node kind assumed when the parser left out the `type` tag.
    fn implied_kind(self) -> Option<&'static str> {
        match self {
            Slot::Resource => Some("Resource"),
            Slot::Comment => Some("Comment"),
            Slot::Identifier => Some("Identifier"),
            Slot::Keyword => Some("Keyword"),
            Slot::Pattern => Some("Pattern"),
            Slot::Argument => Some("KeyValueArg"),
            Slot::Member => Some("Member"),
            Slot::Entry | Slot::PatternElement | Slot::Expression => None,
        }
    }
}

/// The slot of `field` inside a node of kind `kind`. Fields holding plain
/// data have none and are not walked.
fn field_slot(kind: &str, field: &str) -> Option<Slot> {
    let slot = match (kind, field) {
        ("Resource" | "Section", "body") => Slot::Entry,
        (_, "comment") => Slot::Comment,
        ("Entity", "id") => Slot::Identifier,
        ("Section", "key") => Slot::Keyword,
        ("Entity" | "Member", "value") => Slot::Pattern,
        ("Entity", "traits") | ("SelectExpression", "variants") => Slot::Member,
        ("Pattern", "elements") => Slot::PatternElement,
        ("Placeable", "expressions")
        | ("SelectExpression", "expression")
        | ("CallExpression", "callee")
        | ("KeyValueArg", "value")
        | ("MemberExpression", "object" | "keyword")
        | ("Member", "key") => Slot::Expression,
        ("CallExpression", "args") => Slot::Argument,
        _ => return None,
    };
    Some(slot)
}

/// Decode a resource from JSON text.
pub fn from_json_str(json: &str) -> Result<Resource, Error> {
    check_json_depth(json, MAX_JSON_DEPTH)?;
    let mut deserializer = serde_json::Deserializer::from_str(json);
    deserializer.disable_recursion_limit();
    let value = Value::deserialize(&mut deserializer)?;
    deserializer.end()?;
    from_json_value(value)
}

/// Decode a resource from an already parsed JSON value.
pub fn from_json_value(value: Value) -> Result<Resource, Error> {
    let mut path = Vec::new();
    check_node(&value, Slot::Resource, &mut path)?;
    Ok(serde_json::from_value(value)?)
}

/// Measure bracket nesting without recursing. Brackets inside strings do not
/// count; malformed text is left for the decoder to report.
fn check_json_depth(json: &str, limit: usize) -> Result<(), Error> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for &byte in json.as_bytes() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                if depth > limit {
                    return Err(Error::NestingTooDeep { limit });
                }
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

fn check_node(value: &Value, slot: Slot, path: &mut Vec<String>) -> Result<(), Error> {
    match value {
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                path.push(i.to_string());
                check_node(child, slot, path)?;
                path.pop();
            }
            Ok(())
        }
        Value::Object(map) => {
            let kind = match map.get("type") {
                Some(Value::String(tag)) => {
                    if !slot.allows(tag) {
                        return Err(Error::UnrecognizedNode {
                            tag: tag.clone(),
                            path: pointer(path),
                        });
                    }
                    tag.as_str()
                }
                // Missing or non-string tags are a shape error for serde.
                _ => match slot.implied_kind() {
                    Some(kind) => kind,
                    None => return Ok(()),
                },
            };
            for (key, child) in map {
                if let Some(child_slot) = field_slot(kind, key) {
                    path.push(key.clone());
                    check_node(child, child_slot, path)?;
                    path.pop();
                }
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn pointer(path: &[String]) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    path.iter().fold(String::new(), |mut acc, segment| {
        acc.push('/');
        acc.push_str(segment);
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer() {
        assert_eq!(pointer(&[]), "/");
        assert_eq!(
            pointer(&["body".to_string(), "3".to_string()]),
            "/body/3"
        );
    }

    #[test]
    fn test_root_with_unknown_type() {
        let err = from_json_str(r#"{"type": "Bundle", "body": []}"#).unwrap_err();
        match err {
            Error::UnrecognizedNode { tag, path } => {
                assert_eq!(tag, "Bundle");
                assert_eq!(path, "/");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_json_is_decode_error() {
        assert!(matches!(from_json_str("{"), Err(Error::Decode(_))));
    }

    #[test]
    fn test_json_depth_counts_brackets_outside_strings() {
        assert!(check_json_depth(r#"{"a": [[1]]}"#, 3).is_ok());
        assert!(matches!(
            check_json_depth(r#"{"a": [[1]]}"#, 2),
            Err(Error::NestingTooDeep { limit: 2 })
        ));
        assert!(check_json_depth(r#"{"a": "[[[{{{\"[["}"#, 1).is_ok());
    }

    #[test]
    fn test_field_slots() {
        assert_eq!(field_slot("Resource", "body"), Some(Slot::Entry));
        assert_eq!(field_slot("Section", "body"), Some(Slot::Entry));
        assert_eq!(field_slot("CallExpression", "args"), Some(Slot::Argument));
        assert_eq!(field_slot("Member", "key"), Some(Slot::Expression));
        assert_eq!(field_slot("TextElement", "value"), None);
        assert_eq!(field_slot("JunkEntry", "content"), None);
    }

    #[test]
    fn test_argument_slot_accepts_expressions_and_named_args() {
        assert!(Slot::Argument.allows("KeyValueArg"));
        assert!(Slot::Argument.allows("Number"));
        assert!(!Slot::Expression.allows("KeyValueArg"));
        assert!(!Slot::Entry.allows("TextElement"));
    }
}
