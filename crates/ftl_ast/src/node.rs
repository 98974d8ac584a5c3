//! AST node definitions for FTL resources.
//!
//! Every category that the parser tags with a `type` field is a closed enum
//! here, so consumers dispatch with exhaustive `match`es. Nodes own their
//! children; the tree is built once and only read afterwards.

use serde::Deserialize;

// ============================================================================
// Resource & Entries
// ============================================================================

/// The root of a parsed FTL file.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Resource {
    pub body: Vec<Entry>,
    #[serde(default)]
    pub comment: Option<Comment>,
}

impl Resource {
    pub fn new(body: Vec<Entry>) -> Self {
        Self { body, comment: None }
    }

    pub fn with_comment(mut self, comment: Comment) -> Self {
        self.comment = Some(comment);
        self
    }
}

/// A top-level or section-nested unit of a resource.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum Entry {
    Entity(Entity),
    Comment(Comment),
    Section(Section),
    /// Text the parser could not structure. Never re-emitted.
    #[serde(rename = "JunkEntry")]
    Junk(Junk),
}

/// A named translatable unit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Entity {
    pub id: Identifier,
    #[serde(default)]
    pub value: Option<Pattern>,
    #[serde(default)]
    pub traits: Vec<Member>,
    #[serde(default)]
    pub comment: Option<Comment>,
}

impl Entity {
    pub fn new(id: impl Into<String>, value: Option<Pattern>) -> Self {
        Self {
            id: Identifier::new(id),
            value,
            traits: Vec::new(),
            comment: None,
        }
    }

    pub fn with_traits(mut self, traits: Vec<Member>) -> Self {
        self.traits = traits;
        self
    }

    pub fn with_comment(mut self, comment: Comment) -> Self {
        self.comment = Some(comment);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Comment {
    pub content: String,
}

impl Comment {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// A `[[ key ]]` header followed by its own entries.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Section {
    pub key: Keyword,
    #[serde(default)]
    pub comment: Option<Comment>,
    #[serde(default)]
    pub body: Vec<Entry>,
}

impl Section {
    pub fn new(key: Keyword, body: Vec<Entry>) -> Self {
        Self {
            key,
            comment: None,
            body,
        }
    }

    pub fn with_comment(mut self, comment: Comment) -> Self {
        self.comment = Some(comment);
        self
    }
}

/// Marker for unparseable input. Any fields the parser attached are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Junk {}

// ============================================================================
// Names
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Identifier {
    pub name: String,
}

impl Identifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A possibly namespaced keyword such as `long` or `app/menu`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Keyword {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
}

impl Keyword {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
        }
    }

    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: Some(namespace.into()),
        }
    }

    /// The namespace, treating an empty string as absent.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref().filter(|ns| !ns.is_empty())
    }
}

// ============================================================================
// Patterns
// ============================================================================

/// The value syntax of an entity or member.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawPattern")]
pub enum Pattern {
    /// A `"..."` literal, kept verbatim.
    Quoted { source: String },
    Elements(Vec<PatternElement>),
}

impl Pattern {
    pub fn new(elements: Vec<PatternElement>) -> Self {
        Pattern::Elements(elements)
    }

    /// A pattern holding a single text element.
    pub fn text(value: impl Into<String>) -> Self {
        Pattern::Elements(vec![PatternElement::text(value)])
    }

    pub fn quoted(source: impl Into<String>) -> Self {
        Pattern::Quoted {
            source: source.into(),
        }
    }
}

/// Pattern as the parser emits it: quoting is a flag next to the elements.
#[derive(Deserialize)]
struct RawPattern {
    #[serde(default)]
    elements: Vec<PatternElement>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default, rename = "_quoteDelim", alias = "quoted")]
    quote_delim: bool,
}

impl TryFrom<RawPattern> for Pattern {
    type Error = &'static str;

    fn try_from(raw: RawPattern) -> Result<Self, Self::Error> {
        if !raw.quote_delim {
            return Ok(Pattern::Elements(raw.elements));
        }
        match raw.source {
            Some(source) => Ok(Pattern::Quoted { source }),
            None => Err("quoted pattern is missing its `source`"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum PatternElement {
    TextElement(TextElement),
    Placeable(Placeable),
}

impl PatternElement {
    pub fn text(value: impl Into<String>) -> Self {
        PatternElement::TextElement(TextElement {
            value: value.into(),
        })
    }

    pub fn placeable(expressions: Vec<Expression>) -> Self {
        PatternElement::Placeable(Placeable::new(expressions))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TextElement {
    pub value: String,
}

/// One or more expressions between `{` and `}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Placeable {
    pub expressions: Vec<Expression>,
}

impl Placeable {
    pub fn new(expressions: Vec<Expression>) -> Self {
        Self { expressions }
    }
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum Expression {
    Identifier(Identifier),
    BuiltinReference(Identifier),
    EntityReference(Identifier),
    ExternalArgument(Identifier),
    SelectExpression(SelectExpression),
    CallExpression(CallExpression),
    Pattern(Pattern),
    Number(Number),
    Keyword(Keyword),
    MemberExpression(MemberExpression),
}

impl Expression {
    pub fn identifier(name: impl Into<String>) -> Self {
        Expression::Identifier(Identifier::new(name))
    }

    pub fn builtin(name: impl Into<String>) -> Self {
        Expression::BuiltinReference(Identifier::new(name))
    }

    pub fn entity(name: impl Into<String>) -> Self {
        Expression::EntityReference(Identifier::new(name))
    }

    pub fn external(name: impl Into<String>) -> Self {
        Expression::ExternalArgument(Identifier::new(name))
    }

    pub fn number(value: impl Into<String>) -> Self {
        Expression::Number(Number {
            value: value.into(),
        })
    }

    pub fn keyword(keyword: Keyword) -> Self {
        Expression::Keyword(keyword)
    }

    pub fn select(selector: Expression, variants: Vec<Member>) -> Self {
        Expression::SelectExpression(SelectExpression {
            expression: Box::new(selector),
            variants,
        })
    }

    pub fn call(callee: Expression, args: Vec<Argument>) -> Self {
        Expression::CallExpression(CallExpression {
            callee: Box::new(callee),
            args,
        })
    }

    pub fn member(object: Expression, keyword: Expression) -> Self {
        Expression::MemberExpression(MemberExpression {
            object: Box::new(object),
            keyword: Box::new(keyword),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SelectExpression {
    /// The selector.
    pub expression: Box<Expression>,
    pub variants: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CallExpression {
    pub callee: Box<Expression>,
    #[serde(default)]
    pub args: Vec<Argument>,
}

/// A call argument: `name: value` or a bare expression.
///
/// Named arguments are tried first; no expression node has both a `name`
/// and a `value` field, so the two shapes never overlap.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Argument {
    KeyValue(KeyValueArg),
    Positional(Expression),
}

impl Argument {
    pub fn named(name: impl Into<String>, value: Expression) -> Self {
        Argument::KeyValue(KeyValueArg {
            name: name.into(),
            value,
        })
    }
}

impl From<Expression> for Argument {
    fn from(expr: Expression) -> Self {
        Argument::Positional(expr)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KeyValueArg {
    pub name: String,
    pub value: Expression,
}

/// A numeral, kept exactly as written.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Number {
    /// Parsers may emit the numeral as a JSON string or a JSON number. A JSON
    /// number is kept in serde_json's canonical text, so `1.50` sent as a
    /// number reads back as `1.5`.
    #[serde(deserialize_with = "numeral")]
    pub value: String,
}

fn numeral<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Numeral {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Numeral::deserialize(deserializer)? {
        Numeral::Text(text) => text,
        Numeral::Number(number) => number.to_string(),
    })
}

/// `object[keyword]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MemberExpression {
    pub object: Box<Expression>,
    pub keyword: Box<Expression>,
}

// ============================================================================
// Members
// ============================================================================

/// A variant of a select expression, or a trait of an entity.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Member {
    pub key: Expression,
    pub value: Pattern,
    #[serde(default)]
    pub default: bool,
}

impl Member {
    pub fn new(key: Expression, value: Pattern) -> Self {
        Self {
            key,
            value,
            default: false,
        }
    }

    /// Mark this member as the default variant.
    pub fn into_default(mut self) -> Self {
        self.default = true;
        self
    }
}
