//! ftl_serializer: AST to FTL source text.
//!
//! Converts a parsed FTL resource back into its canonical textual form. The
//! output re-parses to the same tree, so tools can load a resource, edit the
//! tree, and write valid source back out.

use ftl_ast::*;
use ftl_diagnostics::{messages, Diagnostic, DiagnosticCollection, Error};
use memchr::memchr_iter;
use rayon::prelude::*;
use serde::Deserialize;
use tracing::{debug, trace, warn};

/// Prefix of every physical line of a multi-line text element.
const TEXT_CONTINUATION: &str = "\n  | ";

/// Prefix of every line of a comment.
const COMMENT_MARKER: &str = "# ";

/// Options for the serializer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SerializerOptions {
    /// Indent width of select variants and entity traits. A default member
    /// replaces the last space with `*`.
    pub member_indent: usize,
    /// Maximum nesting of sections and expressions before serialization fails.
    pub max_depth: usize,
}

impl Default for SerializerOptions {
    fn default() -> Self {
        Self {
            member_indent: 2,
            max_depth: 256,
        }
    }
}

impl SerializerOptions {
    /// Load options from a JSON object such as `{"memberIndent": 4}`.
    /// Missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let options: SerializerOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Check values the serializer cannot work with. A member indent of zero
    /// leaves no room for the default marker.
    pub fn validate(&self) -> Result<(), Error> {
        if self.member_indent == 0 {
            return Err(Error::InvalidOption {
                name: "memberIndent",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}

/// Serialize a resource with the default options.
pub fn serialize(resource: &Resource) -> Result<String, Error> {
    Serializer::new().serialize_resource(resource)
}

/// Decode the parser's JSON output and serialize it.
pub fn serialize_json(json: &str) -> Result<String, Error> {
    let resource = ftl_ast::from_json_str(json)?;
    serialize(&resource)
}

/// Serialize many resources in parallel. Results are in input order.
pub fn serialize_all(
    resources: &[Resource],
    options: &SerializerOptions,
) -> Vec<Result<String, Error>> {
    debug!(resources = resources.len(), "serializing batch");
    resources
        .par_iter()
        .map(|resource| Serializer::with_options(options.clone()).serialize_resource(resource))
        .collect()
}

/// The serializer converts AST nodes to FTL text.
pub struct Serializer {
    output: String,
    depth: usize,
    /// Index path of the entry being printed, used to locate diagnostics.
    entry_path: Vec<usize>,
    options: SerializerOptions,
    diagnostics: DiagnosticCollection,
}

impl Serializer {
    pub fn new() -> Self {
        Self::with_options(SerializerOptions::default())
    }

    pub fn with_options(options: SerializerOptions) -> Self {
        Self {
            output: String::with_capacity(4096),
            depth: 0,
            entry_path: Vec::new(),
            options,
            diagnostics: DiagnosticCollection::new(),
        }
    }

    pub fn options(&self) -> &SerializerOptions {
        &self.options
    }

    /// Diagnostics recorded so far, e.g. dropped junk entries.
    pub fn diagnostics(&self) -> &DiagnosticCollection {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> DiagnosticCollection {
        std::mem::take(&mut self.diagnostics)
    }

    /// Serialize a whole resource.
    pub fn serialize_resource(&mut self, resource: &Resource) -> Result<String, Error> {
        self.reset()?;
        debug!(entries = resource.body.len(), "serializing resource");

        if let Some(comment) = &resource.comment {
            self.print_comment(comment);
            self.write("\n\n");
        }
        self.print_entries(&resource.body)?;

        debug!(bytes = self.output.len(), "resource serialized");
        Ok(std::mem::take(&mut self.output))
    }

    /// Serialize a single entry, including the newlines that follow it.
    pub fn serialize_entry(&mut self, entry: &Entry) -> Result<String, Error> {
        self.reset()?;
        self.print_entry(entry)?;
        Ok(std::mem::take(&mut self.output))
    }

    /// Serialize a value pattern. An absent pattern yields an empty string.
    pub fn serialize_pattern(&mut self, pattern: Option<&Pattern>) -> Result<String, Error> {
        self.reset()?;
        self.print_pattern(pattern)?;
        Ok(std::mem::take(&mut self.output))
    }

    fn reset(&mut self) -> Result<(), Error> {
        self.options.validate()?;
        self.output.clear();
        self.depth = 0;
        self.entry_path.clear();
        Ok(())
    }

    // ========================================================================
    // Entry printing
    // ========================================================================

    fn print_entries(&mut self, body: &[Entry]) -> Result<(), Error> {
        for (i, entry) in body.iter().enumerate() {
            self.entry_path.push(i);
            self.print_entry(entry)?;
            self.entry_path.pop();
        }
        Ok(())
    }

    fn print_entry(&mut self, entry: &Entry) -> Result<(), Error> {
        match entry {
            Entry::Entity(n) => {
                self.print_entity(n)?;
                self.write("\n");
            }
            Entry::Comment(n) => {
                self.print_comment(n);
                self.write("\n\n");
            }
            Entry::Section(n) => {
                self.print_section(n)?;
                self.write("\n");
            }
            Entry::Junk(_) => {
                let location = self.entry_location();
                trace!(location = %location, "dropping junk entry");
                self.diagnostics.add(Diagnostic::with_location(
                    location,
                    &messages::JUNK_ENTRY_DROPPED,
                    &[],
                ));
            }
        }
        Ok(())
    }

    fn print_entity(&mut self, entity: &Entity) -> Result<(), Error> {
        if let Some(comment) = &entity.comment {
            self.print_comment(comment);
            self.write("\n");
        }
        self.write(&entity.id.name);
        self.write(" = ");
        self.print_pattern(entity.value.as_ref())?;

        if !entity.traits.is_empty() {
            self.write("\n");
            self.print_members(&entity.traits)?;
        }
        Ok(())
    }

    fn print_comment(&mut self, comment: &Comment) {
        self.write(COMMENT_MARKER);
        self.write_replacing_newlines(&comment.content, "\n# ");
    }

    fn print_section(&mut self, section: &Section) -> Result<(), Error> {
        self.enter()?;
        if let Some(comment) = &section.comment {
            self.print_comment(comment);
            self.write("\n");
        }
        self.write("[[ ");
        self.print_keyword(&section.key);
        self.write(" ]]\n\n");
        self.print_entries(&section.body)?;
        self.leave();
        Ok(())
    }

    // ========================================================================
    // Pattern printing
    // ========================================================================

    fn print_pattern(&mut self, pattern: Option<&Pattern>) -> Result<(), Error> {
        match pattern {
            None => {}
            Some(Pattern::Quoted { source }) => {
                self.write("\"");
                self.write(source);
                self.write("\"");
            }
            Some(Pattern::Elements(elements)) => {
                for element in elements {
                    match element {
                        PatternElement::TextElement(text) => self.print_text(&text.value),
                        PatternElement::Placeable(placeable) => self.print_placeable(placeable)?,
                    }
                }
            }
        }
        Ok(())
    }

    fn print_text(&mut self, value: &str) {
        if memchr::memchr(b'\n', value.as_bytes()).is_none() {
            self.write(value);
            return;
        }
        self.write(TEXT_CONTINUATION);
        self.write_replacing_newlines(value, TEXT_CONTINUATION);
    }

    fn print_placeable(&mut self, placeable: &Placeable) -> Result<(), Error> {
        self.write("{ ");
        for (i, expr) in placeable.expressions.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.print_expression(expr)?;
        }
        // A select expression already ends its line.
        if self.output.ends_with('\n') {
            self.write("}");
        } else {
            self.write(" }");
        }
        Ok(())
    }

    // ========================================================================
    // Expression printing
    // ========================================================================

    fn print_expression(&mut self, expr: &Expression) -> Result<(), Error> {
        self.enter()?;
        match expr {
            Expression::Identifier(id)
            | Expression::BuiltinReference(id)
            | Expression::EntityReference(id) => self.write(&id.name),
            Expression::ExternalArgument(id) => {
                self.write("$");
                self.write(&id.name);
            }
            Expression::SelectExpression(n) => {
                self.print_expression(&n.expression)?;
                self.write(" ->\n");
                self.print_members(&n.variants)?;
                self.write("\n");
            }
            Expression::CallExpression(n) => {
                self.print_expression(&n.callee)?;
                self.write("(");
                self.print_call_args(&n.args)?;
                self.write(")");
            }
            Expression::Pattern(pattern) => self.print_pattern(Some(pattern))?,
            Expression::Number(n) => self.write(&n.value),
            Expression::Keyword(kw) => self.print_keyword(kw),
            Expression::MemberExpression(n) => {
                self.print_expression(&n.object)?;
                self.write("[");
                self.print_expression(&n.keyword)?;
                self.write("]");
            }
        }
        self.leave();
        Ok(())
    }

    fn print_call_args(&mut self, args: &[Argument]) -> Result<(), Error> {
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            match arg {
                Argument::KeyValue(kv) => {
                    self.write(&kv.name);
                    self.write(": ");
                    self.print_expression(&kv.value)?;
                }
                Argument::Positional(expr) => self.print_expression(expr)?,
            }
        }
        Ok(())
    }

    fn print_keyword(&mut self, keyword: &Keyword) {
        if let Some(namespace) = keyword.namespace() {
            self.write(namespace);
            self.write("/");
        }
        self.write(&keyword.name);
    }

    /// Print variants or traits, one per line, without a trailing newline.
    fn print_members(&mut self, members: &[Member]) -> Result<(), Error> {
        let indent = self.options.member_indent;
        for (i, member) in members.iter().enumerate() {
            if i > 0 {
                self.write("\n");
            }
            if member.default {
                self.write_spaces(indent - 1);
                self.write("*");
            } else {
                self.write_spaces(indent);
            }
            self.write("[");
            self.print_expression(&member.key)?;
            self.write("] ");
            self.print_pattern(Some(&member.value))?;
        }
        Ok(())
    }

    // ========================================================================
    // Nesting guard
    // ========================================================================

    fn enter(&mut self) -> Result<(), Error> {
        let limit = self.options.max_depth;
        if self.depth >= limit {
            warn!(limit, "nesting limit reached, aborting serialization");
            return Err(Error::NestingTooDeep { limit });
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn entry_location(&self) -> String {
        if self.entry_path.is_empty() {
            return "/".to_string();
        }
        let mut location = String::new();
        for index in &self.entry_path {
            location.push_str("/body/");
            location.push_str(&index.to_string());
        }
        location
    }

    // ========================================================================
    // Core write helpers
    // ========================================================================

    fn write(&mut self, s: &str) {
        self.output.push_str(s);
    }

    fn write_spaces(&mut self, count: usize) {
        for _ in 0..count {
            self.output.push(' ');
        }
    }

    /// Write `text` with every line break replaced by `separator`.
    fn write_replacing_newlines(&mut self, text: &str, separator: &str) {
        let mut start = 0;
        for pos in memchr_iter(b'\n', text.as_bytes()) {
            self.write(&text[start..pos]);
            self.write(separator);
            start = pos + 1;
        }
        self.write(&text[start..]);
    }
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}
