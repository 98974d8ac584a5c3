//! ftl_diagnostics: Errors and diagnostic messages for the FTL tooling.
//!
//! Every failure the AST loader or the serializer can raise is an [`Error`].
//! Errors and warnings are also available as coded [`Diagnostic`]s built
//! from the message table in [`messages`], so tools can report them the same
//! way regardless of where they came from.

use std::fmt;

/// Diagnostic category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    Warning,
    Error,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Warning => write!(f, "warning"),
            DiagnosticCategory::Error => write!(f, "error"),
        }
    }
}

/// A diagnostic message template with a code and category.
#[derive(Debug, Clone)]
pub struct DiagnosticMessage {
    /// The diagnostic code (e.g., 1001, 2001).
    pub code: u32,
    /// The category of this diagnostic.
    pub category: DiagnosticCategory,
    /// The message template string. May contain `{0}`, `{1}`, etc. placeholders.
    pub message: &'static str,
}

/// A realized diagnostic with an optional location and resolved message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Where in the tree this diagnostic applies, e.g. `/body/3/body/0`.
    pub location: Option<String>,
    /// The resolved message text.
    pub message_text: String,
    /// The diagnostic code.
    pub code: u32,
    /// The category.
    pub category: DiagnosticCategory,
}

impl Diagnostic {
    /// Create a new diagnostic without location info.
    pub fn new(message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            location: None,
            message_text: format_message(message.message, args),
            code: message.code,
            category: message.category,
        }
    }

    /// Create a new diagnostic attached to a location in the tree.
    pub fn with_location(location: String, message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            location: Some(location),
            ..Self::new(message, args)
        }
    }

    /// Whether this is an error diagnostic.
    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref location) = self.location {
            write!(f, "{}: ", location)?;
        }
        write!(f, "{} FTL{}: {}", self.category, self.code, self.message_text)
    }
}

/// Format a diagnostic message template by replacing `{0}`, `{1}`, etc. with arguments.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{}}}", i), arg);
    }
    result
}

/// Diagnostics accumulated while processing a tree.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticCollection {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.category == DiagnosticCategory::Warning)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn clear(&mut self) {
        self.diagnostics.clear();
    }
}

/// Errors raised while loading or serializing a tree.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A node carried a `type` tag outside the closed set of node kinds.
    #[error("unrecognized node type `{tag}` at {path}")]
    UnrecognizedNode { tag: String, path: String },

    /// The tree did not have the shape of an FTL resource.
    #[error("malformed AST: {0}")]
    Decode(#[from] serde_json::Error),

    /// The tree nests deeper than the configured limit.
    #[error("nesting depth exceeds the limit of {limit}")]
    NestingTooDeep { limit: usize },

    /// A serializer option holds a value it cannot work with.
    #[error("invalid option `{name}`: {reason}")]
    InvalidOption {
        name: &'static str,
        reason: &'static str,
    },
}

impl Error {
    /// The message template this error is reported with.
    pub fn message(&self) -> &'static DiagnosticMessage {
        match self {
            Error::UnrecognizedNode { .. } => &messages::UNRECOGNIZED_NODE,
            Error::Decode(_) => &messages::MALFORMED_AST,
            Error::NestingTooDeep { .. } => &messages::NESTING_TOO_DEEP,
            Error::InvalidOption { .. } => &messages::INVALID_OPTION,
        }
    }

    pub fn code(&self) -> u32 {
        self.message().code
    }

    /// Convert into a coded diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Error::UnrecognizedNode { tag, path } => {
                Diagnostic::with_location(path.clone(), self.message(), &[tag.as_str()])
            }
            Error::Decode(err) => Diagnostic::new(self.message(), &[err.to_string().as_str()]),
            Error::NestingTooDeep { limit } => {
                Diagnostic::new(self.message(), &[limit.to_string().as_str()])
            }
            Error::InvalidOption { name, reason } => Diagnostic::new(self.message(), &[*name, *reason]),
        }
    }
}

// ============================================================================
// Diagnostic Messages
// ============================================================================

pub mod messages {
    use super::*;

    macro_rules! diag {
        ($code:expr, Error, $msg:expr) => {
            DiagnosticMessage {
                code: $code,
                category: DiagnosticCategory::Error,
                message: $msg,
            }
        };
        ($code:expr, Warning, $msg:expr) => {
            DiagnosticMessage {
                code: $code,
                category: DiagnosticCategory::Warning,
                message: $msg,
            }
        };
    }

    // Loading errors (1000-1099)
    pub const UNRECOGNIZED_NODE: DiagnosticMessage = diag!(1001, Error, "Unrecognized node type '{0}'.");
    pub const MALFORMED_AST: DiagnosticMessage = diag!(1002, Error, "Malformed AST: {0}");
    pub const NESTING_TOO_DEEP: DiagnosticMessage = diag!(1003, Error, "Nesting depth exceeds the limit of {0}.");
    pub const INVALID_OPTION: DiagnosticMessage = diag!(1004, Error, "Invalid option '{0}': {1}.");

    // Serializer warnings (2000-2099)
    pub const JUNK_ENTRY_DROPPED: DiagnosticMessage = diag!(2001, Warning, "Junk entry was dropped from the output.");
}
