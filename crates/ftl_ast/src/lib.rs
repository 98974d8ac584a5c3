//! ftl_ast: Abstract Syntax Tree definitions for FTL localization resources.
//!
//! This crate defines the node types produced by the FTL parser and the
//! loader that decodes the parser's tagged JSON output into them.

pub mod json;
pub mod node;

// Re-export key types
pub use json::{from_json_str, from_json_value, MAX_JSON_DEPTH};
pub use node::*;
