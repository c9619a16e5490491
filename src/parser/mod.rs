//! Markup Parser
//!
//! Turns template text into an addressable element tree. Parsing is
//! permissive: malformed markup still yields a tree, never an error.

pub mod lexer;
pub mod tree;

pub use lexer::{tokenize, Token};
pub use tree::{eq_ignore_case, Document, Element, Node, NodeId, NodeKind};

/// Parse a whole document into a tree rooted at a synthetic root node
pub fn parse_document(text: &str) -> Document {
    Document::from_tokens(lexer::tokenize(text))
}
