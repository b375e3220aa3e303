//! Grammar model for the squill SQL toolchain.
//!
//! [`NodeKind`] enumerates the terminals and non-terminals of the SELECT
//! grammar; [`Grammar`] holds each non-terminal's alternatives and derives
//! FIRST/FOLLOW sets from them; [`SyntaxNode`] is the parse-tree node both
//! parsers produce.

mod grammar;
mod kind;
mod tree;

pub use grammar::{Grammar, Occurs, Symbol};
pub use kind::NodeKind;
pub use tree::SyntaxNode;
