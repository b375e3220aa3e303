//! Parse-tree nodes.
//!
//! Both parsers produce the same tree shape: non-terminal nodes hold their
//! matched children, terminal nodes hold the consumed token. Rendering is
//! depth-first with indentation proportional to depth.

use std::fmt;

use squill_token::Token;

use crate::kind::NodeKind;

/// A node of the parse tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    kind: NodeKind,
    token: Option<Token>,
    children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    /// A fresh node with no token and no children.
    #[must_use]
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            token: None,
            children: Vec::new(),
        }
    }

    /// A terminal node holding its consumed token.
    #[must_use]
    pub fn terminal(kind: NodeKind, token: Token) -> Self {
        Self {
            kind,
            token: Some(token),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    #[must_use]
    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    #[must_use]
    pub fn children(&self) -> &[SyntaxNode] {
        &self.children
    }

    /// Attach a child at the end.
    pub fn add_child(&mut self, child: SyntaxNode) {
        self.children.push(child);
    }

    /// Undo the most recent [`add_child`](Self::add_child). The rollback
    /// primitive of the backtracking parser; a no-op on a childless node.
    pub fn remove_last_child(&mut self) {
        self.children.pop();
    }

    /// In-order lexemes of all terminal descendants. Structural nodes
    /// contribute nothing; this is the token sequence the tree was built
    /// from.
    #[must_use]
    pub fn terminal_lexemes(&self) -> Vec<String> {
        let mut lexemes = Vec::new();
        self.collect_terminal_lexemes(&mut lexemes);
        lexemes
    }

    fn collect_terminal_lexemes(&self, lexemes: &mut Vec<String>) {
        if let Some(token) = &self.token {
            lexemes.push(token.lexeme.clone());
        }
        for child in &self.children {
            child.collect_terminal_lexemes(lexemes);
        }
    }

    /// Render the tree depth-first, one node per line, two spaces of indent
    /// per level, terminal lexemes in parentheses.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        out.push_str(self.kind.name());
        if let Some(token) = &self.token {
            out.push('(');
            out.push_str(&token.lexeme);
            out.push(')');
        }
        out.push('\n');
        for child in &self.children {
            child.render_into(out, depth + 1);
        }
    }
}

impl fmt::Display for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
