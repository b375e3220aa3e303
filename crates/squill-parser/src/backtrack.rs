//! The backtracking state-graph parser.
//!
//! Construction mirrors the grammar: one builder per non-terminal, each
//! allocating fresh states for its sub-graph and wiring epsilon edges for
//! alternatives, optional parts and repetition. States are tagged with the
//! grammar node they stand for; visiting a tagged state instantiates a
//! parse-tree node under the current instance of its parent template and
//! detaches it again if every outgoing path fails. "First successful path
//! wins": candidates are tried in construction order.

use squill_grammar::{NodeKind, SyntaxNode};
use squill_token::{Token, TokenKind};
use tracing::trace;

use crate::error::ParseError;
use crate::state::{PStateId, StateGraph, TemplateId};

/// Index of an instantiated parse-tree node in the per-parse arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AstId(usize);

#[derive(Debug, Clone)]
struct AstNode {
    kind: NodeKind,
    token: Option<Token>,
    children: Vec<AstId>,
}

/// Backtracking parser over a token stream.
///
/// The graph is built once per parser; [`NfaParser::parse`] may be called
/// repeatedly and resets the per-parse tree arena each time.
pub struct NfaParser {
    tokens: Vec<Token>,
    graph: StateGraph,
    init: PStateId,
    root_template: TemplateId,

    // per-parse match state
    ast: Vec<AstNode>,
    current: Vec<Option<AstId>>,
    furthest: usize,
}

impl NfaParser {
    /// Build the state graph for the SELECT grammar over `tokens`.
    ///
    /// The `End` sentinel is appended here; callers pass the raw lexer
    /// output.
    #[must_use]
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::End) {
            tokens.push(Token::end());
        }

        let mut parser = Self {
            tokens,
            graph: StateGraph::default(),
            init: PStateId(0),
            root_template: TemplateId(0),
            ast: Vec::new(),
            current: Vec::new(),
            furthest: 0,
        };

        let start = parser.graph.alloc_state();
        let (root_start, root_end) = parser.build_root();
        parser.graph.add_epsilon(start, root_start);

        let finished = parser.graph.alloc_state();
        let end_template = parser.graph.alloc_template(NodeKind::End);
        parser.graph.states[finished.0].node = Some(end_template);
        parser.graph.add_edge(root_end, TokenKind::End, finished);

        parser.init = start;
        parser
    }

    /// Run the backtracking match and extract the tree.
    pub fn parse(&mut self) -> Result<SyntaxNode, ParseError> {
        self.ast.clear();
        self.current = vec![None; self.graph.templates.len()];
        self.furthest = 0;

        if self.match_state(self.init, 0, None) {
            let root = self.current[self.root_template.0]
                .expect("root instantiated on successful match");
            Ok(self.extract(root))
        } else {
            Err(ParseError::at(&self.tokens, self.furthest))
        }
    }

    // -----------------------------------------------------------------------
    // Matching
    // -----------------------------------------------------------------------

    fn match_state(&mut self, state: PStateId, index: usize, took: Option<Token>) -> bool {
        // Optimistic attach: instantiate the grammar node this state stands
        // for before we know whether the path survives.
        let node_template = self.graph.states[state.0].node;
        let parent_template = self.graph.states[state.0].parent;
        let mut attached = None;
        if let Some(template) = node_template {
            let kind = self.graph.kind_of(template);
            trace!(node = %kind, index, "matching started");

            let instance = AstId(self.ast.len());
            self.ast.push(AstNode {
                kind,
                token: took,
                children: Vec::new(),
            });

            let parent_instance = parent_template.map(|p| {
                let parent = self.current[p.0].expect("parent instantiated before child");
                self.ast[parent.0].children.push(instance);
                parent
            });
            let saved = self.current[template.0].replace(instance);
            attached = Some((template, saved, parent_instance));
        }

        if index == self.tokens.len() {
            return true;
        }

        let lookahead = self.tokens[index].kind;
        let by_token = self.graph.states[state.0]
            .lookup(lookahead)
            .map(<[PStateId]>::to_vec);
        if let Some(candidates) = by_token {
            let consumed = self.tokens[index].clone();
            for next in candidates {
                if self.match_state(next, index + 1, Some(consumed.clone())) {
                    return true;
                }
            }
        } else {
            let candidates = self.graph.states[state.0].epsilon.clone();
            for next in candidates {
                if self.match_state(next, index, None) {
                    return true;
                }
            }
        }

        // Every path out of this state failed: detach the optimistically
        // attached node so the tree is exactly as it was before the attempt.
        if let Some((template, saved, parent_instance)) = attached {
            if let Some(parent) = parent_instance {
                self.ast[parent.0].children.pop();
            }
            self.current[template.0] = saved;
            trace!(node = %self.graph.kind_of(template), index, "matching failed");
        }
        self.furthest = self.furthest.max(index);
        false
    }

    fn extract(&self, id: AstId) -> SyntaxNode {
        let node = &self.ast[id.0];
        let mut out = match &node.token {
            Some(token) => SyntaxNode::terminal(node.kind, token.clone()),
            None => SyntaxNode::new(node.kind),
        };
        for &child in &node.children {
            out.add_child(self.extract(child));
        }
        out
    }

    // -----------------------------------------------------------------------
    // Graph construction, one builder per non-terminal
    // -----------------------------------------------------------------------

    /// Allocate a state carrying a fresh template under `parent`.
    fn tagged_state(&mut self, kind: NodeKind, parent: TemplateId) -> (PStateId, TemplateId) {
        let state = self.graph.alloc_state();
        let template = self.graph.alloc_template(kind);
        self.graph.tag(state, template, parent);
        (state, template)
    }

    fn build_root(&mut self) -> (PStateId, PStateId) {
        let start = self.graph.alloc_state();
        let root = self.graph.alloc_template(NodeKind::Root);
        self.graph.states[start.0].node = Some(root);
        self.root_template = root;

        let (stmt_start, stmt_end) = self.build_select_statement(root);
        let (term_start, term_end) = self.build_statement_terminator(root);
        let end = self.graph.alloc_state();

        self.graph.add_epsilon(start, stmt_start);
        self.graph.add_epsilon(stmt_end, term_start);
        self.graph.add_epsilon(stmt_end, end);
        self.graph.add_epsilon(term_end, end);

        (start, end)
    }

    fn build_select_statement(&mut self, parent: TemplateId) -> (PStateId, PStateId) {
        let (start, stmt) = self.tagged_state(NodeKind::SelectStatement, parent);
        let (select_kw, _) = self.tagged_state(NodeKind::SelectKeyword, stmt);
        let (columns_start, columns_end) = self.build_column_list(stmt);
        let (from_kw, _) = self.tagged_state(NodeKind::FromKeyword, stmt);
        let (table_start, table_end) = self.build_table_name(stmt);
        let (where_start, where_end) = self.build_where_clause(stmt);
        let end = self.graph.alloc_state();

        self.graph.add_edge(start, TokenKind::Select, select_kw);
        self.graph.add_epsilon(select_kw, columns_start);
        self.graph.add_edge(columns_end, TokenKind::From, from_kw);
        self.graph.add_epsilon(from_kw, table_start);
        self.graph.add_epsilon(table_end, where_start);
        self.graph.add_epsilon(table_end, end);
        self.graph.add_epsilon(where_end, end);

        (start, end)
    }

    fn build_column_list(&mut self, parent: TemplateId) -> (PStateId, PStateId) {
        let (start, list) = self.tagged_state(NodeKind::ColumnList, parent);
        let (first_start, first_end) = self.build_column_identifier(list);
        let (rest_start, rest_end) = self.build_other_columns(list);
        let end = self.graph.alloc_state();

        self.graph.add_epsilon(start, first_start);
        self.graph.add_epsilon(first_end, rest_start);
        self.graph.add_epsilon(first_end, end);
        // repetition: loop the tail production back on itself
        self.graph.add_epsilon(rest_end, rest_start);
        self.graph.add_epsilon(rest_end, end);

        (start, end)
    }

    fn build_column_identifier(&mut self, parent: TemplateId) -> (PStateId, PStateId) {
        let (start, ident) = self.tagged_state(NodeKind::ColumnIdentifier, parent);
        let (cwa_start, cwa_end) = self.build_column_with_alias(ident);
        let end = self.graph.alloc_state();

        self.graph.add_epsilon(start, cwa_start);
        self.graph.add_epsilon(cwa_end, end);

        (start, end)
    }

    fn build_other_columns(&mut self, parent: TemplateId) -> (PStateId, PStateId) {
        let (start, other) = self.tagged_state(NodeKind::OtherColumns, parent);
        let (comma, _) = self.tagged_state(NodeKind::CommaOperator, other);
        let (cwa_start, cwa_end) = self.build_column_with_alias(other);
        let end = self.graph.alloc_state();

        self.graph.add_edge(start, TokenKind::Comma, comma);
        self.graph.add_epsilon(comma, cwa_start);
        self.graph.add_epsilon(cwa_end, end);

        (start, end)
    }

    fn build_column_with_alias(&mut self, parent: TemplateId) -> (PStateId, PStateId) {
        let (start, cwa) = self.tagged_state(NodeKind::ColumnWithAlias, parent);
        let (expr_start, expr_end) = self.build_column_expression(cwa);
        let (alias_start, alias_end) = self.build_alias_name(cwa);
        let end = self.graph.alloc_state();

        self.graph.add_epsilon(start, expr_start);
        self.graph.add_epsilon(expr_end, alias_start);
        self.graph.add_epsilon(expr_end, end);
        self.graph.add_epsilon(alias_end, end);

        (start, end)
    }

    fn build_column_expression(&mut self, parent: TemplateId) -> (PStateId, PStateId) {
        let (start, expr) = self.tagged_state(NodeKind::ColumnExpression, parent);
        let (name_start, name_end) = self.build_column_name(expr);
        let (rest_start, rest_end) = self.build_other_expression(expr);
        let end = self.graph.alloc_state();

        self.graph.add_epsilon(start, name_start);
        self.graph.add_epsilon(name_end, rest_start);
        self.graph.add_epsilon(name_end, end);
        self.graph.add_epsilon(rest_end, rest_start);
        self.graph.add_epsilon(rest_end, end);

        (start, end)
    }

    fn build_column_name(&mut self, parent: TemplateId) -> (PStateId, PStateId) {
        let (start, name) = self.tagged_state(NodeKind::ColumnName, parent);
        let (ident, _) = self.tagged_state(NodeKind::Identifier, name);
        let (lit_start, lit_end) = self.build_literal_expression(name);
        let end = self.graph.alloc_state();

        self.graph.add_edge(start, TokenKind::Identifier, ident);
        self.graph.add_epsilon(start, lit_start);
        self.graph.add_epsilon(ident, end);
        self.graph.add_epsilon(lit_end, end);

        (start, end)
    }

    fn build_other_expression(&mut self, parent: TemplateId) -> (PStateId, PStateId) {
        let (start, other) = self.tagged_state(NodeKind::OtherExpression, parent);
        let (op_start, op_end) = self.build_expression_operator(other);
        let (name_start, name_end) = self.build_column_name(other);
        let end = self.graph.alloc_state();

        self.graph.add_epsilon(start, op_start);
        self.graph.add_epsilon(op_end, name_start);
        self.graph.add_epsilon(name_end, end);

        (start, end)
    }

    fn build_expression_operator(&mut self, parent: TemplateId) -> (PStateId, PStateId) {
        let (start, op) = self.tagged_state(NodeKind::ExpressionOperator, parent);
        let (plus, _) = self.tagged_state(NodeKind::PlusOperator, op);
        let (minus, _) = self.tagged_state(NodeKind::MinusOperator, op);
        let end = self.graph.alloc_state();

        self.graph.add_edge(start, TokenKind::Plus, plus);
        self.graph.add_epsilon(plus, end);
        self.graph.add_edge(start, TokenKind::Minus, minus);
        self.graph.add_epsilon(minus, end);

        (start, end)
    }

    fn build_literal_expression(&mut self, parent: TemplateId) -> (PStateId, PStateId) {
        let (start, expr) = self.tagged_state(NodeKind::LiteralExpression, parent);
        let (lit_start, lit_end) = self.build_literal(expr);
        let (rest_start, rest_end) = self.build_other_literal(expr);
        let end = self.graph.alloc_state();

        self.graph.add_epsilon(start, lit_start);
        self.graph.add_epsilon(lit_end, rest_start);
        self.graph.add_epsilon(lit_end, end);
        self.graph.add_epsilon(rest_end, rest_start);
        self.graph.add_epsilon(rest_end, end);

        (start, end)
    }

    fn build_literal(&mut self, parent: TemplateId) -> (PStateId, PStateId) {
        let (start, lit) = self.tagged_state(NodeKind::Literal, parent);
        let (number, _) = self.tagged_state(NodeKind::NumberLiteral, lit);
        let (string, _) = self.tagged_state(NodeKind::StringLiteral, lit);
        let end = self.graph.alloc_state();

        self.graph.add_edge(start, TokenKind::NumberLiteral, number);
        self.graph.add_epsilon(number, end);
        self.graph.add_edge(start, TokenKind::StringLiteral, string);
        self.graph.add_epsilon(string, end);

        (start, end)
    }

    fn build_other_literal(&mut self, parent: TemplateId) -> (PStateId, PStateId) {
        let (start, other) = self.tagged_state(NodeKind::OtherLiteral, parent);
        let (op_start, op_end) = self.build_expression_operator(other);
        let (lit_start, lit_end) = self.build_literal(other);
        let end = self.graph.alloc_state();

        self.graph.add_epsilon(start, op_start);
        self.graph.add_epsilon(op_end, lit_start);
        self.graph.add_epsilon(lit_end, end);

        (start, end)
    }

    fn build_alias_name(&mut self, parent: TemplateId) -> (PStateId, PStateId) {
        let (start, alias) = self.tagged_state(NodeKind::AliasName, parent);
        let (as_kw, _) = self.tagged_state(NodeKind::AsKeyword, alias);
        let (ident, _) = self.tagged_state(NodeKind::Identifier, alias);
        let end = self.graph.alloc_state();

        self.graph.add_edge(start, TokenKind::As, as_kw);
        self.graph.add_edge(as_kw, TokenKind::Identifier, ident);
        self.graph.add_epsilon(ident, end);
        self.graph.add_edge(start, TokenKind::Identifier, ident);

        (start, end)
    }

    fn build_table_name(&mut self, parent: TemplateId) -> (PStateId, PStateId) {
        let (start, table) = self.tagged_state(NodeKind::TableName, parent);
        let (ident, _) = self.tagged_state(NodeKind::Identifier, table);
        let (alias_start, alias_end) = self.build_alias_name(table);
        let end = self.graph.alloc_state();

        self.graph.add_edge(start, TokenKind::Identifier, ident);
        self.graph.add_epsilon(ident, alias_start);
        self.graph.add_epsilon(ident, end);
        self.graph.add_epsilon(alias_end, end);

        (start, end)
    }

    fn build_where_clause(&mut self, parent: TemplateId) -> (PStateId, PStateId) {
        let (start, clause) = self.tagged_state(NodeKind::WhereClause, parent);
        let (where_kw, _) = self.tagged_state(NodeKind::WhereKeyword, clause);
        let (cmp_start, cmp_end) = self.build_column_comparison(clause);
        let (rest_start, rest_end) = self.build_other_column_comparison(clause);
        let end = self.graph.alloc_state();

        self.graph.add_edge(start, TokenKind::Where, where_kw);
        self.graph.add_epsilon(where_kw, cmp_start);
        self.graph.add_epsilon(cmp_end, rest_start);
        self.graph.add_epsilon(cmp_end, end);
        self.graph.add_epsilon(rest_end, rest_start);
        self.graph.add_epsilon(rest_end, end);

        (start, end)
    }

    fn build_column_comparison(&mut self, parent: TemplateId) -> (PStateId, PStateId) {
        let (start, cmp) = self.tagged_state(NodeKind::ColumnComparison, parent);
        let (name_start, name_end) = self.build_column_name(cmp);
        let (rest_start, rest_end) = self.build_other_column_name(cmp);
        let end = self.graph.alloc_state();

        self.graph.add_epsilon(start, name_start);
        self.graph.add_epsilon(name_end, rest_start);
        self.graph.add_epsilon(name_end, end);
        self.graph.add_epsilon(rest_end, end);

        (start, end)
    }

    fn build_other_column_name(&mut self, parent: TemplateId) -> (PStateId, PStateId) {
        let (start, other) = self.tagged_state(NodeKind::OtherColumnName, parent);
        let (op_start, op_end) = self.build_comparison_operator(other);
        let (name_start, name_end) = self.build_column_name(other);
        let end = self.graph.alloc_state();

        self.graph.add_epsilon(start, op_start);
        self.graph.add_epsilon(op_end, name_start);
        self.graph.add_epsilon(name_end, end);

        (start, end)
    }

    fn build_other_column_comparison(&mut self, parent: TemplateId) -> (PStateId, PStateId) {
        let (start, other) = self.tagged_state(NodeKind::OtherColumnComparison, parent);
        let (op_start, op_end) = self.build_where_operator(other);
        let (cmp_start, cmp_end) = self.build_column_comparison(other);
        let end = self.graph.alloc_state();

        self.graph.add_epsilon(start, op_start);
        self.graph.add_epsilon(op_end, cmp_start);
        self.graph.add_epsilon(cmp_end, end);

        (start, end)
    }

    fn build_comparison_operator(&mut self, parent: TemplateId) -> (PStateId, PStateId) {
        let (start, op) = self.tagged_state(NodeKind::ComparisonOperator, parent);
        let end = self.graph.alloc_state();

        let operators = [
            (TokenKind::Ge, NodeKind::GreaterOrEqualOperator),
            (TokenKind::Gt, NodeKind::GreaterThanOperator),
            (TokenKind::Le, NodeKind::LessOrEqualOperator),
            (TokenKind::Lt, NodeKind::LessThanOperator),
            (TokenKind::Equal, NodeKind::EqualOperator),
            (TokenKind::NotEqualBang, NodeKind::NotEqualBangOperator),
            (TokenKind::NotEqualAngle, NodeKind::NotEqualAngleOperator),
        ];
        for (token, node) in operators {
            let (state, _) = self.tagged_state(node, op);
            self.graph.add_edge(start, token, state);
            self.graph.add_epsilon(state, end);
        }

        (start, end)
    }

    fn build_where_operator(&mut self, parent: TemplateId) -> (PStateId, PStateId) {
        let (start, op) = self.tagged_state(NodeKind::WhereOperator, parent);
        let (and_kw, _) = self.tagged_state(NodeKind::AndKeyword, op);
        let (or_kw, _) = self.tagged_state(NodeKind::OrKeyword, op);
        let end = self.graph.alloc_state();

        self.graph.add_edge(start, TokenKind::And, and_kw);
        self.graph.add_epsilon(and_kw, end);
        self.graph.add_edge(start, TokenKind::Or, or_kw);
        self.graph.add_epsilon(or_kw, end);

        (start, end)
    }

    fn build_statement_terminator(&mut self, parent: TemplateId) -> (PStateId, PStateId) {
        let (start, term) = self.tagged_state(NodeKind::StatementTerminator, parent);
        let (semicolon, _) = self.tagged_state(NodeKind::SemicolonOperator, term);
        let end = self.graph.alloc_state();

        self.graph.add_edge(start, TokenKind::Semicolon, semicolon);
        self.graph.add_epsilon(semicolon, end);

        (start, end)
    }
}
