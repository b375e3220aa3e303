//! The LL(1) predictive parser.
//!
//! No backtracking: at every non-terminal the FIRST sets of its alternatives
//! must be pairwise disjoint (anything else is a grammar defect, reported as
//! [`ParseError::Ambiguous`] before a token is consumed for it), and the
//! lookahead token picks the unique viable alternative. Nullable symbols are
//! skipped when the lookahead misses their FIRST set; zero-or-more symbols
//! loop while the lookahead stays inside it.

use squill_grammar::{Grammar, NodeKind, SyntaxNode};
use squill_token::{Token, TokenKind};
use tracing::trace;

use crate::error::ParseError;

/// Predictive parser over a token stream.
pub struct LlParser {
    tokens: Vec<Token>,
    index: usize,
    grammar: Grammar,
}

impl LlParser {
    /// Parser over `tokens` with the standard grammar. The `End` sentinel is
    /// appended here; callers pass the raw lexer output.
    #[must_use]
    pub fn new(tokens: Vec<Token>) -> Self {
        Self::with_grammar(tokens, Grammar::standard())
    }

    /// Parser over `tokens` with an explicit grammar table. Used by tests
    /// exercising grammar variants the standard table would never contain.
    #[must_use]
    pub fn with_grammar(mut tokens: Vec<Token>, grammar: Grammar) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::End) {
            tokens.push(Token::end());
        }
        Self {
            tokens,
            index: 0,
            grammar,
        }
    }

    /// Parse the stream into a tree rooted at [`NodeKind::Root`].
    pub fn parse(&mut self) -> Result<SyntaxNode, ParseError> {
        self.index = 0;

        let mut root = SyntaxNode::new(NodeKind::Root);
        self.match_node(&mut root)?;

        if self.lookahead().kind != TokenKind::End {
            return Err(ParseError::TrailingTokens {
                found: self.lookahead().clone(),
            });
        }
        Ok(root)
    }

    fn lookahead(&self) -> &Token {
        &self.tokens[self.index]
    }

    fn consume(&mut self) -> Token {
        let token = self.tokens[self.index].clone();
        self.index += 1;
        token
    }

    fn matched(&self) -> Vec<Token> {
        self.tokens[..self.index].to_vec()
    }

    /// Expand one non-terminal into `node`.
    fn match_node(&mut self, node: &mut SyntaxNode) -> Result<(), ParseError> {
        let kind = node.kind();
        trace!(node = %kind, index = self.index, "expanding");

        let alternatives = self.grammar.alternatives(kind).to_vec();
        let first_sets: Vec<_> = alternatives
            .iter()
            .map(|alt| self.grammar.first_of_symbol(alt[0]))
            .collect();

        // one token of lookahead only works when the alternatives cannot
        // open with the same token
        for (i, a) in first_sets.iter().enumerate() {
            for b in first_sets.iter().skip(i + 1) {
                if let Some(&overlap) = a.intersection(b).next() {
                    return Err(ParseError::Ambiguous { kind, overlap });
                }
            }
        }

        let look = self.lookahead().kind;
        let Some(choice) = first_sets.iter().position(|set| set.contains(&look)) else {
            return Err(ParseError::NoViableAlternative {
                kind,
                found: self.lookahead().clone(),
                matched: self.matched(),
            });
        };

        for &symbol in &alternatives[choice] {
            loop {
                let first = self.grammar.first_of_symbol(symbol);
                if first.contains(&self.lookahead().kind) {
                    if let Some(expected) = symbol.kind.token_kind() {
                        let token = self.consume();
                        if token.kind != expected {
                            return Err(ParseError::at(&self.tokens, self.index - 1));
                        }
                        node.add_child(SyntaxNode::terminal(symbol.kind, token));
                    } else {
                        let mut child = SyntaxNode::new(symbol.kind);
                        self.match_node(&mut child)?;
                        node.add_child(child);
                    }

                    if symbol.occurs.is_repeatable() {
                        continue;
                    }
                    break;
                }

                if symbol.occurs.is_nullable() {
                    break;
                }
                return Err(ParseError::at(&self.tokens, self.index));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use squill_grammar::Symbol;

    fn tok(kind: TokenKind, lexeme: &str) -> Token {
        Token::new(kind, lexeme)
    }

    fn sample_tokens() -> Vec<Token> {
        vec![
            tok(TokenKind::Select, "select"),
            tok(TokenKind::Identifier, "col1"),
            tok(TokenKind::Plus, "+"),
            tok(TokenKind::Identifier, "col2"),
            tok(TokenKind::As, "as"),
            tok(TokenKind::Identifier, "col_alias"),
            tok(TokenKind::From, "from"),
            tok(TokenKind::Identifier, "t01"),
            tok(TokenKind::Where, "where"),
            tok(TokenKind::Identifier, "id"),
            tok(TokenKind::Equal, "="),
            tok(TokenKind::NumberLiteral, "123"),
            tok(TokenKind::Plus, "+"),
            tok(TokenKind::NumberLiteral, "456"),
            tok(TokenKind::And, "and"),
            tok(TokenKind::Identifier, "col1"),
            tok(TokenKind::Equal, "="),
            tok(TokenKind::StringLiteral, "'abc'"),
        ]
    }

    #[test]
    fn test_parse_full_statement() {
        let mut parser = LlParser::new(sample_tokens());
        let root = parser.parse().expect("statement parses");
        assert_eq!(root.kind(), NodeKind::Root);
        let statement = &root.children()[0];
        assert_eq!(statement.kind(), NodeKind::SelectStatement);
        assert!(statement
            .children()
            .iter()
            .any(|c| c.kind() == NodeKind::WhereClause));
    }

    #[test]
    fn test_round_trip_lexemes() {
        let mut parser = LlParser::new(sample_tokens());
        let root = parser.parse().expect("statement parses");
        let expected: Vec<String> = sample_tokens()
            .into_iter()
            .map(|t| t.lexeme)
            .collect();
        assert_eq!(root.terminal_lexemes(), expected);
    }

    #[test]
    fn test_repetition_loops_columns() {
        let mut parser = LlParser::new(vec![
            tok(TokenKind::Select, "select"),
            tok(TokenKind::Identifier, "a"),
            tok(TokenKind::Comma, ","),
            tok(TokenKind::Identifier, "b"),
            tok(TokenKind::Comma, ","),
            tok(TokenKind::Identifier, "c"),
            tok(TokenKind::From, "from"),
            tok(TokenKind::Identifier, "t"),
        ]);
        let root = parser.parse().expect("statement parses");
        let statement = &root.children()[0];
        let column_list = &statement.children()[1];
        assert_eq!(column_list.kind(), NodeKind::ColumnList);
        let other_columns = column_list
            .children()
            .iter()
            .filter(|c| c.kind() == NodeKind::OtherColumns)
            .count();
        assert_eq!(other_columns, 2);
    }

    #[test]
    fn test_reject_adjacent_literals() {
        let mut parser = LlParser::new(vec![
            tok(TokenKind::Select, "select"),
            tok(TokenKind::NumberLiteral, "1"),
            tok(TokenKind::NumberLiteral, "1"),
            tok(TokenKind::From, "from"),
            tok(TokenKind::Identifier, "t"),
        ]);
        let err = parser.parse().expect_err("adjacent literals must fail");
        match err {
            ParseError::UnexpectedToken { found, .. } => {
                assert_eq!(found.kind, TokenKind::NumberLiteral);
            }
            other => panic!("expected UnexpectedToken, got {other:?}"),
        }
    }

    #[test]
    fn test_reject_trailing_tokens() {
        let mut parser = LlParser::new(vec![
            tok(TokenKind::Select, "select"),
            tok(TokenKind::Identifier, "a"),
            tok(TokenKind::From, "from"),
            tok(TokenKind::Identifier, "t"),
            tok(TokenKind::Semicolon, ";"),
            tok(TokenKind::Select, "select"),
        ]);
        let err = parser.parse().expect_err("trailing tokens must fail");
        assert!(matches!(err, ParseError::TrailingTokens { .. }));
    }

    #[test]
    fn test_reject_truncated_input() {
        let mut parser = LlParser::new(vec![
            tok(TokenKind::Select, "select"),
            tok(TokenKind::Identifier, "a"),
            tok(TokenKind::From, "from"),
        ]);
        let err = parser.parse().expect_err("truncated input must fail");
        assert!(matches!(err, ParseError::UnexpectedEnd { .. }));
    }

    #[test]
    fn test_reject_non_select_start() {
        let mut parser = LlParser::new(vec![tok(TokenKind::From, "from")]);
        let err = parser.parse().expect_err("must fail before consuming");
        assert!(matches!(err, ParseError::NoViableAlternative { .. }));
    }

    #[test]
    fn test_ambiguous_grammar_fails_before_consuming() {
        // Two alternatives of AliasName that both open with an identifier:
        // unfit for one-token lookahead even though a backtracking strategy
        // could still disambiguate.
        let mut grammar = Grammar::standard();
        grammar.set_alternatives(
            NodeKind::AliasName,
            vec![
                vec![Symbol::one(NodeKind::Identifier)],
                vec![
                    Symbol::one(NodeKind::Identifier),
                    Symbol::one(NodeKind::Identifier),
                ],
            ],
        );

        let mut parser = LlParser::with_grammar(
            vec![
                tok(TokenKind::Select, "select"),
                tok(TokenKind::Identifier, "a"),
                tok(TokenKind::Identifier, "a_alias"),
                tok(TokenKind::From, "from"),
                tok(TokenKind::Identifier, "t"),
            ],
            grammar,
        );
        let err = parser.parse().expect_err("ambiguous grammar must fail");
        match err {
            ParseError::Ambiguous { kind, overlap } => {
                assert_eq!(kind, NodeKind::AliasName);
                assert_eq!(overlap, TokenKind::Identifier);
            }
            other => panic!("expected Ambiguous, got {other:?}"),
        }
    }
}
