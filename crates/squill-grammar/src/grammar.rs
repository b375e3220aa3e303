//! The grammar table and FIRST/FOLLOW derivation.
//!
//! Non-terminals declare their alternatives as sequences of [`Symbol`]s,
//! each with a repetition bound. The table is a value, not a static: the
//! LL(1) parser takes a `&Grammar`, so tests can hand it deliberately
//! ambiguous variants.

use std::collections::{BTreeMap, BTreeSet};

use squill_token::TokenKind;

use crate::kind::NodeKind;

/// Repetition bound of one symbol occurrence inside an alternative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurs {
    /// Exactly once.
    One,
    /// Zero or one times.
    Optional,
    /// Zero or more times.
    Many,
}

impl Occurs {
    /// True when the occurrence may be skipped entirely.
    #[must_use]
    pub fn is_nullable(self) -> bool {
        !matches!(self, Self::One)
    }

    /// True when the occurrence may repeat without bound.
    #[must_use]
    pub fn is_repeatable(self) -> bool {
        matches!(self, Self::Many)
    }
}

/// One position in an alternative: a node kind plus its repetition bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    pub kind: NodeKind,
    pub occurs: Occurs,
}

impl Symbol {
    /// A symbol matched exactly once.
    #[must_use]
    pub const fn one(kind: NodeKind) -> Self {
        Self {
            kind,
            occurs: Occurs::One,
        }
    }

    /// A symbol matched zero or one times.
    #[must_use]
    pub const fn optional(kind: NodeKind) -> Self {
        Self {
            kind,
            occurs: Occurs::Optional,
        }
    }

    /// A symbol matched zero or more times.
    #[must_use]
    pub const fn many(kind: NodeKind) -> Self {
        Self {
            kind,
            occurs: Occurs::Many,
        }
    }
}

/// The hand-encoded grammar: alternatives per non-terminal.
#[derive(Debug, Clone)]
pub struct Grammar {
    alternatives: BTreeMap<NodeKind, Vec<Vec<Symbol>>>,
}

impl Grammar {
    /// The fixed SELECT-statement grammar.
    #[must_use]
    pub fn standard() -> Self {
        use NodeKind::*;

        let mut alternatives = BTreeMap::new();
        let mut rule = |kind: NodeKind, alts: Vec<Vec<Symbol>>| {
            alternatives.insert(kind, alts);
        };

        rule(
            Root,
            vec![vec![
                Symbol::one(SelectStatement),
                Symbol::optional(StatementTerminator),
            ]],
        );
        rule(
            SelectStatement,
            vec![vec![
                Symbol::one(SelectKeyword),
                Symbol::one(ColumnList),
                Symbol::one(FromKeyword),
                Symbol::one(TableName),
                Symbol::optional(WhereClause),
            ]],
        );
        rule(
            ColumnList,
            vec![vec![
                Symbol::one(ColumnIdentifier),
                Symbol::many(OtherColumns),
            ]],
        );
        rule(ColumnIdentifier, vec![vec![Symbol::one(ColumnWithAlias)]]);
        rule(
            OtherColumns,
            vec![vec![
                Symbol::one(CommaOperator),
                Symbol::one(ColumnWithAlias),
            ]],
        );
        rule(
            ColumnWithAlias,
            vec![vec![
                Symbol::one(ColumnExpression),
                Symbol::optional(AliasName),
            ]],
        );
        rule(
            ColumnExpression,
            vec![vec![
                Symbol::one(ColumnName),
                Symbol::many(OtherExpression),
            ]],
        );
        rule(
            ColumnName,
            vec![
                vec![Symbol::one(Identifier)],
                vec![Symbol::one(LiteralExpression)],
            ],
        );
        rule(
            OtherExpression,
            vec![vec![
                Symbol::one(ExpressionOperator),
                Symbol::one(ColumnName),
            ]],
        );
        rule(
            ExpressionOperator,
            vec![
                vec![Symbol::one(PlusOperator)],
                vec![Symbol::one(MinusOperator)],
            ],
        );
        rule(
            LiteralExpression,
            vec![vec![Symbol::one(Literal), Symbol::many(OtherLiteral)]],
        );
        rule(
            Literal,
            vec![
                vec![Symbol::one(NumberLiteral)],
                vec![Symbol::one(StringLiteral)],
            ],
        );
        rule(
            OtherLiteral,
            vec![vec![
                Symbol::one(ExpressionOperator),
                Symbol::one(Literal),
            ]],
        );
        rule(
            AliasName,
            vec![
                vec![Symbol::one(AsKeyword), Symbol::one(Identifier)],
                vec![Symbol::one(Identifier)],
            ],
        );
        rule(
            TableName,
            vec![vec![Symbol::one(Identifier), Symbol::optional(AliasName)]],
        );
        rule(
            WhereClause,
            vec![vec![
                Symbol::one(WhereKeyword),
                Symbol::one(ColumnComparison),
                Symbol::many(OtherColumnComparison),
            ]],
        );
        rule(
            ColumnComparison,
            vec![vec![
                Symbol::one(ColumnName),
                Symbol::optional(OtherColumnName),
            ]],
        );
        rule(
            OtherColumnName,
            vec![vec![
                Symbol::one(ComparisonOperator),
                Symbol::one(ColumnName),
            ]],
        );
        rule(
            OtherColumnComparison,
            vec![vec![
                Symbol::one(WhereOperator),
                Symbol::one(ColumnComparison),
            ]],
        );
        rule(
            ComparisonOperator,
            vec![
                vec![Symbol::one(GreaterOrEqualOperator)],
                vec![Symbol::one(GreaterThanOperator)],
                vec![Symbol::one(LessOrEqualOperator)],
                vec![Symbol::one(LessThanOperator)],
                vec![Symbol::one(EqualOperator)],
                vec![Symbol::one(NotEqualBangOperator)],
                vec![Symbol::one(NotEqualAngleOperator)],
            ],
        );
        rule(
            WhereOperator,
            vec![
                vec![Symbol::one(AndKeyword)],
                vec![Symbol::one(OrKeyword)],
            ],
        );
        rule(
            StatementTerminator,
            vec![vec![Symbol::one(SemicolonOperator)]],
        );

        Self { alternatives }
    }

    /// Replace the alternatives of one non-terminal. Intended for tests that
    /// need grammar variants (e.g. an LL(1)-ambiguous one).
    pub fn set_alternatives(&mut self, kind: NodeKind, alts: Vec<Vec<Symbol>>) {
        self.alternatives.insert(kind, alts);
    }

    /// The alternatives of a non-terminal; empty for terminals.
    #[must_use]
    pub fn alternatives(&self, kind: NodeKind) -> &[Vec<Symbol>] {
        self.alternatives
            .get(&kind)
            .map_or(&[], Vec::as_slice)
    }

    /// FIRST set of a node kind: the token kinds that can open a match of it.
    ///
    /// Terminals contribute their own token kind; non-terminals union the
    /// FIRST sets of the leading symbol of every alternative.
    #[must_use]
    pub fn first_of_kind(&self, kind: NodeKind) -> BTreeSet<TokenKind> {
        if let Some(token) = kind.token_kind() {
            return BTreeSet::from([token]);
        }

        let mut first = BTreeSet::new();
        for alternative in self.alternatives(kind) {
            if let Some(leading) = alternative.first() {
                first.extend(self.first_of_symbol(*leading));
            }
        }
        first
    }

    /// FIRST set of one symbol occurrence. A nullable occurrence may vanish,
    /// so whatever can follow its kind can also appear first.
    #[must_use]
    pub fn first_of_symbol(&self, symbol: Symbol) -> BTreeSet<TokenKind> {
        let mut first = self.first_of_kind(symbol.kind);
        if symbol.occurs.is_nullable() {
            first.extend(self.follow_of(symbol.kind));
        }
        first
    }

    /// FOLLOW set of a node kind, from the fixed production-context table.
    ///
    /// Kinds that never have tail context in the grammar return the empty
    /// set.
    #[must_use]
    pub fn follow_of(&self, kind: NodeKind) -> BTreeSet<TokenKind> {
        use NodeKind::*;

        let mut follow = BTreeSet::new();
        match kind {
            SelectStatement => {
                follow.extend(self.first_of_symbol(Symbol::optional(StatementTerminator)));
                follow.insert(TokenKind::End);
            }
            ColumnList => {
                follow.insert(TokenKind::From);
            }
            ColumnIdentifier => {
                follow.extend(self.first_of_symbol(Symbol::optional(OtherColumns)));
            }
            ColumnExpression => {
                follow.extend(self.first_of_symbol(Symbol::optional(AliasName)));
            }
            ColumnName => {
                follow.extend(self.first_of_symbol(Symbol::optional(OtherExpression)));
            }
            ExpressionOperator => {
                follow.extend(self.first_of_symbol(Symbol::one(ColumnName)));
                follow.extend(self.first_of_symbol(Symbol::one(LiteralExpression)));
            }
            Literal => {
                follow.extend(self.first_of_symbol(Symbol::optional(OtherLiteral)));
            }
            TableName => {
                follow.extend(self.first_of_symbol(Symbol::optional(WhereClause)));
            }
            ColumnComparison => {
                follow.extend(self.first_of_symbol(Symbol::optional(OtherColumnComparison)));
            }
            ComparisonOperator => {
                follow.extend(self.first_of_symbol(Symbol::one(ColumnName)));
            }
            WhereOperator => {
                follow.extend(self.first_of_symbol(Symbol::one(ColumnComparison)));
            }
            _ => {}
        }
        follow
    }
}

impl Default for Grammar {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use NodeKind::*;

    fn set(kinds: &[TokenKind]) -> BTreeSet<TokenKind> {
        kinds.iter().copied().collect()
    }

    #[test]
    fn test_first_of_terminal_is_its_token() {
        let grammar = Grammar::standard();
        assert_eq!(
            grammar.first_of_kind(SelectKeyword),
            set(&[TokenKind::Select])
        );
    }

    #[test]
    fn test_first_of_root_and_statement() {
        let grammar = Grammar::standard();
        assert_eq!(grammar.first_of_kind(Root), set(&[TokenKind::Select]));
        assert_eq!(
            grammar.first_of_kind(SelectStatement),
            set(&[TokenKind::Select])
        );
    }

    #[test]
    fn test_first_of_column_name_unions_alternatives() {
        let grammar = Grammar::standard();
        assert_eq!(
            grammar.first_of_kind(ColumnName),
            set(&[
                TokenKind::Identifier,
                TokenKind::NumberLiteral,
                TokenKind::StringLiteral
            ])
        );
    }

    #[test]
    fn test_first_of_nullable_symbol_includes_follow() {
        let grammar = Grammar::standard();
        // WhereClause? at the tail of SelectStatement: FOLLOW(WhereClause)
        // is empty, so the nullable FIRST is just {Where}.
        assert_eq!(
            grammar.first_of_symbol(Symbol::optional(WhereClause)),
            set(&[TokenKind::Where])
        );
        // AliasName? after a column expression keeps both openers.
        assert_eq!(
            grammar.first_of_symbol(Symbol::optional(AliasName)),
            set(&[TokenKind::As, TokenKind::Identifier])
        );
    }

    #[test]
    fn test_follow_table() {
        let grammar = Grammar::standard();
        assert_eq!(grammar.follow_of(ColumnList), set(&[TokenKind::From]));
        assert_eq!(
            grammar.follow_of(SelectStatement),
            set(&[TokenKind::Semicolon, TokenKind::End])
        );
        assert_eq!(grammar.follow_of(TableName), set(&[TokenKind::Where]));
        assert_eq!(
            grammar.follow_of(ColumnName),
            set(&[TokenKind::Plus, TokenKind::Minus])
        );
        assert_eq!(
            grammar.follow_of(ColumnComparison),
            set(&[TokenKind::And, TokenKind::Or])
        );
        assert!(grammar.follow_of(StatementTerminator).is_empty());
        assert!(grammar.follow_of(OtherColumns).is_empty());
    }

    #[test]
    fn test_standard_grammar_alternatives_are_ll1_disjoint() {
        let grammar = Grammar::standard();
        for kind in [
            Root,
            SelectStatement,
            ColumnList,
            ColumnName,
            Literal,
            AliasName,
            ComparisonOperator,
            WhereOperator,
            ExpressionOperator,
        ] {
            let alternatives = grammar.alternatives(kind);
            for (i, a) in alternatives.iter().enumerate() {
                for b in alternatives.iter().skip(i + 1) {
                    let fa = grammar.first_of_symbol(a[0]);
                    let fb = grammar.first_of_symbol(b[0]);
                    assert!(
                        fa.is_disjoint(&fb),
                        "overlap in {kind}: {fa:?} vs {fb:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_terminals_have_no_alternatives() {
        let grammar = Grammar::standard();
        assert!(grammar.alternatives(SelectKeyword).is_empty());
        assert!(grammar.alternatives(End).is_empty());
    }
}
