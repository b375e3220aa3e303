//! Grammar node kinds.
//!
//! One enumeration covers both the non-terminals of the SELECT grammar and
//! the terminal nodes, which map 1:1 onto token kinds.

use std::fmt;

use squill_token::TokenKind;

/// Kind of a grammar node, shared by the grammar table and parse trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKind {
    // === Non-terminals ===
    Root,
    SelectStatement,
    ColumnList,
    ColumnIdentifier,
    OtherColumns,
    ColumnWithAlias,
    ColumnExpression,
    ColumnName,
    OtherExpression,
    ExpressionOperator,
    LiteralExpression,
    Literal,
    OtherLiteral,
    AliasName,
    TableName,
    WhereClause,
    ColumnComparison,
    OtherColumnName,
    OtherColumnComparison,
    WhereOperator,
    ComparisonOperator,
    StatementTerminator,

    // === Terminals ===
    SelectKeyword,
    FromKeyword,
    AsKeyword,
    WhereKeyword,
    AndKeyword,
    OrKeyword,
    Identifier,
    StringLiteral,
    NumberLiteral,
    SemicolonOperator,
    CommaOperator,
    PlusOperator,
    MinusOperator,
    GreaterOrEqualOperator,
    GreaterThanOperator,
    LessOrEqualOperator,
    LessThanOperator,
    EqualOperator,
    NotEqualBangOperator,
    NotEqualAngleOperator,
    End,
}

impl NodeKind {
    /// True when the kind stands for a single token rather than a production.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self.token_kind().is_some()
    }

    /// The token kind a terminal node consumes. `None` for non-terminals.
    #[must_use]
    pub fn token_kind(self) -> Option<TokenKind> {
        match self {
            Self::SelectKeyword => Some(TokenKind::Select),
            Self::FromKeyword => Some(TokenKind::From),
            Self::AsKeyword => Some(TokenKind::As),
            Self::WhereKeyword => Some(TokenKind::Where),
            Self::AndKeyword => Some(TokenKind::And),
            Self::OrKeyword => Some(TokenKind::Or),
            Self::Identifier => Some(TokenKind::Identifier),
            Self::StringLiteral => Some(TokenKind::StringLiteral),
            Self::NumberLiteral => Some(TokenKind::NumberLiteral),
            Self::SemicolonOperator => Some(TokenKind::Semicolon),
            Self::CommaOperator => Some(TokenKind::Comma),
            Self::PlusOperator => Some(TokenKind::Plus),
            Self::MinusOperator => Some(TokenKind::Minus),
            Self::GreaterOrEqualOperator => Some(TokenKind::Ge),
            Self::GreaterThanOperator => Some(TokenKind::Gt),
            Self::LessOrEqualOperator => Some(TokenKind::Le),
            Self::LessThanOperator => Some(TokenKind::Lt),
            Self::EqualOperator => Some(TokenKind::Equal),
            Self::NotEqualBangOperator => Some(TokenKind::NotEqualBang),
            Self::NotEqualAngleOperator => Some(TokenKind::NotEqualAngle),
            Self::End => Some(TokenKind::End),
            _ => None,
        }
    }

    /// Node name used in rendered trees and diagnostics.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Root => "Root",
            Self::SelectStatement => "SelectStatement",
            Self::ColumnList => "ColumnList",
            Self::ColumnIdentifier => "ColumnIdentifier",
            Self::OtherColumns => "OtherColumns",
            Self::ColumnWithAlias => "ColumnWithAlias",
            Self::ColumnExpression => "ColumnExpression",
            Self::ColumnName => "ColumnName",
            Self::OtherExpression => "OtherExpression",
            Self::ExpressionOperator => "ExpressionOperator",
            Self::LiteralExpression => "LiteralExpression",
            Self::Literal => "Literal",
            Self::OtherLiteral => "OtherLiteral",
            Self::AliasName => "AliasName",
            Self::TableName => "TableName",
            Self::WhereClause => "WhereClause",
            Self::ColumnComparison => "ColumnComparison",
            Self::OtherColumnName => "OtherColumnName",
            Self::OtherColumnComparison => "OtherColumnComparison",
            Self::WhereOperator => "WhereOperator",
            Self::ComparisonOperator => "ComparisonOperator",
            Self::StatementTerminator => "StatementTerminator",
            Self::SelectKeyword => "SelectKeyword",
            Self::FromKeyword => "FromKeyword",
            Self::AsKeyword => "AsKeyword",
            Self::WhereKeyword => "WhereKeyword",
            Self::AndKeyword => "AndKeyword",
            Self::OrKeyword => "OrKeyword",
            Self::Identifier => "Identifier",
            Self::StringLiteral => "StringLiteral",
            Self::NumberLiteral => "NumberLiteral",
            Self::SemicolonOperator => "SemicolonOperator",
            Self::CommaOperator => "CommaOperator",
            Self::PlusOperator => "PlusOperator",
            Self::MinusOperator => "MinusOperator",
            Self::GreaterOrEqualOperator => "GreaterOrEqualOperator",
            Self::GreaterThanOperator => "GreaterThanOperator",
            Self::LessOrEqualOperator => "LessOrEqualOperator",
            Self::LessThanOperator => "LessThanOperator",
            Self::EqualOperator => "EqualOperator",
            Self::NotEqualBangOperator => "NotEqualBangOperator",
            Self::NotEqualAngleOperator => "NotEqualAngleOperator",
            Self::End => "End",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_classification() {
        assert!(NodeKind::SelectKeyword.is_terminal());
        assert!(NodeKind::End.is_terminal());
        assert!(!NodeKind::Root.is_terminal());
        assert!(!NodeKind::WhereClause.is_terminal());
    }

    #[test]
    fn test_terminal_token_mapping() {
        assert_eq!(
            NodeKind::LessOrEqualOperator.token_kind(),
            Some(TokenKind::Le)
        );
        assert_eq!(NodeKind::Identifier.token_kind(), Some(TokenKind::Identifier));
        assert_eq!(NodeKind::ColumnList.token_kind(), None);
    }
}
