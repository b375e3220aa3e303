//! The keyword/operator pattern table.
//!
//! Built once at configuration time and handed to the automaton builder by
//! reference. Patterns live in fixed slices, not hash maps, so construction
//! order — and therefore the whole automaton — is reproducible.

use squill_token::TokenKind;

/// Immutable mapping from token kind to the lexeme that produces it.
///
/// Identifier, number-literal and string-literal shapes are not listed here;
/// the builder wires their looping sub-automata from the [`CharacterSet`]
/// directly.
///
/// [`CharacterSet`]: crate::character::CharacterSet
#[derive(Debug, Clone)]
pub struct PatternTable {
    multi: Vec<(TokenKind, &'static str)>,
    single: Vec<(TokenKind, char)>,
}

impl PatternTable {
    /// The fixed SELECT-grammar table: keywords, comparison operators, and
    /// the single-rune operators/separators.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            multi: vec![
                (TokenKind::Select, "select"),
                (TokenKind::From, "from"),
                (TokenKind::As, "as"),
                (TokenKind::Where, "where"),
                (TokenKind::And, "and"),
                (TokenKind::Or, "or"),
                (TokenKind::Ge, ">="),
                (TokenKind::Gt, ">"),
                (TokenKind::Le, "<="),
                (TokenKind::Lt, "<"),
                (TokenKind::Equal, "="),
                (TokenKind::NotEqualBang, "!="),
                (TokenKind::NotEqualAngle, "<>"),
            ],
            single: vec![
                (TokenKind::Plus, '+'),
                (TokenKind::Minus, '-'),
                (TokenKind::Multiply, '*'),
                (TokenKind::Divide, '/'),
                (TokenKind::Mod, '%'),
                (TokenKind::LeftParen, '('),
                (TokenKind::RightParen, ')'),
                (TokenKind::Comma, ','),
                (TokenKind::Semicolon, ';'),
            ],
        }
    }

    /// Multi-rune patterns (keywords and comparison operators), in table order.
    #[must_use]
    pub fn multi_rune(&self) -> &[(TokenKind, &'static str)] {
        &self.multi
    }

    /// Single-rune patterns (arithmetic operators and separators), in table order.
    #[must_use]
    pub fn single_rune(&self) -> &[(TokenKind, char)] {
        &self.single
    }

    /// Every lexeme in the table paired with its kind, multi-rune first.
    /// Used by the NFA/DFA equivalence tests.
    #[must_use]
    pub fn lexemes(&self) -> Vec<(TokenKind, String)> {
        let mut out: Vec<(TokenKind, String)> = self
            .multi
            .iter()
            .map(|&(kind, pat)| (kind, pat.to_owned()))
            .collect();
        out.extend(self.single.iter().map(|&(kind, c)| (kind, c.to_string())));
        out
    }
}

impl Default for PatternTable {
    fn default() -> Self {
        Self::standard()
    }
}
