//! Lexeme splitting and automaton dispatch.
//!
//! The lexer finds lexeme boundaries — quoted strings, held two-rune
//! operators, greedy identifier/number runs — and hands each lexeme to the
//! automaton it was configured with. It never classifies lexemes itself.

use std::fmt;
use std::str::FromStr;

use squill_token::Token;

use crate::character::{is_alphanumeric, is_comparison_start, is_immediate, is_whitespace};
use crate::dfa::Dfa;
use crate::nfa::Nfa;

/// The automaton capability the lexer is configured with.
///
/// Implemented by both [`Nfa`] and [`Dfa`]; the two are interchangeable and
/// must classify every lexeme identically.
pub trait FiniteAutomaton {
    /// Match a whole lexeme, returning an `Error`-kind token when no path
    /// accepts.
    fn match_lexeme(&self, lexeme: &[char]) -> Token;
}

impl FiniteAutomaton for Nfa {
    fn match_lexeme(&self, lexeme: &[char]) -> Token {
        Nfa::match_lexeme(self, lexeme)
    }
}

impl FiniteAutomaton for Dfa {
    fn match_lexeme(&self, lexeme: &[char]) -> Token {
        Dfa::match_lexeme(self, lexeme)
    }
}

/// External selector for the automaton implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutomatonChoice {
    Nfa,
    Dfa,
}

impl AutomatonChoice {
    /// Construct the chosen automaton with the standard alphabet and table.
    #[must_use]
    pub fn build(self) -> Box<dyn FiniteAutomaton> {
        match self {
            Self::Nfa => Box::new(Nfa::standard()),
            Self::Dfa => Box::new(Dfa::standard()),
        }
    }
}

impl FromStr for AutomatonChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nfa" => Ok(Self::Nfa),
            "dfa" => Ok(Self::Dfa),
            other => Err(format!(
                "unknown automaton {other:?}, valid values: nfa, dfa"
            )),
        }
    }
}

impl fmt::Display for AutomatonChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Nfa => "nfa",
            Self::Dfa => "dfa",
        })
    }
}

/// The tokenizer. Construct once with an automaton; each [`Lexer::lex`] call
/// is independent of the last.
pub struct Lexer {
    automaton: Box<dyn FiniteAutomaton>,
}

impl Lexer {
    /// Build a lexer around an already-constructed automaton.
    #[must_use]
    pub fn new(automaton: Box<dyn FiniteAutomaton>) -> Self {
        Self { automaton }
    }

    /// Build a lexer from the external automaton selector.
    #[must_use]
    pub fn from_choice(choice: AutomatonChoice) -> Self {
        Self::new(choice.build())
    }

    /// Split `sql` into lexemes and classify each through the automaton.
    ///
    /// Whitespace is discarded. A lexeme the automaton rejects becomes an
    /// `Error` token and scanning continues with the next lexeme. An
    /// unterminated string literal yields one `Error` token carrying
    /// everything from the opening quote to end of input.
    #[must_use]
    pub fn lex(&self, sql: &str) -> Vec<Token> {
        let runes: Vec<char> = sql.chars().collect();
        let mut tokens = Vec::new();
        let mut pending: Vec<char> = Vec::new();
        let mut inside_string = false;

        for (i, &c) in runes.iter().enumerate() {
            if c == '\'' && !inside_string {
                inside_string = true;
                pending.push(c);
                continue;
            }

            if c == '\'' && inside_string {
                inside_string = false;
                pending.push(c);
                tokens.push(self.automaton.match_lexeme(&pending));
                pending.clear();
                continue;
            }

            if inside_string {
                pending.push(c);
                if i == runes.len() - 1 {
                    // input ended inside the literal
                    tokens.push(Token::error(String::from_iter(&pending)));
                }
                continue;
            }

            if is_whitespace(c) {
                continue;
            }

            if is_comparison_start(c) {
                // hold the rune until lookahead settles >=, <=, != and <>
                pending.push(c);
                let next = runes.get(i + 1);
                let extends = next == Some(&'=') || (c == '<' && next == Some(&'>'));
                if !extends {
                    tokens.push(self.automaton.match_lexeme(&pending));
                    pending.clear();
                }
            } else if is_immediate(c) {
                pending.push(c);
                tokens.push(self.automaton.match_lexeme(&pending));
                pending.clear();
            } else {
                pending.push(c);
                let continues = runes.get(i + 1).copied().is_some_and(is_alphanumeric);
                if !continues {
                    tokens.push(self.automaton.match_lexeme(&pending));
                    pending.clear();
                }
            }
        }

        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use squill_token::TokenKind;

    fn lex(sql: &str) -> Vec<Token> {
        Lexer::from_choice(AutomatonChoice::Nfa).lex(sql)
    }

    fn kinds(sql: &str) -> Vec<TokenKind> {
        lex(sql).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_lex_empty_input() {
        assert!(lex("").is_empty());
        assert!(lex("   \t\n").is_empty());
    }

    #[test]
    fn test_lex_simple_select() {
        let tokens = lex("select col1 from t01 where id <= 123;");
        let expected = [
            (TokenKind::Select, "select"),
            (TokenKind::Identifier, "col1"),
            (TokenKind::From, "from"),
            (TokenKind::Identifier, "t01"),
            (TokenKind::Where, "where"),
            (TokenKind::Identifier, "id"),
            (TokenKind::Le, "<="),
            (TokenKind::NumberLiteral, "123"),
            (TokenKind::Semicolon, ";"),
        ];
        assert_eq!(tokens.len(), expected.len());
        for (token, (kind, lexeme)) in tokens.iter().zip(expected) {
            assert_eq!(token.kind, kind);
            assert_eq!(token.lexeme, lexeme);
        }
    }

    #[test]
    fn test_lex_two_rune_operators_need_lookahead() {
        assert_eq!(
            kinds("a<=b"),
            vec![TokenKind::Identifier, TokenKind::Le, TokenKind::Identifier]
        );
        assert_eq!(
            kinds("a<>b"),
            vec![
                TokenKind::Identifier,
                TokenKind::NotEqualAngle,
                TokenKind::Identifier
            ]
        );
        assert_eq!(
            kinds("a!=1"),
            vec![
                TokenKind::Identifier,
                TokenKind::NotEqualBang,
                TokenKind::NumberLiteral
            ]
        );
        assert_eq!(
            kinds("a<b"),
            vec![TokenKind::Identifier, TokenKind::Lt, TokenKind::Identifier]
        );
    }

    #[test]
    fn test_lex_string_literals_keep_quotes() {
        let tokens = lex("select 'abc123_' from t");
        assert_eq!(tokens[1].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[1].lexeme, "'abc123_'");
    }

    #[test]
    fn test_lex_unterminated_string_is_single_error() {
        let tokens = lex("'abc");
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].is_error());
        assert_eq!(tokens[0].lexeme, "'abc");
    }

    #[test]
    fn test_lex_error_is_local_to_one_lexeme() {
        let tokens = lex("select 123abc from t");
        assert_eq!(tokens[0].kind, TokenKind::Select);
        assert!(tokens[1].is_error());
        assert_eq!(tokens[2].kind, TokenKind::From);
        assert_eq!(tokens[3].kind, TokenKind::Identifier);
    }

    #[test]
    fn test_lex_expression_heavy_statement() {
        let got = kinds("select 123*(456+789), col1, col2, 'abc123_' from t01 where id <= 123 and col1='abc';");
        let expected = vec![
            TokenKind::Select,
            TokenKind::NumberLiteral,
            TokenKind::Multiply,
            TokenKind::LeftParen,
            TokenKind::NumberLiteral,
            TokenKind::Plus,
            TokenKind::NumberLiteral,
            TokenKind::RightParen,
            TokenKind::Comma,
            TokenKind::Identifier,
            TokenKind::Comma,
            TokenKind::Identifier,
            TokenKind::Comma,
            TokenKind::StringLiteral,
            TokenKind::From,
            TokenKind::Identifier,
            TokenKind::Where,
            TokenKind::Identifier,
            TokenKind::Le,
            TokenKind::NumberLiteral,
            TokenKind::And,
            TokenKind::Identifier,
            TokenKind::Equal,
            TokenKind::StringLiteral,
            TokenKind::Semicolon,
        ];
        assert_eq!(got, expected);
    }

    #[test]
    fn test_lexer_is_restartable() {
        let lexer = Lexer::from_choice(AutomatonChoice::Dfa);
        let first = lexer.lex("select a from b");
        let second = lexer.lex("select a from b");
        assert_eq!(first, second);
    }

    #[test]
    fn test_automaton_choice_parsing() {
        assert_eq!("nfa".parse::<AutomatonChoice>(), Ok(AutomatonChoice::Nfa));
        assert_eq!("dfa".parse::<AutomatonChoice>(), Ok(AutomatonChoice::Dfa));
        assert!("lr".parse::<AutomatonChoice>().is_err());
    }
}
