//! Nondeterministic finite automaton over lexemes.
//!
//! One sub-automaton per pattern-table entry plus the looping identifier,
//! number-literal and string-literal shapes, all hung off a shared start
//! state by epsilon edges. Matching is a recursive backtracking search; the
//! first accepting path wins, and path order is fixed by construction order.

use squill_token::{Token, TokenKind};
use tracing::debug;

use crate::character::CharacterSet;
use crate::pattern::PatternTable;
use crate::state::{StateArena, StateId};

/// The lexer-side NFA.
///
/// Immutable after construction; a single instance serves any number of
/// `match_lexeme` calls.
#[derive(Debug, Clone)]
pub struct Nfa {
    states: StateArena,
    start: StateId,
}

impl Nfa {
    /// Build the automaton for the given alphabet and pattern table.
    #[must_use]
    pub fn new(characters: &CharacterSet, patterns: &PatternTable) -> Self {
        let mut states = StateArena::new();
        let start = states.alloc();
        let mut nfa = Self { states, start };

        nfa.build_multi_rune(patterns);
        nfa.build_single_rune(patterns);
        nfa.build_identifier(characters);
        nfa.build_string_literal(characters);
        nfa.build_number_literal(characters);

        debug!(states = nfa.states.len(), "constructed lexer nfa");
        nfa
    }

    /// Build with the standard character set and pattern table.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(&CharacterSet::standard(), &PatternTable::standard())
    }

    /// Number of states allocated during construction.
    #[must_use]
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub(crate) fn start(&self) -> StateId {
        self.start
    }

    pub(crate) fn arena(&self) -> &StateArena {
        &self.states
    }

    /// Keywords and multi-rune comparison operators: a private chain per
    /// pattern, one state per rune, epsilon into the chain and out to the
    /// accepting state.
    fn build_multi_rune(&mut self, patterns: &PatternTable) {
        for &(kind, pattern) in patterns.multi_rune() {
            let entry = self.states.alloc();
            self.states.add_epsilon(self.start, entry);

            let mut tail = entry;
            for c in pattern.chars() {
                let next = self.states.alloc();
                self.states.add_edge(tail, c, next);
                tail = next;
            }

            let accepting = self.states.alloc_accepting(kind);
            self.states.add_epsilon(tail, accepting);
        }
    }

    fn build_single_rune(&mut self, patterns: &PatternTable) {
        for &(kind, c) in patterns.single_rune() {
            let entry = self.states.alloc();
            self.states.add_epsilon(self.start, entry);

            let consumed = self.states.alloc();
            self.states.add_edge(entry, c, consumed);

            let accepting = self.states.alloc_accepting(kind);
            self.states.add_epsilon(consumed, accepting);
        }
    }

    /// Identifier: a letter or underscore starts it, then letters, digits and
    /// underscores continue it. Digits alone cannot start one.
    fn build_identifier(&mut self, characters: &CharacterSet) {
        let entry = self.states.alloc();
        self.states.add_epsilon(self.start, entry);

        let body = self.states.alloc();
        for &c in characters.alphabets() {
            self.states.add_edge(entry, c, body);
        }
        for &c in characters.alphabets() {
            self.states.add_edge(body, c, body);
        }
        for &c in characters.digits() {
            self.states.add_edge(body, c, body);
        }

        let accepting = self.states.alloc_accepting(TokenKind::Identifier);
        self.states.add_epsilon(body, accepting);
    }

    /// String literal: opening quote, a run of letters/digits, closing quote.
    /// A quote always terminates the literal; no escape convention exists.
    fn build_string_literal(&mut self, characters: &CharacterSet) {
        let entry = self.states.alloc();
        self.states.add_epsilon(self.start, entry);

        let body = self.states.alloc();
        self.states.add_edge(entry, '\'', body);
        for &c in characters.alphabets() {
            self.states.add_edge(body, c, body);
        }
        for &c in characters.digits() {
            self.states.add_edge(body, c, body);
        }

        let closed = self.states.alloc();
        self.states.add_edge(body, '\'', closed);

        let accepting = self.states.alloc_accepting(TokenKind::StringLiteral);
        self.states.add_epsilon(closed, accepting);
    }

    fn build_number_literal(&mut self, characters: &CharacterSet) {
        let entry = self.states.alloc();
        self.states.add_epsilon(self.start, entry);

        let body = self.states.alloc();
        for &c in characters.digits() {
            self.states.add_edge(entry, c, body);
            self.states.add_edge(body, c, body);
        }

        let accepting = self.states.alloc_accepting(TokenKind::NumberLiteral);
        self.states.add_epsilon(body, accepting);
    }

    /// Match a whole lexeme against the automaton.
    ///
    /// Returns an [`TokenKind::Error`] token when no path accepts.
    #[must_use]
    pub fn match_lexeme(&self, lexeme: &[char]) -> Token {
        let text: String = lexeme.iter().collect();
        match self.match_at(self.start, 0, lexeme) {
            Some(kind) => Token::new(kind, text),
            None => Token::error(text),
        }
    }

    /// Recursive backtracking search.
    ///
    /// At end of input the state itself or any state one epsilon hop away
    /// must accept. Otherwise rune transitions are tried first; only when
    /// none exist for the current rune do epsilon edges fire, without
    /// consuming input. Candidates are tried in construction order.
    fn match_at(&self, state: StateId, index: usize, lexeme: &[char]) -> Option<TokenKind> {
        if index == lexeme.len() {
            if let Some(kind) = self.states.accept(state) {
                return Some(kind);
            }
            return self
                .states
                .state(state)
                .epsilon
                .iter()
                .find_map(|&next| self.states.accept(next));
        }

        if let Some(candidates) = self.states.state(state).on.get(&lexeme[index]) {
            for &next in candidates {
                if let Some(kind) = self.match_at(next, index + 1, lexeme) {
                    return Some(kind);
                }
            }
            return None;
        }

        for &next in &self.states.state(state).epsilon {
            if let Some(kind) = self.match_at(next, index, lexeme) {
                return Some(kind);
            }
        }
        None
    }
}
