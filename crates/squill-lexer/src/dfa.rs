//! Deterministic automaton via subset construction.
//!
//! Each DFA state is the epsilon-closure of a set of NFA states. A plain
//! FIFO worklist stages construction; candidate sets are compared against
//! every set built so far and reused on structural equality, so the
//! automaton never holds two equal sets. Rune fan-out happens in sorted
//! order, which makes construction deterministic and repeatable.

use std::collections::{BTreeSet, VecDeque};

use squill_token::Token;
use tracing::debug;

use crate::character::CharacterSet;
use crate::nfa::Nfa;
use crate::pattern::PatternTable;
use crate::set::{SetId, StateSet};

/// The lexer-side DFA. Built from a private NFA; immutable afterwards.
#[derive(Debug, Clone)]
pub struct Dfa {
    nfa: Nfa,
    sets: Vec<StateSet>,
    start: SetId,
}

impl Dfa {
    /// Build the automaton for the given alphabet and pattern table.
    #[must_use]
    pub fn new(characters: &CharacterSet, patterns: &PatternTable) -> Self {
        let nfa = Nfa::new(characters, patterns);
        let mut dfa = Self {
            nfa,
            sets: Vec::new(),
            start: SetId(0),
        };
        dfa.build();

        debug!(sets = dfa.sets.len(), "constructed lexer dfa");
        dfa
    }

    /// Build with the standard character set and pattern table.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(&CharacterSet::standard(), &PatternTable::standard())
    }

    fn build(&mut self) {
        let arena = self.nfa.arena();

        let mut initial = StateSet::new();
        for id in arena.epsilon_closure(self.nfa.start()) {
            initial.add_member(id, arena);
        }
        self.sets.push(initial);

        let mut queue = VecDeque::from([self.start]);
        while let Some(current) = queue.pop_front() {
            let members = self.sets[current.0].members.clone();

            // union of the members' outgoing runes, sorted for determinism
            let mut runes = BTreeSet::new();
            for &member in &members {
                runes.extend(arena.state(member).on.keys().copied());
            }

            for c in runes {
                let mut candidate = StateSet::new();
                for &member in &members {
                    let Some(targets) = arena.state(member).on.get(&c) else {
                        continue;
                    };
                    for &target in targets {
                        for reached in arena.epsilon_closure(target) {
                            candidate.add_member(reached, arena);
                        }
                    }
                }

                let target = match self
                    .sets
                    .iter()
                    .position(|set| set.same_members(&candidate))
                {
                    Some(existing) => SetId(existing),
                    None => {
                        self.sets.push(candidate);
                        let id = SetId(self.sets.len() - 1);
                        queue.push_back(id);
                        id
                    }
                };
                self.sets[current.0].on.insert(c, target);
            }
        }
    }

    /// Number of distinct sets the construction produced.
    #[must_use]
    pub fn set_count(&self) -> usize {
        self.sets.len()
    }

    /// The transition structure as `(set, rune, target-set)` triples, for
    /// diagnostics and the construction-idempotence tests.
    #[must_use]
    pub fn transition_table(&self) -> Vec<(usize, char, usize)> {
        let mut table = Vec::new();
        for (index, set) in self.sets.iter().enumerate() {
            for (&c, &target) in &set.on {
                table.push((index, c, target.index()));
            }
        }
        table
    }

    /// Match a whole lexeme in one deterministic walk.
    ///
    /// A missing transition fails immediately; at end of input the current
    /// set must accept.
    #[must_use]
    pub fn match_lexeme(&self, lexeme: &[char]) -> Token {
        let text: String = lexeme.iter().collect();

        let mut current = self.start;
        for &c in lexeme {
            match self.sets[current.0].on.get(&c) {
                Some(&next) => current = next,
                None => return Token::error(text),
            }
        }

        match self.sets[current.0].accept {
            Some(kind) => Token::new(kind, text),
            None => Token::error(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use squill_token::TokenKind;

    fn kind_of(dfa: &Dfa, s: &str) -> TokenKind {
        let chars: Vec<char> = s.chars().collect();
        dfa.match_lexeme(&chars).kind
    }

    #[test]
    fn test_match_keywords_and_operators() {
        let dfa = Dfa::standard();
        assert_eq!(kind_of(&dfa, "select"), TokenKind::Select);
        assert_eq!(kind_of(&dfa, "where"), TokenKind::Where);
        assert_eq!(kind_of(&dfa, ">="), TokenKind::Ge);
        assert_eq!(kind_of(&dfa, "<>"), TokenKind::NotEqualAngle);
        assert_eq!(kind_of(&dfa, ";"), TokenKind::Semicolon);
    }

    #[test]
    fn test_keyword_beats_identifier() {
        let dfa = Dfa::standard();
        assert_eq!(kind_of(&dfa, "select"), TokenKind::Select);
        assert_eq!(kind_of(&dfa, "selectt"), TokenKind::Identifier);
        assert_eq!(kind_of(&dfa, "fro"), TokenKind::Identifier);
    }

    #[test]
    fn test_match_literals() {
        let dfa = Dfa::standard();
        assert_eq!(kind_of(&dfa, "123"), TokenKind::NumberLiteral);
        assert_eq!(kind_of(&dfa, "'abc123'"), TokenKind::StringLiteral);
        assert_eq!(kind_of(&dfa, "col1"), TokenKind::Identifier);
    }

    #[test]
    fn test_match_rejections() {
        let dfa = Dfa::standard();
        assert_eq!(kind_of(&dfa, "123abc"), TokenKind::Error);
        assert_eq!(kind_of(&dfa, "'abc"), TokenKind::Error);
        assert_eq!(kind_of(&dfa, "@"), TokenKind::Error);
    }

    #[test]
    fn test_construction_is_idempotent() {
        let a = Dfa::standard();
        let b = Dfa::standard();
        assert_eq!(a.set_count(), b.set_count());
        assert_eq!(a.transition_table(), b.transition_table());
    }

    #[test]
    fn test_no_two_equal_sets() {
        let dfa = Dfa::standard();
        for (i, x) in dfa.sets.iter().enumerate() {
            for y in dfa.sets.iter().skip(i + 1) {
                assert!(!x.same_members(y));
            }
        }
    }
}
