//! Parser-side automaton states.
//!
//! Mirrors the lexer's state arena, but transitions are keyed by token kind
//! and a state may carry a grammar-node template: visiting such a state
//! instantiates a parse-tree node under the template's parent. Candidate
//! lists keep insertion order, so the backtracking search is deterministic
//! for a given construction order.

use squill_grammar::NodeKind;
use squill_token::TokenKind;

/// Index of a parser state in its owning graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct PStateId(pub(crate) usize);

/// Index of a grammar-node template allocated during graph construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct TemplateId(pub(crate) usize);

/// One state of the parser graph.
#[derive(Debug, Clone, Default)]
pub(crate) struct PState {
    /// The grammar node this state instantiates when visited, if any.
    pub(crate) node: Option<TemplateId>,
    /// The template whose current instance adopts the instantiated node.
    /// `None` for the root and the end-sentinel state.
    pub(crate) parent: Option<TemplateId>,
    /// Token-kind transitions, in insertion order.
    pub(crate) on: Vec<(TokenKind, Vec<PStateId>)>,
    /// Epsilon edges, in insertion order.
    pub(crate) epsilon: Vec<PStateId>,
}

impl PState {
    /// Candidate targets for a token kind, if any transition exists.
    pub(crate) fn lookup(&self, kind: TokenKind) -> Option<&[PStateId]> {
        self.on
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, targets)| targets.as_slice())
    }
}

/// The parser state graph plus its template table.
#[derive(Debug, Clone, Default)]
pub(crate) struct StateGraph {
    pub(crate) states: Vec<PState>,
    pub(crate) templates: Vec<NodeKind>,
}

impl StateGraph {
    pub(crate) fn alloc_state(&mut self) -> PStateId {
        let id = PStateId(self.states.len());
        self.states.push(PState::default());
        id
    }

    pub(crate) fn alloc_template(&mut self, kind: NodeKind) -> TemplateId {
        let id = TemplateId(self.templates.len());
        self.templates.push(kind);
        id
    }

    /// Tag a state with the grammar node it instantiates and that node's
    /// parent template.
    pub(crate) fn tag(&mut self, state: PStateId, node: TemplateId, parent: TemplateId) {
        self.states[state.0].node = Some(node);
        self.states[state.0].parent = Some(parent);
    }

    pub(crate) fn add_edge(&mut self, from: PStateId, kind: TokenKind, to: PStateId) {
        let state = &mut self.states[from.0];
        match state.on.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, targets)) => targets.push(to),
            None => state.on.push((kind, vec![to])),
        }
    }

    pub(crate) fn add_epsilon(&mut self, from: PStateId, to: PStateId) {
        self.states[from.0].epsilon.push(to);
    }

    pub(crate) fn kind_of(&self, template: TemplateId) -> NodeKind {
        self.templates[template.0]
    }
}
