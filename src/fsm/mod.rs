//! Automaton Data Structures
//! The editable graph: states, symbol-labelled transitions and the alphabet

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{Mode, DEFAULT_INITIAL_POSITION};
use crate::parser::{AutomatonDocument, ParseError, ParseResult};


/// Synthetic symbol for transitions that consume no input
pub const EPSILON: &str = "ε";

/// Identifier of a state, shown inside its circle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a transition. Ids grow monotonically, so ordering by id is
/// insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub u64);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("Symbol already used on a transition from {from} to {to}")]
    MultiplicityConflict { from: NodeId, to: NodeId },
    #[error("Epsilon transitions are only allowed as self-loops ({from} -> {to})")]
    EpsilonPlacement { from: NodeId, to: NodeId },
    #[error("Cannot delete initial node")]
    InitialNodeProtected,
    #[error("Unknown state {0}")]
    UnknownNode(NodeId),
    #[error("Unknown transition {0:?}")]
    UnknownEdge(EdgeId),
    #[error("Transition carries no symbol")]
    EmptySymbolMask,
}

pub type EditResult<T> = Result<T, EditError>;

/// One flag per alphabet slot; `true` means the transition reads that symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SymbolMask(Vec<bool>);

impl SymbolMask {
    pub fn empty(len: usize) -> Self {
        Self(vec![false; len])
    }

    pub fn single(len: usize, index: usize) -> Self {
        let mut mask = Self::empty(len);
        mask.set(index, true);
        mask
    }

    pub fn from_bits(bits: Vec<bool>) -> Self {
        Self(bits)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, index: usize) -> bool {
        self.0.get(index).copied().unwrap_or(false)
    }

    pub fn set(&mut self, index: usize, value: bool) {
        if let Some(slot) = self.0.get_mut(index) {
            *slot = value;
        }
    }

    /// True when no symbol is carried.
    pub fn is_empty(&self) -> bool {
        !self.0.iter().any(|&bit| bit)
    }

    pub fn count(&self) -> usize {
        self.0.iter().filter(|&&bit| bit).count()
    }

    /// Indices of the carried symbols, in alphabet order.
    pub fn symbols(&self) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(index, &bit)| bit.then_some(index))
    }

    pub fn intersects(&self, other: &SymbolMask) -> bool {
        self.0.iter().zip(&other.0).any(|(&a, &b)| a && b)
    }

    pub fn union_with(&mut self, other: &SymbolMask) {
        if self.0.len() < other.0.len() {
            self.0.resize(other.0.len(), false);
        }
        for (slot, &bit) in self.0.iter_mut().zip(&other.0) {
            *slot |= bit;
        }
    }

    pub fn bits(&self) -> &[bool] {
        &self.0
    }
}

/// Ordered, duplicate-free symbols; epsilon (when active) is the last slot
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Alphabet {
    symbols: Vec<String>,
    epsilon: bool,
}

impl Alphabet {
    pub fn new<I, S>(symbols: I, with_epsilon: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for symbol in symbols {
            let symbol = symbol.into().trim().to_string();
            if symbol.is_empty() || (with_epsilon && symbol == EPSILON) {
                continue;
            }
            if !unique.contains(&symbol) {
                unique.push(symbol);
            }
        }
        if with_epsilon {
            unique.push(EPSILON.to_string());
        }
        Self {
            symbols: unique,
            epsilon: with_epsilon,
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn symbol(&self, index: usize) -> Option<&str> {
        self.symbols.get(index).map(String::as_str)
    }

    /// Symbols the user supplied, without the synthetic epsilon slot.
    pub fn user_symbols(&self) -> &[String] {
        if self.epsilon {
            self.symbols.split_last().map_or(&[][..], |(_, rest)| rest)
        } else {
            &self.symbols
        }
    }

    pub fn index_of(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }

    pub fn has_epsilon(&self) -> bool {
        self.epsilon
    }

    pub fn epsilon_index(&self) -> Option<usize> {
        self.symbols.len().checked_sub(1).filter(|_| self.epsilon)
    }

    pub fn carries_epsilon(&self, mask: &SymbolMask) -> bool {
        self.epsilon_index().is_some_and(|index| mask.get(index))
    }
}

/// A state of the automaton
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub x: f32,
    pub y: f32,
    pub initial: bool,
    pub accepting: bool,
    /// Self-loop edges attached to this node, maintained by the layout resolver
    pub reflexive_count: usize,
    /// Self-loops are drawn above the node when set, below otherwise
    pub flip: bool,
}

impl Node {
    fn new(id: NodeId, x: f32, y: f32) -> Self {
        Self {
            id,
            x,
            y,
            initial: false,
            accepting: false,
            reflexive_count: 0,
            flip: true,
        }
    }
}

/// A transition between two states, possibly reading several symbols
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub symbols: SymbolMask,
}

impl Edge {
    pub fn is_reflexive(&self) -> bool {
        self.source == self.target
    }

    pub fn connects(&self, source: NodeId, target: NodeId) -> bool {
        self.source == source && self.target == target
    }
}

/// The document being edited
#[derive(Debug, Clone)]
pub struct Automaton {
    alphabet: Alphabet,
    nodes: BTreeMap<NodeId, Node>,
    edges: BTreeMap<EdgeId, Edge>,
    initial: Option<NodeId>,
    mode: Mode,
    epsilon: bool,
    next_edge: u64,
}

impl Automaton {
    /// An automaton over the empty alphabet with a single initial state.
    pub fn new(mode: Mode, epsilon: bool) -> Self {
        let mut automaton = Self {
            alphabet: Alphabet::new(Vec::<String>::new(), epsilon && !mode.is_deterministic()),
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
            initial: None,
            mode,
            epsilon,
            next_edge: 0,
        };
        automaton.initialize();
        automaton
    }

    pub fn with_alphabet<I, S>(mode: Mode, epsilon: bool, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut automaton = Self::new(mode, epsilon);
        automaton.set_alphabet(symbols);
        automaton
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// Epsilon is only offered for non-deterministic diagrams.
    pub fn epsilon_active(&self) -> bool {
        self.epsilon && !self.mode.is_deterministic()
    }

    pub fn epsilon_requested(&self) -> bool {
        self.epsilon
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges.iter().map(|(&id, edge)| (id, edge))
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn initial_node(&self) -> Option<&Node> {
        self.initial.and_then(|id| self.nodes.get(&id))
    }

    /// Removes every node and edge; the document has no initial state
    /// until `initialize` runs.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.initial = None;
    }

    /// Resets to a single initial state at the default position.
    pub fn initialize(&mut self) {
        self.clear();
        let (x, y) = DEFAULT_INITIAL_POSITION;
        let id = self.add_node(x, y);
        self.mark_initial(id);
    }

    /// Adds a state with the lowest free id. The first state of an empty
    /// document becomes initial. In deterministic mode the state gets one
    /// self-loop per symbol so its transition function stays total.
    pub fn add_node(&mut self, x: f32, y: f32) -> NodeId {
        let id = self.lowest_free_id();
        self.nodes.insert(id, Node::new(id, x, y));
        if self.initial.is_none() {
            self.mark_initial(id);
        }

        if self.mode.is_deterministic() {
            let len = self.alphabet.len();
            for index in 0..len {
                self.insert_edge(Edge {
                    source: id,
                    target: id,
                    symbols: SymbolMask::single(len, index),
                });
            }
            if let Some(node) = self.nodes.get_mut(&id) {
                node.reflexive_count = len;
            }
        }

        log::debug!("added state {} at ({:.0}, {:.0})", id, x, y);
        id
    }

    fn lowest_free_id(&self) -> NodeId {
        // Ids in use are a subset of [0, len], so the search always ends.
        (0..=self.nodes.len() as u32)
            .map(NodeId)
            .find(|id| !self.nodes.contains_key(id))
            .unwrap_or(NodeId(self.nodes.len() as u32))
    }

    pub fn move_node(&mut self, id: NodeId, x: f32, y: f32) -> EditResult<()> {
        let node = self.nodes.get_mut(&id).ok_or(EditError::UnknownNode(id))?;
        node.x = x;
        node.y = y;
        Ok(())
    }

    /// Deletes a state together with its transitions. Transitions into the
    /// state become self-loops on their source in deterministic mode and
    /// are dropped otherwise.
    pub fn remove_node(&mut self, id: NodeId) -> EditResult<()> {
        let node = self.nodes.get(&id).ok_or(EditError::UnknownNode(id))?;
        if node.initial {
            return Err(EditError::InitialNodeProtected);
        }

        self.edges.retain(|_, edge| edge.source != id);

        if self.mode.is_deterministic() {
            for edge in self.edges.values_mut().filter(|edge| edge.target == id) {
                edge.target = edge.source;
            }
        } else {
            self.edges.retain(|_, edge| edge.target != id);
        }

        self.nodes.remove(&id);
        log::debug!("removed state {}", id);
        Ok(())
    }

    pub fn toggle_accepting(&mut self, id: NodeId) -> EditResult<()> {
        let node = self.nodes.get_mut(&id).ok_or(EditError::UnknownNode(id))?;
        node.accepting = !node.accepting;
        Ok(())
    }

    pub fn set_initial(&mut self, id: NodeId) -> EditResult<()> {
        if !self.nodes.contains_key(&id) {
            return Err(EditError::UnknownNode(id));
        }
        self.mark_initial(id);
        Ok(())
    }

    fn mark_initial(&mut self, id: NodeId) {
        for node in self.nodes.values_mut() {
            node.initial = node.id == id;
        }
        self.initial = Some(id);
    }

    pub fn toggle_flip(&mut self, id: NodeId) -> EditResult<()> {
        let node = self.nodes.get_mut(&id).ok_or(EditError::UnknownNode(id))?;
        node.flip = !node.flip;
        Ok(())
    }

    /// Adds `symbols` to the transition from `source` to `target`, creating
    /// it if needed. A symbol may label only one transition per ordered pair,
    /// and epsilon only labels self-loops.
    pub fn add_or_merge_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        symbols: SymbolMask,
    ) -> EditResult<EdgeId> {
        self.check_insertable(source, target, &symbols)?;

        let existing = self
            .edges
            .iter_mut()
            .find(|(_, edge)| edge.connects(source, target));
        if let Some((&id, edge)) = existing {
            edge.symbols.union_with(&symbols);
            return Ok(id);
        }

        Ok(self.insert_edge(Edge {
            source,
            target,
            symbols,
        }))
    }

    /// Re-inserts a bundle as one single-symbol transition per carried symbol.
    /// Symbols that conflict are discarded individually.
    pub fn add_edge_group(
        &mut self,
        source: NodeId,
        target: NodeId,
        symbols: &SymbolMask,
    ) -> Vec<EdgeId> {
        let len = self.alphabet.len();
        let mut inserted = Vec::new();
        for index in symbols.symbols() {
            let single = SymbolMask::single(len, index);
            match self.check_insertable(source, target, &single) {
                Ok(()) => inserted.push(self.insert_edge(Edge {
                    source,
                    target,
                    symbols: single,
                })),
                Err(err) => log::debug!("discarded symbol {} of dropped bundle: {}", index, err),
            }
        }
        inserted
    }

    fn check_insertable(&self, source: NodeId, target: NodeId, symbols: &SymbolMask) -> EditResult<()> {
        if !self.nodes.contains_key(&source) {
            return Err(EditError::UnknownNode(source));
        }
        if !self.nodes.contains_key(&target) {
            return Err(EditError::UnknownNode(target));
        }
        if symbols.is_empty() {
            return Err(EditError::EmptySymbolMask);
        }
        if source != target && self.alphabet.carries_epsilon(symbols) {
            return Err(EditError::EpsilonPlacement { from: source, to: target });
        }
        let conflict = self
            .edges
            .values()
            .any(|edge| edge.connects(source, target) && edge.symbols.intersects(symbols));
        if conflict {
            return Err(EditError::MultiplicityConflict { from: source, to: target });
        }
        Ok(())
    }

    fn insert_edge(&mut self, edge: Edge) -> EdgeId {
        let id = EdgeId(self.next_edge);
        self.next_edge += 1;
        self.edges.insert(id, edge);
        id
    }

    /// Removes all transitions from `source` to `target`, returning them in
    /// insertion order.
    pub fn remove_edge_group(&mut self, source: NodeId, target: NodeId) -> Vec<Edge> {
        let ids = self.pair_edges(source, target);
        ids.into_iter()
            .filter_map(|id| self.edges.remove(&id))
            .collect()
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> EditResult<Edge> {
        self.edges.remove(&id).ok_or(EditError::UnknownEdge(id))
    }

    /// Transitions from `source` to `target`, in insertion order.
    pub fn pair_edges(&self, source: NodeId, target: NodeId) -> Vec<EdgeId> {
        self.edges
            .iter()
            .filter(|(_, edge)| edge.connects(source, target))
            .map(|(&id, _)| id)
            .collect()
    }

    /// Union of the symbols of every transition from `source` to `target`.
    pub fn pair_symbols(&self, source: NodeId, target: NodeId) -> SymbolMask {
        let mut mask = SymbolMask::empty(self.alphabet.len());
        for edge in self.edges.values().filter(|edge| edge.connects(source, target)) {
            mask.union_with(&edge.symbols);
        }
        mask
    }

    /// Number of symbol slots leaving `id`, counting multi-symbol edges once
    /// per symbol.
    pub fn outgoing_symbol_count(&self, id: NodeId) -> usize {
        self.edges
            .values()
            .filter(|edge| edge.source == id)
            .map(|edge| edge.symbols.count())
            .sum()
    }

    /// Replaces the alphabet. Symbol masks cannot survive the change, so the
    /// document is reset to a single initial state.
    pub fn set_alphabet<I, S>(&mut self, symbols: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alphabet = Alphabet::new(symbols, self.epsilon_active());
        self.initialize();
        log::info!("alphabet set to {:?}", self.alphabet.symbols());
    }

    pub fn set_epsilon(&mut self, enabled: bool) {
        self.epsilon = enabled;
        let symbols = self.alphabet.user_symbols().to_vec();
        self.set_alphabet(symbols);
    }

    /// Display label for a symbol mask: the carried symbols separated by a space.
    pub fn label(&self, symbols: &SymbolMask) -> String {
        symbols
            .symbols()
            .filter_map(|index| self.alphabet.symbol(index))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[cfg(test)]
    pub(crate) fn push_edge_unchecked(&mut self, edge: Edge) -> EdgeId {
        self.insert_edge(edge)
    }

    pub(crate) fn retain_edges(&mut self, mut keep: impl FnMut(EdgeId, &Edge) -> bool) {
        self.edges.retain(|&id, edge| keep(id, edge));
    }

    pub(crate) fn set_reflexive_count(&mut self, id: NodeId, count: usize) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.reflexive_count = count;
        }
    }

    /// Builds an automaton from an imported document. Transitions sharing a
    /// source and target are coalesced into one multi-symbol edge; epsilon
    /// transitions between distinct states are dropped.
    pub fn from_document(doc: &AutomatonDocument, mode: Mode, epsilon: bool) -> ParseResult<Self> {
        let mut automaton = Self::new(mode, epsilon);
        // An exported alphabet already ends in epsilon; `Alphabet::new` skips
        // it before appending the synthetic slot again.
        automaton.alphabet = Alphabet::new(doc.alphabet.iter().cloned(), automaton.epsilon_active());
        automaton.clear();

        for state in &doc.states {
            let id = NodeId(state.label);
            if automaton.nodes.contains_key(&id) {
                return Err(ParseError::MalformedDocument(format!(
                    "duplicate state {}",
                    state.label
                )));
            }
            automaton.nodes.insert(id, Node::new(id, state.x, state.y));
        }

        let len = automaton.alphabet.len();
        for transition in &doc.transitions {
            let (source, target) = (NodeId(transition.from), NodeId(transition.to));
            for id in [source, target] {
                if !automaton.nodes.contains_key(&id) {
                    return Err(ParseError::MalformedDocument(format!(
                        "transition refers to unknown state {}",
                        id
                    )));
                }
            }
            let index = automaton.alphabet.index_of(&transition.read).ok_or_else(|| {
                ParseError::MalformedDocument(format!(
                    "transition reads unknown symbol '{}'",
                    transition.read
                ))
            })?;
            let mask = SymbolMask::single(len, index);
            match automaton.add_or_merge_edge(source, target, mask) {
                Ok(_) => {}
                Err(EditError::EpsilonPlacement { .. }) => {
                    log::warn!("dropped epsilon transition {} -> {} from document", source, target);
                }
                Err(EditError::MultiplicityConflict { .. }) => {
                    log::warn!(
                        "dropped duplicate transition {} -> {} reading '{}'",
                        source,
                        target,
                        transition.read
                    );
                }
                Err(err) => return Err(ParseError::MalformedDocument(err.to_string())),
            }
        }

        for sid in &doc.accepting {
            if let Some(node) = automaton.nodes.get_mut(&NodeId(*sid)) {
                node.accepting = true;
            }
        }

        let initial = NodeId(doc.initial);
        let initial = if automaton.nodes.contains_key(&initial) {
            initial
        } else {
            *automaton.nodes.keys().next().ok_or_else(|| {
                ParseError::MalformedDocument("document has no states".to_string())
            })?
        };
        automaton.mark_initial(initial);

        Ok(automaton)
    }
}
