//! Edge Layout Resolution
//! Assigns every transition its place among parallel and anti-parallel
//! siblings, and prunes transitions that break the labelling rules

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::fsm::{Automaton, EdgeId, NodeId};


/// Where a transition sits relative to its siblings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgePlacement {
    /// 1-based position among the transitions of the same ordered pair,
    /// in insertion order
    pub link_index: usize,
    /// Number of transitions sharing the ordered pair
    pub group_size: usize,
    /// Drawn without curvature: no reverse transition and no parallel sibling
    pub flat: bool,
}

/// Layout parameters for the whole edge set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeLayout {
    pub placements: BTreeMap<EdgeId, EdgePlacement>,
    pub reflexive_counts: BTreeMap<NodeId, usize>,
}

impl EdgeLayout {
    pub fn placement(&self, id: EdgeId) -> Option<&EdgePlacement> {
        self.placements.get(&id)
    }

    pub fn reflexive_count(&self, node: NodeId) -> usize {
        self.reflexive_counts.get(&node).copied().unwrap_or(0)
    }
}

/// Transitions that must not survive: a later transition sharing a symbol
/// with an earlier one on the same ordered pair, an epsilon transition that
/// is not a self-loop, or a second epsilon self-loop on the same state.
pub fn conflicts(automaton: &Automaton) -> Vec<EdgeId> {
    let alphabet = automaton.alphabet();
    let mut kept: Vec<(EdgeId, NodeId, NodeId)> = Vec::new();
    let mut epsilon_loops: HashSet<NodeId> = HashSet::new();
    let mut offending = Vec::new();

    for (id, edge) in automaton.edges() {
        let duplicate = kept.iter().any(|&(other, source, target)| {
            source == edge.source
                && target == edge.target
                && automaton
                    .edge(other)
                    .is_some_and(|earlier| earlier.symbols.intersects(&edge.symbols))
        });

        let epsilon_conflict = alphabet.carries_epsilon(&edge.symbols)
            && (!edge.is_reflexive() || !epsilon_loops.insert(edge.source));

        if duplicate || epsilon_conflict {
            offending.push(id);
        } else {
            kept.push((id, edge.source, edge.target));
        }
    }

    offending
}

/// Compute placements for the current edge set. Pure; running it twice on
/// the same automaton yields the same layout.
pub fn compute(automaton: &Automaton) -> EdgeLayout {
    let mut group_sizes: HashMap<(NodeId, NodeId), usize> = HashMap::new();
    for (_, edge) in automaton.edges() {
        *group_sizes.entry((edge.source, edge.target)).or_insert(0) += 1;
    }

    let mut layout = EdgeLayout::default();
    let mut seen: HashMap<(NodeId, NodeId), usize> = HashMap::new();

    for (id, edge) in automaton.edges() {
        let pair = (edge.source, edge.target);
        let link_index = {
            let count = seen.entry(pair).or_insert(0);
            *count += 1;
            *count
        };
        let group_size = group_sizes.get(&pair).copied().unwrap_or(1);
        let has_reverse = group_sizes.contains_key(&(edge.target, edge.source));

        layout.placements.insert(
            id,
            EdgePlacement {
                link_index,
                group_size,
                flat: !has_reverse && group_size == 1,
            },
        );

        if edge.is_reflexive() {
            layout.reflexive_counts.insert(edge.source, group_size);
        }
    }

    layout
}

/// Prune conflicting transitions, then compute the layout and record each
/// state's self-loop count on the state itself.
pub fn resolve(automaton: &mut Automaton) -> EdgeLayout {
    let offending: HashSet<EdgeId> = conflicts(automaton).into_iter().collect();
    if !offending.is_empty() {
        log::warn!("dropping {} conflicting transition(s)", offending.len());
        automaton.retain_edges(|id, _| !offending.contains(&id));
    }

    let layout = compute(automaton);
    let ids: Vec<NodeId> = automaton.nodes().map(|node| node.id).collect();
    for id in ids {
        automaton.set_reflexive_count(id, layout.reflexive_count(id));
    }
    layout
}
