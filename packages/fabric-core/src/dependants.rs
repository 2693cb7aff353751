//! Dependant tracking and dirty propagation (spec §4.2, §9).
//!
//! Grounded on `codegraph-orchestration/src/dependency_graph.rs`'s
//! `ReverseDependencyIndex` — a reverse adjacency map plus a BFS walk
//! (`compute_affected_files`) to find everything reachable from a
//! changed node. The fabric reverses the same idea at harc
//! granularity: `register` is called once per dependency discovered
//! during path evaluation, and `propagate_dirty` walks the reverse
//! edges to find every harc whose cached head is now stale.
//!
//! Unlike the teacher's index, registration here is **one-shot**: a
//! harc's outgoing dependency edges are pruned the moment it goes
//! dirty (spec: invalidation is pull-based, not push-based — a dirty
//! harc no longer needs anyone to tell it things changed; it already
//! knows, and will re-register fresh edges the next time it is
//! evaluated).

use dashmap::DashMap;
use rustc_hash::FxHashSet;

use crate::tail::Tail;

/// Reverse-edge index: `dependants[t]` is the set of harcs whose
/// definitions read `t` during their last evaluation.
#[derive(Debug, Default)]
pub struct DependantIndex {
    dependants: DashMap<Tail, FxHashSet<Tail>>,
}

impl DependantIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `dependant`'s definition reads `on` — called once
    /// per edge discovered while evaluating `dependant`'s path (spec
    /// §9: dependant registration happens during evaluation).
    pub fn register(&self, on: Tail, dependant: Tail) {
        self.dependants.entry(on).or_default().insert(dependant);
    }

    /// Drop every dependant edge `on` is the source of. Called when
    /// `on` is discovered dirty or removed, so its fan-out stops
    /// growing stale; dependants re-register on their own next
    /// evaluation.
    pub fn clear_edges_from(&self, on: &Tail) {
        self.dependants.remove(on);
    }

    /// Direct dependants of `on` (one hop).
    pub fn direct_dependants(&self, on: &Tail) -> Vec<Tail> {
        self.dependants
            .get(on)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// BFS over the reverse-edge graph starting at `changed`, visiting
    /// every harc transitively dependent on it exactly once. Mirrors
    /// `ReverseDependencyIndex`'s `compute_affected_files` traversal
    /// shape. `mark_dirty` is invoked once per harc discovered
    /// downstream of `changed` (not for `changed` itself — callers
    /// mark the root dirty directly before propagating).
    pub fn propagate_dirty(&self, changed: Tail, mut mark_dirty: impl FnMut(Tail)) {
        let mut queue = std::collections::VecDeque::new();
        let mut visited = FxHashSet::default();
        queue.push_back(changed);
        visited.insert(changed);

        while let Some(current) = queue.pop_front() {
            for dependant in self.direct_dependants(&current) {
                if visited.insert(dependant) {
                    mark_dirty(dependant);
                    queue.push_back(dependant);
                }
            }
            // current's own fan-out is now meaningless: it is dirty
            // (or about to be) and will re-register when next evaluated.
            self.clear_edges_from(&current);
        }
    }

    pub fn len(&self) -> usize {
        self.dependants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependants.is_empty()
    }
}
