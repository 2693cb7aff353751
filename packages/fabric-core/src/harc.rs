//! [Harc] — a relation cell: a tail, its body, flags, significance.
//!
//! Grounded on `original_source/daemon/includes/fdsb/harc.hpp` for the
//! attribute set and on `codegraph-ir/src/features/cache/dependency_graph.rs`
//! for the per-entity `parking_lot::RwLock` discipline (lock for the
//! body, release before recursing, reacquire to write back).
//!
//! A harc does not know about the [`crate::fabric::Fabric`] that owns
//! it: path evaluation is handed in as a callback so this module has
//! no dependency on `fabric.rs`, only the reverse. Dependant tracking
//! and partner indexing likewise live at the Fabric level
//! ([`crate::dependants::DependantIndex`]), since a dependant edge or
//! a partner slot is inherently a relationship *between* harcs, not a
//! harc's own state — see DESIGN.md for why `partner_cursors` from the
//! spec's attribute list has no field here (§9 sanctioned a
//! reorder-on-read replacement instead of stored cursors).

use parking_lot::RwLock;

use crate::config::FabricConfig;
use crate::definition::{Definition, NormalizedPath};
use crate::error::{FabricError, Result};
use crate::node::Node;
use crate::significance::SignificanceState;
use crate::tail::Tail;

struct HarcState {
    body: Definition,
    /// Set the first time this harc is given an explicit `define`
    /// (spec §9 Open Question: core always logs changes to a
    /// configurable channel, so this flag records "has this harc ever
    /// been defined" for callers, not a gate on logging itself).
    logged: bool,
    /// Reserved extension flag from the spec's harc flag bitset
    /// (`{logged, has-meta, defined, dirty}`); no operation in this
    /// spec assigns it meaning, so it is exposed but otherwise inert.
    has_meta: bool,
    last_query_tick: u64,
    significance: SignificanceState,
}

/// A hyper-arc: an unordered pair of tail nodes relating to a head.
pub struct Harc {
    tail: Tail,
    state: RwLock<HarcState>,
}

impl Harc {
    /// A freshly auto-vivified harc: `Constant(null)`, never queried
    /// (spec §4.3 `get`: "construct a fresh Harc with Constant(null)").
    pub fn new(tail: Tail, created_tick: u64) -> Self {
        Self {
            tail,
            state: RwLock::new(HarcState {
                body: Definition::constant(Node::NULL),
                logged: false,
                has_meta: false,
                last_query_tick: created_tick,
                significance: SignificanceState::new(created_tick),
            }),
        }
    }

    pub fn tail(&self) -> Tail {
        self.tail
    }

    pub fn tail_contains(&self, n: Node) -> bool {
        self.tail.contains(n)
    }

    pub fn tail_other(&self, n: Node) -> Node {
        self.tail.other(n)
    }

    pub fn is_dirty(&self) -> bool {
        self.state.read().body.is_dirty()
    }

    pub fn is_defined(&self) -> bool {
        self.state.read().body.is_path()
    }

    pub fn is_logged(&self) -> bool {
        self.state.read().logged
    }

    pub fn has_meta(&self) -> bool {
        self.state.read().has_meta
    }

    pub fn set_has_meta(&self, value: bool) {
        self.state.write().has_meta = value;
    }

    /// The current (decayed) significance — a pure read (spec
    /// Invariant 7), unlike `query`, which also boosts it.
    pub fn significance(&self, now: u64, cfg: &FabricConfig) -> f32 {
        self.state.read().significance.observe(now, cfg)
    }

    pub fn seconds_since_last_query(&self, now: u64, cfg: &FabricConfig) -> f32 {
        self.state.read().significance.seconds_since_last_query(now, cfg)
    }

    /// Resolve this harc's head (spec §4.2 `query`).
    ///
    /// If the body is `Constant`, or a `Path` whose cache is valid,
    /// returns it directly. Otherwise `evaluate` is invoked with a
    /// clone of the path's steps — *without* holding this harc's lock,
    /// so the evaluator is free to recurse back through the fabric
    /// (spec §5: "recursive locking... the evaluation must release
    /// before recursing, preferred"). On success the result is cached
    /// and `dirty` cleared; on failure the cache and `dirty` bit are
    /// left untouched and the error propagates, per spec §4.2.
    ///
    /// Significance and `last_query_tick` are bumped only on success:
    /// a failed evaluation is not a completed query.
    pub fn query(
        &self,
        now: u64,
        cfg: &FabricConfig,
        evaluate: impl FnOnce(&NormalizedPath) -> Result<Node>,
    ) -> Result<Node> {
        enum Pending {
            Ready(Node),
            Evaluate(NormalizedPath),
        }

        let pending = {
            let state = self.state.read();
            match &state.body {
                Definition::Constant(head) => Pending::Ready(*head),
                Definition::Path { path, cached } => match cached {
                    Some(head) => Pending::Ready(*head),
                    None => Pending::Evaluate(path.clone()),
                },
            }
        };

        let head = match pending {
            Pending::Ready(head) => head,
            Pending::Evaluate(steps) => {
                let head = evaluate(&steps)?;
                self.state.write().body.cache(head);
                head
            }
        };

        let mut state = self.state.write();
        state.significance.on_query(now, cfg);
        state.last_query_tick = now;
        Ok(head)
    }

    /// Replace the body with a fixed head (spec §4.2 `define(Node)`).
    /// Clears `dirty` (constants are never dirty) and sets `logged`.
    /// Dependant propagation and change logging are the Fabric's
    /// responsibility, since they reach beyond this harc.
    pub fn define_const(&self, head: Node) {
        let mut state = self.state.write();
        state.body = Definition::constant(head);
        state.logged = true;
    }

    /// Replace the body with a path definition (spec §4.2
    /// `define(Path)`). Sets `defined` and `dirty`; the first `query`
    /// will evaluate it.
    pub fn define_path(&self, path: NormalizedPath) {
        let mut state = self.state.write();
        state.body = Definition::path(path);
        state.logged = true;
    }

    /// Force `dirty` on a `Path` body (a no-op on `Constant`), used by
    /// dependant propagation. Mirrors spec §4.2: "each is marked
    /// dirty, which recursively marks their dependants."
    pub fn mark_dirty(&self) {
        self.state.write().body.invalidate();
    }

    pub(crate) fn path_steps_snapshot(&self) -> Option<NormalizedPath> {
        self.state.read().body.path_steps().cloned()
    }
}

impl std::fmt::Debug for Harc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("Harc")
            .field("tail", &self.tail)
            .field("dirty", &state.body.is_dirty())
            .field("defined", &state.body.is_path())
            .field("logged", &state.logged)
            .finish()
    }
}

/// Build the error `Harc::query` returns for a definition that
/// resolved to nothing usable (surfaced by `crate::path`, kept here
/// alongside the type it decorates).
pub(crate) fn malformed_definition(tail: Tail) -> FabricError {
    FabricError::evaluation_failed(
        tail,
        crate::error::EvaluationFailure::Malformed("definition produced no path steps".into()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t() -> Tail {
        Tail::new(Node::integer(1), Node::integer(2))
    }

    #[test]
    fn fresh_harc_queries_to_null_without_evaluating() {
        let h = Harc::new(t(), 0);
        let cfg = FabricConfig::default();
        let result = h.query(0, &cfg, |_| panic!("constant body must not evaluate"));
        assert_eq!(result.unwrap(), Node::NULL);
    }

    #[test]
    fn define_const_then_query_returns_the_new_head() {
        let h = Harc::new(t(), 0);
        let cfg = FabricConfig::default();
        h.define_const(Node::integer(42));
        assert!(!h.is_dirty());
        let result = h.query(0, &cfg, |_| panic!("constant body must not evaluate"));
        assert_eq!(result.unwrap(), Node::integer(42));
    }

    #[test]
    fn define_path_starts_dirty_and_query_evaluates_once() {
        let h = Harc::new(t(), 0);
        let cfg = FabricConfig::default();
        h.define_path(vec![vec![Node::integer(1), Node::integer(2)]]);
        assert!(h.is_dirty());

        let calls = std::cell::Cell::new(0);
        let result = h.query(0, &cfg, |_steps| {
            calls.set(calls.get() + 1);
            Ok(Node::integer(99))
        });
        assert_eq!(result.unwrap(), Node::integer(99));
        assert!(!h.is_dirty());
        assert_eq!(calls.get(), 1);

        // second query hits the cache, no further evaluation.
        let result2 = h.query(1, &cfg, |_| panic!("must use cache"));
        assert_eq!(result2.unwrap(), Node::integer(99));
    }

    #[test]
    fn failed_evaluation_leaves_dirty_set_and_cache_untouched() {
        let h = Harc::new(t(), 0);
        let cfg = FabricConfig::default();
        h.define_path(vec![vec![Node::integer(1), Node::integer(2)]]);

        let err = h.query(0, &cfg, |_| Err(malformed_definition(t())));
        assert!(err.is_err());
        assert!(h.is_dirty());
    }

    #[test]
    fn mark_dirty_is_a_no_op_on_constant_bodies() {
        let h = Harc::new(t(), 0);
        h.define_const(Node::integer(1));
        h.mark_dirty();
        assert!(!h.is_dirty());
    }

    #[test]
    fn successful_query_bumps_significance() {
        let h = Harc::new(t(), 0);
        let cfg = FabricConfig::default();
        let before = h.significance(0, &cfg);
        h.query(0, &cfg, |_| panic!("constant")).unwrap();
        let after = h.significance(0, &cfg);
        assert!(after > before);
    }
}
