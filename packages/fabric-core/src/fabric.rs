//! [Fabric] — the associative store: harc table, partner indices,
//! change log, counters, tick clock (spec §4.3).
//!
//! Grounded on `codegraph-ir`'s `DashMap`-backed caches
//! (`src/features/cache/dependency_graph.rs`) for the concurrent
//! harc table, and on spec §9's sanctioned alternative to stored
//! partner cursors: "switch to a reorder-on-read scheme that sorts
//! lazily." Partner lists and the change log are therefore plain
//! `Vec`s, sorted by current significance at read time rather than
//! kept continuously ordered — `update_partners` exists as the
//! documented maintenance hook (§4.4's background visitor) but is a
//! cheap no-op plus a diagnostic event, since every read already
//! resorts.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::RwLock;

use crate::config::FabricConfig;
use crate::definition::NormalizedPath;
use crate::dependants::DependantIndex;
use crate::error::{FabricError, Result};
use crate::harc::Harc;
use crate::node::Node;
use crate::path;
use crate::tail::Tail;

#[derive(Debug, Default)]
struct Metrics {
    link_count: AtomicU64,
    node_count: AtomicU64,
    change_count: AtomicU64,
    query_count: AtomicU64,
    /// Cumulative count of `define(Path)` calls — an operation
    /// counter like its siblings, not a live gauge of currently-defined
    /// harcs (spec §3 lists it alongside the other monotonic counters).
    variable_link_count: AtomicU64,
}

/// A point-in-time snapshot of [`Fabric`]'s metrics counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FabricMetrics {
    pub link_count: u64,
    pub node_count: u64,
    pub change_count: u64,
    pub query_count: u64,
    pub variable_link_count: u64,
}

/// The associative store. Construct with [`Fabric::new`]; independent
/// instances are cheap and isolated (spec §9: "tests must be able to
/// instantiate independent fabrics").
pub struct Fabric {
    harcs: DashMap<Tail, Arc<Harc>>,
    partners: DashMap<Node, RwLock<Vec<Node>>>,
    change_log: RwLock<Vec<Tail>>,
    tick: AtomicU64,
    node_counter: AtomicU64,
    metrics: Metrics,
    dependants: DependantIndex,
    config: FabricConfig,
}

impl Fabric {
    pub fn new(config: FabricConfig) -> Self {
        Self {
            harcs: DashMap::new(),
            partners: DashMap::new(),
            change_log: RwLock::new(Vec::new()),
            tick: AtomicU64::new(0),
            node_counter: AtomicU64::new(0),
            metrics: Metrics::default(),
            dependants: DependantIndex::new(),
            config,
        }
    }

    pub fn config(&self) -> &FabricConfig {
        &self.config
    }

    pub fn tick(&self) -> u64 {
        self.tick.load(Ordering::SeqCst)
    }

    /// Wall-clock period of one tick (SPEC_FULL §9.2: `counter()`'s
    /// resolution is part of the original's public surface too, since
    /// `Harc::seconds_since_last_query` needs it to convert elapsed
    /// ticks into seconds).
    pub fn tick_resolution(&self) -> Duration {
        self.config.tick_resolution()
    }

    /// Advance the tick counter by one. Called by the dedicated timer
    /// thread spawned via [`spawn_tick_thread`]; exposed directly so
    /// tests can advance logical time without a real sleep.
    pub fn advance_tick(&self) -> u64 {
        self.tick.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Look up or construct the Harc for `tail` (spec §4.3 `get`).
    /// Concurrent first-reference races resolve to exactly one Harc
    /// (Invariant 2) via `DashMap`'s per-shard exclusion on `entry`.
    pub fn get(&self, tail: Tail) -> Arc<Harc> {
        if let Some(existing) = self.harcs.get(&tail) {
            return existing.clone();
        }
        let now = self.tick();
        match self.harcs.entry(tail) {
            dashmap::mapref::entry::Entry::Occupied(e) => e.get().clone(),
            dashmap::mapref::entry::Entry::Vacant(e) => {
                let harc = Arc::new(Harc::new(tail, now));
                e.insert(harc.clone());
                self.register_partners(tail);
                self.metrics.link_count.fetch_add(1, Ordering::Relaxed);
                harc
            }
        }
    }

    pub fn get_if_exists(&self, tail: Tail) -> Option<Arc<Harc>> {
        self.harcs.get(&tail).map(|e| e.clone())
    }

    /// `get(tail).query()`, counted (spec §4.3). Allocates one
    /// [`path::EvalContext`] for this call's whole recursive evaluation
    /// tree, shared (by reference) across any rayon worker threads the
    /// path evaluator splits outer steps onto, so cycle detection and
    /// the recursion-depth bound hold across that split.
    pub fn query(&self, tail: Tail) -> Result<Node> {
        self.metrics.query_count.fetch_add(1, Ordering::Relaxed);
        let ctx = path::EvalContext::new();
        path::query_as(self, tail, None, &ctx)
    }

    /// `get(tail).define(Constant(head))`, counted and propagated.
    pub fn define(&self, tail: Tail, head: Node) {
        let harc = self.get(tail);
        harc.define_const(head);
        self.after_define(tail);
    }

    /// `get(tail).define(Path(path))`, counted and propagated.
    pub fn define_path(&self, tail: Tail, path: NormalizedPath) {
        let harc = self.get(tail);
        harc.define_path(path);
        self.metrics
            .variable_link_count
            .fetch_add(1, Ordering::Relaxed);
        self.after_define(tail);
    }

    fn after_define(&self, tail: Tail) {
        self.metrics.change_count.fetch_add(1, Ordering::Relaxed);
        self.change_log.write().push(tail);
        self.propagate_invalidation(tail);
        tracing::info!(tail = %tail, "harc redefined");
    }

    /// Walk `tail`'s dependants, marking each dirty, pruning the
    /// traversed reverse edges as we go (spec §4.2: "clear the
    /// dependants set; they must re-register on next evaluation").
    fn propagate_invalidation(&self, tail: Tail) {
        self.dependants.propagate_dirty(tail, |dependant_tail| {
            if let Some(dependant) = self.get_if_exists(dependant_tail) {
                dependant.mark_dirty();
            }
        });
    }

    pub(crate) fn register_dependant(&self, on: Tail, dependant: Tail) {
        self.dependants.register(on, dependant);
    }

    /// Fetch-and-add on `node_counter` (spec §4.3 `unique`).
    pub fn unique(&self) -> Node {
        let v = self.node_counter.fetch_add(1, Ordering::SeqCst);
        self.metrics.node_count.fetch_add(1, Ordering::Relaxed);
        Node::allocated(v)
    }

    /// Reserve `n` contiguous `allocated` identities atomically (spec
    /// §4.3 `unique_range`).
    pub fn unique_range(&self, n: u64) -> Result<(Node, Node)> {
        if n == 0 {
            return Err(FabricError::invalid_request(
                "unique_range requires n >= 1",
            ));
        }
        let first = self.node_counter.fetch_add(n, Ordering::SeqCst);
        self.metrics.node_count.fetch_add(n, Ordering::Relaxed);
        Ok((Node::allocated(first), Node::allocated(first + n - 1)))
    }

    /// Up to `limit` partners of `node` starting at offset `start`, in
    /// descending significance order (spec §4.3 `partners`). Sorts the
    /// node's partner list lazily against current significance — the
    /// reorder-on-read scheme from §9.
    pub fn partners(&self, node: Node, limit: usize, start: usize) -> Vec<Node> {
        let Some(list) = self.partners.get(&node) else {
            return Vec::new();
        };
        let mut entries = list.write();
        let now = self.tick();
        entries.sort_by(|&a, &b| {
            let sa = self.significance_of(node, a, now);
            let sb = self.significance_of(node, b, now);
            sb.partial_cmp(&sa).unwrap_or(std::cmp::Ordering::Equal)
        });
        entries.iter().skip(start).take(limit).copied().collect()
    }

    fn significance_of(&self, a: Node, b: Node, now: u64) -> f32 {
        self.get_if_exists(Tail::new(a, b))
            .map(|h| h.significance(now, &self.config))
            .unwrap_or(0.0)
    }

    /// Return and remove up to `limit` change-log entries,
    /// highest-significance first (spec §4.3 `drain_changes`).
    pub fn drain_changes(&self, limit: usize) -> Vec<Tail> {
        let mut log = self.change_log.write();
        let now = self.tick();
        log.sort_by(|&a, &b| {
            let sa = self.tail_significance(a, now);
            let sb = self.tail_significance(b, now);
            sb.partial_cmp(&sa).unwrap_or(std::cmp::Ordering::Equal)
        });
        let n = limit.min(log.len());
        log.drain(0..n).collect()
    }

    fn tail_significance(&self, tail: Tail, now: u64) -> f32 {
        self.get_if_exists(tail)
            .map(|h| h.significance(now, &self.config))
            .unwrap_or(0.0)
    }

    /// Maintenance hook for a background significance-reorder visitor
    /// (spec §4.4). A no-op beyond diagnostics: partner order is
    /// always recomputed at read time, so there is no stale cursor
    /// position to repair.
    pub fn update_partners(&self, harc: &Harc) {
        tracing::debug!(tail = %harc.tail(), "partner reorder requested");
    }

    fn register_partners(&self, tail: Tail) {
        let a = tail.first();
        let b = tail.second();
        self.partners
            .entry(a)
            .or_insert_with(|| RwLock::new(Vec::new()))
            .write()
            .push(b);
        if a != b {
            self.partners
                .entry(b)
                .or_insert_with(|| RwLock::new(Vec::new()))
                .write()
                .push(a);
        }
    }

    pub fn metrics(&self) -> FabricMetrics {
        FabricMetrics {
            link_count: self.metrics.link_count.load(Ordering::Relaxed),
            node_count: self.metrics.node_count.load(Ordering::Relaxed),
            change_count: self.metrics.change_count.load(Ordering::Relaxed),
            query_count: self.metrics.query_count.load(Ordering::Relaxed),
            variable_link_count: self.metrics.variable_link_count.load(Ordering::Relaxed),
        }
    }
}

/// Handle to the dedicated tick timer thread (spec §5 scheduling
/// model). Dropping it (or calling [`TickThreadHandle::stop`]) signals
/// shutdown and joins — per-instance, never a process-global static,
/// so independent fabrics in tests never share a clock thread.
pub struct TickThreadHandle {
    shutdown: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl TickThreadHandle {
    pub fn stop(mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for TickThreadHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Spawn the timer thread that advances `fabric`'s tick counter at the
/// configured resolution (spec §3: "nominally 100ms").
pub fn spawn_tick_thread(fabric: Arc<Fabric>) -> TickThreadHandle {
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_for_thread = shutdown.clone();
    let period = fabric.config().tick_resolution();
    let handle = std::thread::spawn(move || {
        while !shutdown_for_thread.load(Ordering::SeqCst) {
            std::thread::sleep(period.max(Duration::from_millis(1)));
            if shutdown_for_thread.load(Ordering::SeqCst) {
                break;
            }
            fabric.advance_tick();
        }
    });
    TickThreadHandle {
        shutdown,
        handle: Some(handle),
    }
}
