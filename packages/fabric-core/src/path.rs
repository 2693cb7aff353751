//! Path evaluator (spec §4.5).
//!
//! Resolution strategy disambiguated against `original_source/fabric/src/fabric.cpp`:
//! its `path()` folds one linear sequence left-to-right, while `paths()`
//! evaluates several such sequences and hands back a vector. A
//! normalised `Definition::Path` is the *outer* vector from `paths()`
//! fed back through the *same* left-to-right fold that `path()` uses
//! on its own elements — a double fold. This file implements that:
//! [`evaluate_linear`] is the single fold (`original_source::path`),
//! and [`evaluate_outer`] runs it once per inner sub-path — in
//! parallel via rayon, since the source "gestures at parallelism but
//! does not enable it" (spec §9) — then folds the resulting
//! `Vec<Node>` through `evaluate_linear` once more to produce the
//! final head.
//!
//! Cycle detection and the recursion-depth bound are state shared
//! across one top-level query's whole call tree, per spec §5 ("Cycle
//! detection uses a per-thread in-progress set, not a global lock").
//! A genuinely per-OS-thread set does not work here: `evaluate_outer`
//! fans the outer step vector out across rayon's worker threads, so a
//! cycle that re-enters an ancestor tail through a parallelized step
//! would land on a worker whose thread-local set never saw the
//! ancestor. Instead, each call to [`Fabric::query`] (or re-entrant
//! `query_as`) allocates one [`EvalContext`] and threads a reference to
//! it through every recursive call, including across rayon's split —
//! the in-progress set and depth counter become *per-query-call*
//! state, shared by whichever threads that one call happens to use,
//! rather than per-thread state that rayon's work-stealing invalidates.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::definition::NormalizedPath;
use crate::error::{EvaluationFailure, FabricError, Result};
use crate::fabric::Fabric;
use crate::node::Node;
use crate::tail::Tail;

/// Cycle/depth tracking for one top-level query's call tree. Shared
/// (by reference) across every recursive `query_as`, including sibling
/// steps evaluated on separate rayon worker threads — see module docs.
pub(crate) struct EvalContext {
    in_progress: Mutex<FxHashSet<Tail>>,
    depth: AtomicUsize,
}

impl EvalContext {
    pub(crate) fn new() -> Self {
        Self {
            in_progress: Mutex::new(FxHashSet::default()),
            depth: AtomicUsize::new(0),
        }
    }
}

struct RecursionGuard<'a> {
    ctx: &'a EvalContext,
    tail: Tail,
}

impl<'a> RecursionGuard<'a> {
    fn enter(ctx: &'a EvalContext, tail: Tail) -> Self {
        ctx.in_progress.lock().insert(tail);
        ctx.depth.fetch_add(1, Ordering::SeqCst);
        Self { ctx, tail }
    }
}

impl Drop for RecursionGuard<'_> {
    fn drop(&mut self) {
        self.ctx.in_progress.lock().remove(&self.tail);
        self.ctx.depth.fetch_sub(1, Ordering::SeqCst);
    }
}

fn is_in_progress(ctx: &EvalContext, tail: Tail) -> bool {
    ctx.in_progress.lock().contains(&tail)
}

fn current_depth(ctx: &EvalContext) -> usize {
    ctx.depth.load(Ordering::SeqCst)
}

/// Query `tail` on behalf of `dependant` (if any), guarding against
/// cycles and registering the dependant edge before recursing. This is
/// the sole re-entry point into the fabric from within path
/// evaluation; `Fabric::query` (the public entry point) calls it with
/// `dependant = None` and a freshly allocated `ctx`.
pub(crate) fn query_as(
    fabric: &Fabric,
    tail: Tail,
    dependant: Option<Tail>,
    ctx: &EvalContext,
) -> Result<Node> {
    if is_in_progress(ctx, tail) {
        return Err(FabricError::cycle(tail));
    }
    if current_depth(ctx) >= fabric.config().max_recursion_depth() {
        return Err(FabricError::evaluation_failed(
            tail,
            EvaluationFailure::RecursionLimitExceeded {
                depth: current_depth(ctx),
            },
        ));
    }
    if let Some(dependant) = dependant {
        fabric.register_dependant(tail, dependant);
    }

    let _guard = RecursionGuard::enter(ctx, tail);
    let harc = fabric.get(tail);
    let now = fabric.tick();
    harc.query(now, fabric.config(), |steps| {
        evaluate_outer(fabric, tail, steps, ctx)
    })
}

/// Evaluate the outer vector of a normalised path: fold each inner
/// sub-path to a `Node`, then fold that `Vec<Node>` again to the final
/// head (spec §3, §4.5; see module docs for how this was derived).
fn evaluate_outer(
    fabric: &Fabric,
    evaluating: Tail,
    steps: &NormalizedPath,
    ctx: &EvalContext,
) -> Result<Node> {
    if steps.is_empty() {
        return Ok(Node::NULL);
    }

    let per_step: Vec<Node> = if steps.len() > 1 {
        steps
            .par_iter()
            .map(|sub_path| evaluate_linear(fabric, evaluating, sub_path, ctx))
            .collect::<Result<Vec<_>>>()?
    } else {
        vec![evaluate_linear(fabric, evaluating, &steps[0], ctx)?]
    };

    evaluate_linear(fabric, evaluating, &per_step, ctx)
}

/// `fold_left(ni, nj -> Fabric.query({ni, nj}))` over a single linear
/// sub-path (spec §4.5). Empty yields `null`; a single element is
/// returned unchanged without touching the fabric at all.
fn evaluate_linear(
    fabric: &Fabric,
    evaluating: Tail,
    nodes: &[Node],
    ctx: &EvalContext,
) -> Result<Node> {
    match nodes {
        [] => Ok(Node::NULL),
        [only] => Ok(*only),
        [first, rest @ ..] => {
            let mut acc = *first;
            for &next in rest {
                if acc.is_null() || next.is_null() {
                    tracing::warn!(
                        tail = %evaluating,
                        "path evaluation stepped through a null node"
                    );
                }
                let step_tail = Tail::new(acc, next);
                acc = query_as(fabric, step_tail, Some(evaluating), ctx)?;
            }
            Ok(acc)
        }
    }
}
