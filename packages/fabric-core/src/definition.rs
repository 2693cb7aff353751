//! [Definition] — the rule that produces a harc's head (spec §3, §4.2).
//!
//! `original_source/daemon/includes/fdsb/harc.hpp` models this as a
//! `Definition*` with its own `is_out_of_date()`; this crate keeps the
//! same ownership of the cache+validity bit at the definition level so
//! a harc can never observe a `dirty` state its body disagrees with
//! (spec Invariant 5: `dirty ⇒ body is a Definition`) — see DESIGN.md.

use crate::node::Node;

/// A normalised path: the outer vector is a sequence of steps, each
/// step a linear sub-path whose resolved `Node` becomes the argument
/// at that position (spec §3). See `crate::path` for evaluation.
pub type NormalizedPath = Vec<Vec<Node>>;

/// A harc's body: a fixed head, or a path recomputed lazily.
#[derive(Debug, Clone)]
pub enum Definition {
    /// Fixed head (spec: "constant heads are never dirty").
    Constant(Node),
    /// A normalised path plus its cache. `cached` is `None` exactly
    /// when the path is dirty and must be re-evaluated.
    Path {
        path: NormalizedPath,
        cached: Option<Node>,
    },
}

impl Definition {
    pub fn constant(head: Node) -> Self {
        Definition::Constant(head)
    }

    pub fn path(path: NormalizedPath) -> Self {
        Definition::Path { path, cached: None }
    }

    /// Is re-evaluation required before the head can be returned?
    /// Always `false` for a constant.
    pub fn is_dirty(&self) -> bool {
        match self {
            Definition::Constant(_) => false,
            Definition::Path { cached, .. } => cached.is_none(),
        }
    }

    /// `true` for any `Path`, matching the Harc `defined` flag (spec
    /// §3: "This Harc has a non-constant definition").
    pub fn is_path(&self) -> bool {
        matches!(self, Definition::Path { .. })
    }

    /// The cached head, if valid.
    pub fn cached_head(&self) -> Option<Node> {
        match self {
            Definition::Constant(h) => Some(*h),
            Definition::Path { cached, .. } => *cached,
        }
    }

    pub fn path_steps(&self) -> Option<&NormalizedPath> {
        match self {
            Definition::Constant(_) => None,
            Definition::Path { path, .. } => Some(path),
        }
    }

    /// Record a freshly-evaluated head, clearing `dirty`. A no-op
    /// cache slot for `Constant` (there is nothing to invalidate).
    pub fn cache(&mut self, head: Node) {
        if let Definition::Path { cached, .. } = self {
            *cached = Some(head);
        }
    }

    /// Mark the cache stale. A no-op for `Constant`.
    pub fn invalidate(&mut self) {
        if let Definition::Path { cached, .. } = self {
            *cached = None;
        }
    }
}
