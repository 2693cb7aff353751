//! Error types for the fabric engine.
//!
//! Mirrors spec §7: three error kinds reach the caller
//! (`EvaluationFailed`, `InvalidRequest`, `ProtocolMismatch`); everything
//! else (querying through `null`, a stale partner position) is a
//! non-error and is emitted on the `tracing` diagnostic channel instead.

use thiserror::Error;

use crate::tail::Tail;

pub type Result<T> = std::result::Result<T, FabricError>;

/// Why a `Definition` evaluation did not produce a head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationFailure {
    /// Evaluating this harc's definition re-entered evaluation of the
    /// same harc before it completed.
    Cycle,
    /// A normalised path referenced a parameter slot that was not
    /// supplied (script-layer concern; unreachable from the core's own
    /// evaluator, kept for boundary-layer completeness — see SPEC_FULL §8.1).
    MissingParameter,
    /// The definition's shape could not be evaluated at all (e.g. a
    /// structurally malformed path handed in through the boundary).
    Malformed(String),
    /// The path evaluator's bounded recursion depth (spec §5's "sole
    /// safeguard against pathological inputs") was exceeded.
    RecursionLimitExceeded { depth: usize },
}

impl std::fmt::Display for EvaluationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvaluationFailure::Cycle => write!(f, "cycle detected"),
            EvaluationFailure::MissingParameter => write!(f, "missing parameter reference"),
            EvaluationFailure::Malformed(detail) => {
                write!(f, "structurally invalid definition: {detail}")
            }
            EvaluationFailure::RecursionLimitExceeded { depth } => {
                write!(f, "recursion limit exceeded at depth {depth}")
            }
        }
    }
}

/// Core error type. State-mutating operations either apply in full or
/// not at all — no variant here is raised from a partially-applied
/// mutation (spec §7 policy).
#[derive(Error, Debug)]
pub enum FabricError {
    /// A harc's definition could not be evaluated to a head. The cache
    /// is left untouched and `dirty` remains set.
    #[error("evaluation failed for {tail:?}: {reason}")]
    EvaluationFailed { tail: Tail, reason: EvaluationFailure },

    /// Malformed input at the boundary: wrong arity, an unparseable
    /// node, an empty step where one is required.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Version negotiation failed between a transport client and this
    /// engine's wire contract. Connection-level, not state-mutating.
    #[error("protocol mismatch: client={client}, server={server}")]
    ProtocolMismatch { client: u32, server: u32 },
}

impl FabricError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn cycle(tail: Tail) -> Self {
        Self::EvaluationFailed {
            tail,
            reason: EvaluationFailure::Cycle,
        }
    }

    pub fn evaluation_failed(tail: Tail, reason: EvaluationFailure) -> Self {
        Self::EvaluationFailed { tail, reason }
    }
}
