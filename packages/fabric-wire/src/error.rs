//! Errors raised while decoding the wire representation (spec §6).
//!
//! Separate from `fabric_core::FabricError`: a malformed `WireNode` or
//! an out-of-range tag is a boundary problem, never reaching the core
//! at all, so it is modelled here rather than folded into the core's
//! `InvalidRequest` variant. `Into<fabric_core::FabricError>` is
//! provided for callers that want a single error type past the
//! boundary (spec §7: "InvalidRequest — malformed input at the
//! boundary").

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WireError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("unknown node variant tag: {0}")]
    UnknownVariantTag(u8),

    #[error("special node magnitude out of range: {0}")]
    InvalidSpecialMagnitude(u64),

    #[error("character node magnitude is not a valid Unicode scalar value: {0}")]
    InvalidCharacterMagnitude(u64),

    #[error("partners request limit/start exceeds u32 range")]
    RangeOverflow,
}

impl From<WireError> for fabric_core::FabricError {
    fn from(err: WireError) -> Self {
        fabric_core::FabricError::invalid_request(err.to_string())
    }
}
