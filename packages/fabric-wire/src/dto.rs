//! The operation surface (spec §6): request/response DTOs for the six
//! operations a transport dispatches into the core. No transport or
//! dispatch loop lives here — these are plain, serializable values and
//! the conversions between them and `fabric_core` types.

use fabric_core::{Node, Tail};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WireError};
use crate::node_codec::WireNode;

/// Bumped whenever a wire-incompatible change is made to this crate's
/// DTOs. `version` lets a client and server negotiate before anything
/// else crosses the wire (spec §7 `ProtocolMismatch`).
pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionResponse {
    pub protocol_version: u32,
}

impl VersionResponse {
    pub fn current() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueResponse {
    pub node: WireNode,
}

impl From<Node> for UniqueResponse {
    fn from(node: Node) -> Self {
        Self { node: node.into() }
    }
}

/// A tail on the wire: any ordering is accepted, the server
/// canonicalizes (spec §6 "Tail canonicalization").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TailWire {
    pub a: WireNode,
    pub b: WireNode,
}

impl TailWire {
    pub fn decode(self) -> Result<Tail> {
        Ok(Tail::new(Node::try_from(self.a)?, Node::try_from(self.b)?))
    }
}

impl From<Tail> for TailWire {
    fn from(tail: Tail) -> Self {
        Self {
            a: tail.first().into(),
            b: tail.second().into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub tail: TailWire,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub head: WireNode,
}

impl From<Node> for QueryResponse {
    fn from(head: Node) -> Self {
        Self { head: head.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefineConstRequest {
    pub tail: TailWire,
    pub head: WireNode,
}

/// A normalized path on the wire: the outer vector is a sequence of
/// steps, each a linear sub-path (spec §3 `Definition::Path`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathWire(pub Vec<Vec<WireNode>>);

impl PathWire {
    pub fn decode(self) -> Result<Vec<Vec<Node>>> {
        self.0
            .into_iter()
            .map(|step| step.into_iter().map(Node::try_from).collect())
            .collect()
    }
}

impl From<Vec<Vec<Node>>> for PathWire {
    fn from(path: Vec<Vec<Node>>) -> Self {
        Self(
            path.into_iter()
                .map(|step| step.into_iter().map(WireNode::from).collect())
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefineRequest {
    pub tail: TailWire,
    pub path: PathWire,
}

/// Plain acknowledgment for the two `define*` operations (spec §6:
/// "Output: acknowledgment").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnersRequest {
    pub node: WireNode,
    pub limit: u32,
    pub start: u32,
}

impl PartnersRequest {
    pub fn decode(self) -> Result<(Node, usize, usize)> {
        let node = Node::try_from(self.node)?;
        let limit = usize::try_from(self.limit).map_err(|_| WireError::RangeOverflow)?;
        let start = usize::try_from(self.start).map_err(|_| WireError::RangeOverflow)?;
        Ok((node, limit, start))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnersResponse {
    pub partners: Vec<WireNode>,
}

impl From<Vec<Node>> for PartnersResponse {
    fn from(partners: Vec<Node>) -> Self {
        Self {
            partners: partners.into_iter().map(WireNode::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_wire_decodes_either_ordering_to_the_same_canonical_tail() {
        let a = WireNode::from(Node::integer(1));
        let b = WireNode::from(Node::integer(2));
        let ab = TailWire { a, b }.decode().unwrap();
        let ba = TailWire { a: b, b: a }.decode().unwrap();
        assert_eq!(ab, ba);
    }

    #[test]
    fn path_wire_round_trips_nested_structure() {
        let path = vec![vec![Node::integer(1), Node::integer(2)], vec![Node::NULL]];
        let wire = PathWire::from(path.clone());
        let decoded = wire.decode().unwrap();
        assert_eq!(decoded, path);
    }

    #[test]
    fn partners_request_rejects_overflowing_limit_on_32_bit_targets() {
        // usize is >= u32 on every platform this crate targets, so
        // this documents the conversion is infallible there; the
        // error path exists for completeness on exotic targets.
        let req = PartnersRequest {
            node: WireNode::from(Node::integer(1)),
            limit: u32::MAX,
            start: 0,
        };
        assert!(req.decode().is_ok());
    }

    #[test]
    fn version_response_reports_the_current_protocol_version() {
        assert_eq!(VersionResponse::current().protocol_version, PROTOCOL_VERSION);
    }

    /// Every DTO is expected to cross an actual JSON boundary (spec §6:
    /// these are the six operations' wire payloads), not just round-trip
    /// through Rust's own in-memory representation.
    #[test]
    fn define_request_round_trips_through_json() {
        let request = DefineRequest {
            tail: TailWire {
                a: WireNode::from(Node::integer(1)),
                b: WireNode::from(Node::integer(2)),
            },
            path: PathWire::from(vec![vec![Node::integer(3), Node::NULL]]),
        };
        let json = serde_json::to_string(&request).unwrap();
        let decoded: DefineRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn partners_response_round_trips_through_json() {
        let response = PartnersResponse::from(vec![Node::integer(5), Node::character('x')]);
        let json = serde_json::to_string(&response).unwrap();
        let decoded: PartnersResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, response);
    }
}
