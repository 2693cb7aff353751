//! Wire encoding and operation-surface DTOs for the fabric engine
//! (spec §6). No transport: this crate defines how a `Node` round
//! trips across a wire and the request/response shapes for the six
//! operations a transport would dispatch into `fabric_core::Fabric`
//! (`version`, `unique`, `query`, `define_const`, `define`,
//! `partners`) — carrying operations between client and daemon is an
//! external collaborator, out of scope here (spec §1).

pub mod dto;
pub mod error;
pub mod node_codec;

pub use dto::{
    Ack, DefineConstRequest, DefineRequest, PartnersRequest, PartnersResponse, PathWire,
    QueryRequest, QueryResponse, TailWire, UniqueResponse, VersionResponse, PROTOCOL_VERSION,
};
pub use error::{Result, WireError};
pub use node_codec::WireNode;
