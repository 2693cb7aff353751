//! In-memory associative hyper-arc graph store.
//!
//! A [`fabric::Fabric`] holds [`harc::Harc`] relation cells keyed by a
//! canonicalized [`tail::Tail`] of two [`node::Node`]s. A harc's head
//! is either a fixed [`node::Node`] or a [`definition::Definition`]
//! path re-evaluated lazily through [`path`] and cached until an
//! upstream harc invalidates it via [`dependants::DependantIndex`].
//! [`significance`] tracks access frequency with decay; [`config`]
//! holds the tunables; [`error`] is the shared failure type.
//!
//! This crate has no transport, no persistence, and reads no
//! environment variables — see `fabric-wire` for the external
//! operation surface and wire encoding.

pub mod config;
pub mod definition;
pub mod dependants;
pub mod error;
pub mod fabric;
pub mod harc;
pub mod node;
pub mod path;
pub mod significance;
pub mod tail;

pub use config::{ConfigError, FabricConfig, FabricConfigBuilder};
pub use definition::{Definition, NormalizedPath};
pub use error::{EvaluationFailure, FabricError, Result};
pub use fabric::{spawn_tick_thread, Fabric, FabricMetrics, TickThreadHandle};
pub use harc::Harc;
pub use node::{Node, Special};
pub use tail::Tail;
