// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node graph engine for NodeForge.
//!
//! This crate provides the engine core a node-editor UI sits on top of:
//! - Scene/node/socket/edge data model with topology invariants
//! - Dirty/invalid flag propagation with typed event listeners
//! - Lazy, dependency-aware evaluation with cycle detection
//! - Identity-preserving serialization with cross-reference resolution
//!
//! ## Architecture
//!
//! The [`scene::Scene`] is the root owner of all nodes and edges; every
//! structural mutation goes through it so invariants hold and listeners
//! fire. Evaluation lives outside the scene in an
//! [`evaluation::Evaluator`], which dispatches to pluggable
//! [`evaluation::Compute`] implementations keyed by node type.
//! Serialization produces nested documents keyed by stable ids; loading
//! resolves references through a [`registry::IdRegistry`] instead of
//! duplicating entities.

pub mod edge;
pub mod evaluation;
pub mod event;
pub mod node;
pub mod registry;
pub mod scene;
pub mod serialize;
pub mod socket;
pub mod value;

pub use edge::{Edge, EdgeId};
pub use evaluation::{Compute, ComputeCtx, ComputeRegistry, EvaluationError, Evaluator};
pub use node::{Node, NodeId, NodeSpec};
pub use scene::{ConnectionError, GraphError, Scene, SceneId};
pub use serialize::{DeserializeOpts, MergeResult, SceneDoc, SerializeError};
pub use socket::{Socket, SocketDirection, SocketId, SocketType};
pub use value::Value;
