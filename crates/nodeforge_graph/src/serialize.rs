// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene serialization: nested documents keyed by stable ids.
//!
//! Document nesting mirrors containment: the scene owns node and edge
//! fragments, nodes own their socket fragments, and every fragment
//! carries its id. Edges reference sockets by id only; linkage is
//! re-established at load time through an [`IdRegistry`], never by
//! duplicating the referenced entity.

use crate::edge::{Edge, EdgeId};
use crate::node::{Node, NodeId};
use crate::registry::IdRegistry;
use crate::scene::{ConnectionError, Scene, SceneId};
use crate::socket::{Socket, SocketType};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Serialized form of a scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDoc {
    /// Scene id
    pub id: Uuid,
    /// Node fragments, in scene order
    pub nodes: Vec<NodeDoc>,
    /// Edge fragments, in scene order
    pub edges: Vec<EdgeDoc>,
}

/// Serialized form of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDoc {
    /// Node id
    pub id: Uuid,
    /// Display title
    pub title: String,
    /// Compute type key
    pub type_key: String,
    /// Opaque content payload, carried through untouched
    pub content: serde_json::Value,
    /// Input socket fragments, in binding order
    pub inputs: Vec<SocketDoc>,
    /// Output socket fragments, in order
    pub outputs: Vec<SocketDoc>,
}

/// Serialized form of a socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocketDoc {
    /// Socket id
    pub id: Uuid,
    /// Position within the owning sequence
    pub index: usize,
    /// Data type
    pub socket_type: SocketType,
}

/// Serialized form of an edge; endpoints are socket references by id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeDoc {
    /// Edge id
    pub id: Uuid,
    /// Output-side socket id
    pub start_socket: Uuid,
    /// Input-side socket id
    pub end_socket: Uuid,
}

/// Options controlling how a document is applied to a scene
#[derive(Debug, Clone, Copy)]
pub struct DeserializeOpts {
    /// Keep persisted ids where possible; fresh ids are minted on
    /// collision with a live entity. Off mints fresh ids for everything
    /// (clipboard paste).
    pub restore_ids: bool,
}

impl Default for DeserializeOpts {
    fn default() -> Self {
        Self { restore_ids: true }
    }
}

/// Entities created by [`Scene::merge`]
#[derive(Debug, Default)]
pub struct MergeResult {
    /// Ids of the created nodes, in document order
    pub nodes: Vec<NodeId>,
    /// Ids of the created edges, in document order
    pub edges: Vec<EdgeId>,
}

impl Socket {
    /// Serialized fragment for this socket
    pub fn to_doc(&self) -> SocketDoc {
        SocketDoc {
            id: self.id.0,
            index: self.index,
            socket_type: self.socket_type,
        }
    }
}

impl Node {
    /// Serialized fragment for this node
    pub fn to_doc(&self) -> NodeDoc {
        NodeDoc {
            id: self.id.0,
            title: self.title.clone(),
            type_key: self.type_key.clone(),
            content: self.content.clone(),
            inputs: self.inputs.iter().map(Socket::to_doc).collect(),
            outputs: self.outputs.iter().map(Socket::to_doc).collect(),
        }
    }
}

impl Edge {
    /// Serialized fragment for this edge
    pub fn to_doc(&self) -> EdgeDoc {
        EdgeDoc {
            id: self.id.0,
            start_socket: self.start_socket.0,
            end_socket: self.end_socket.0,
        }
    }
}

impl Scene {
    /// Serialize the whole scene into a document
    pub fn serialize(&self) -> SceneDoc {
        SceneDoc {
            id: self.id().0,
            nodes: self.nodes().map(Node::to_doc).collect(),
            edges: self.edges().map(Edge::to_doc).collect(),
        }
    }

    /// Replace the scene contents with a document's
    ///
    /// Existing entities are removed first (observable through the
    /// removal listeners), then the document is merged in. With
    /// `restore_ids` set the scene takes over the document's id as well.
    pub fn deserialize(
        &mut self,
        doc: &SceneDoc,
        opts: DeserializeOpts,
    ) -> Result<(), SerializeError> {
        self.clear();
        if opts.restore_ids {
            self.set_id(SceneId(doc.id));
        }
        self.merge(doc, opts)?;
        Ok(())
    }

    /// Add a document's entities to the scene without clearing it
    ///
    /// Nodes land first so that the registry can resolve every socket
    /// reference before edge linkage is finalized. A reference to an id
    /// with no live socket is a hard error.
    pub fn merge(
        &mut self,
        doc: &SceneDoc,
        opts: DeserializeOpts,
    ) -> Result<MergeResult, SerializeError> {
        let mut registry = IdRegistry::new();
        registry.seed(self);
        let mut result = MergeResult::default();

        for node_doc in &doc.nodes {
            let node_id = registry.claim_node(node_doc.id, opts.restore_ids);
            let inputs = node_doc
                .inputs
                .iter()
                .map(|s| Socket {
                    id: registry.claim_socket(s.id, opts.restore_ids),
                    direction: crate::socket::SocketDirection::Input,
                    index: s.index,
                    socket_type: s.socket_type,
                })
                .collect();
            let outputs = node_doc
                .outputs
                .iter()
                .map(|s| Socket {
                    id: registry.claim_socket(s.id, opts.restore_ids),
                    direction: crate::socket::SocketDirection::Output,
                    index: s.index,
                    socket_type: s.socket_type,
                })
                .collect();
            let node = Node::with_parts(
                node_id,
                node_doc.title.clone(),
                node_doc.type_key.clone(),
                node_doc.content.clone(),
                inputs,
                outputs,
            );
            self.insert_node(node);
            result.nodes.push(node_id);
        }

        for edge_doc in &doc.edges {
            let edge_id = registry.claim_edge(edge_doc.id, opts.restore_ids);
            let start = registry
                .resolve_socket(edge_doc.start_socket)
                .ok_or(SerializeError::UnknownReference(edge_doc.start_socket))?;
            let end = registry
                .resolve_socket(edge_doc.end_socket)
                .ok_or(SerializeError::UnknownReference(edge_doc.end_socket))?;
            self.add_edge_internal(edge_id, start, end)?;
            result.edges.push(edge_id);
        }

        tracing::debug!(
            nodes = result.nodes.len(),
            edges = result.edges.len(),
            "document merged into scene"
        );
        Ok(result)
    }

    /// Write the scene to a file as pretty-printed JSON and clear the
    /// modified flag
    pub fn save_to_file(&mut self, path: &Path) -> Result<(), SerializeError> {
        let json = serde_json::to_string_pretty(&self.serialize())?;
        std::fs::write(path, json)?;
        self.set_modified(false);
        tracing::info!(path = %path.display(), "scene saved");
        Ok(())
    }

    /// Replace the scene contents from a JSON file and clear the
    /// modified flag
    pub fn load_from_file(&mut self, path: &Path) -> Result<(), SerializeError> {
        let text = std::fs::read_to_string(path)?;
        let doc: SceneDoc = serde_json::from_str(&text)?;
        self.deserialize(&doc, DeserializeOpts::default())?;
        self.set_modified(false);
        tracing::info!(path = %path.display(), "scene loaded");
        Ok(())
    }
}

/// Error during serialization or deserialization
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    /// A referenced id has no corresponding live object
    #[error("No live object for referenced id {0}")]
    UnknownReference(Uuid),

    /// Document edge linkage violates a graph invariant
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// File I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed document
    #[error("Malformed document: {0}")]
    Format(#[from] serde_json::Error),
}
