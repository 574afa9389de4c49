// SPDX-License-Identifier: MIT OR Apache-2.0
//! Identity registry resolving persisted ids to live handles.
//!
//! Every serializable entity carries a unique id. While a document loads,
//! the registry maps each persisted id to the live entity created for it,
//! so cross-references (edge endpoints) resolve to objects instead of
//! being duplicated. The registry guarantees no two live entities share
//! an id: a persisted id that collides with one already registered, or a
//! load that asked for fresh ids, is remapped to a newly minted id and
//! every later reference resolves through the remap.

use crate::edge::EdgeId;
use crate::node::NodeId;
use crate::scene::Scene;
use crate::socket::SocketId;
use std::collections::HashMap;
use uuid::Uuid;

/// Live handle to a scene entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityHandle {
    /// A node
    Node(NodeId),
    /// A socket on some node
    Socket(SocketId),
    /// An edge
    Edge(EdgeId),
}

/// Maps persisted identifiers to live entities while a document loads
#[derive(Debug, Default)]
pub struct IdRegistry {
    entries: HashMap<Uuid, EntityHandle>,
}

impl IdRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Record the ids already live in a scene so collisions are detected
    pub fn seed(&mut self, scene: &Scene) {
        for node in scene.nodes() {
            self.entries.insert(node.id.0, EntityHandle::Node(node.id));
            for socket in node.sockets() {
                self.entries
                    .insert(socket.id.0, EntityHandle::Socket(socket.id));
            }
        }
        for edge in scene.edges() {
            self.entries.insert(edge.id.0, EntityHandle::Edge(edge.id));
        }
    }

    /// Whether an id is already taken by a registered entity
    pub fn contains(&self, id: Uuid) -> bool {
        self.entries.contains_key(&id)
    }

    /// Claim a node id for a persisted fragment
    ///
    /// Keeps the persisted id when `restore` is set and the id is free;
    /// mints a fresh one otherwise. Either way the persisted id resolves
    /// to the claimed node from now on.
    pub fn claim_node(&mut self, persisted: Uuid, restore: bool) -> NodeId {
        let id = if restore && !self.contains(persisted) {
            NodeId(persisted)
        } else {
            NodeId::new()
        };
        self.entries.insert(persisted, EntityHandle::Node(id));
        id
    }

    /// Claim a socket id for a persisted fragment; same rules as [`IdRegistry::claim_node`]
    pub fn claim_socket(&mut self, persisted: Uuid, restore: bool) -> SocketId {
        let id = if restore && !self.contains(persisted) {
            SocketId(persisted)
        } else {
            SocketId::new()
        };
        self.entries.insert(persisted, EntityHandle::Socket(id));
        id
    }

    /// Claim an edge id for a persisted fragment; same rules as [`IdRegistry::claim_node`]
    pub fn claim_edge(&mut self, persisted: Uuid, restore: bool) -> EdgeId {
        let id = if restore && !self.contains(persisted) {
            EdgeId(persisted)
        } else {
            EdgeId::new()
        };
        self.entries.insert(persisted, EntityHandle::Edge(id));
        id
    }

    /// Resolve a persisted id to a live handle
    pub fn resolve(&self, persisted: Uuid) -> Option<EntityHandle> {
        self.entries.get(&persisted).copied()
    }

    /// Resolve a persisted id to a live node
    pub fn resolve_node(&self, persisted: Uuid) -> Option<NodeId> {
        match self.resolve(persisted)? {
            EntityHandle::Node(id) => Some(id),
            _ => None,
        }
    }

    /// Resolve a persisted id to a live socket
    pub fn resolve_socket(&self, persisted: Uuid) -> Option<SocketId> {
        match self.resolve(persisted)? {
            EntityHandle::Socket(id) => Some(id),
            _ => None,
        }
    }
}
