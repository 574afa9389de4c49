// SPDX-License-Identifier: MIT OR Apache-2.0
//! Edge definitions for the graph engine.

use crate::node::NodeId;
use crate::socket::SocketId;
use uuid::Uuid;

/// Unique identifier for an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct EdgeId(pub Uuid);

impl EdgeId {
    /// Create a new random edge ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

/// A directed connection from an output socket to an input socket
///
/// Edges are owned by the scene and hold endpoint handles, not the
/// endpoints themselves: removing an edge never removes a socket, while
/// removing either endpoint node cascade-removes the edge.
#[derive(Debug, Clone)]
pub struct Edge {
    /// Unique edge ID
    pub id: EdgeId,
    /// Node owning the output socket
    pub start_node: NodeId,
    /// Output socket the edge starts at
    pub start_socket: SocketId,
    /// Node owning the input socket
    pub end_node: NodeId,
    /// Input socket the edge ends at
    pub end_socket: SocketId,
}

impl Edge {
    /// Check if this edge touches a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.start_node == node_id || self.end_node == node_id
    }

    /// Check if this edge touches a specific socket
    pub fn involves_socket(&self, socket_id: SocketId) -> bool {
        self.start_socket == socket_id || self.end_socket == socket_id
    }
}
