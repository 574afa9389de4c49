// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene: root owner of nodes and edges.
//!
//! All structural mutation goes through the scene so that invariants hold
//! at every return: an input socket is the destination of at most one
//! edge, and every edge endpoint references a socket on a node the scene
//! currently owns. Removing a node cascade-removes the edges touching its
//! sockets before the node itself goes away.

use crate::edge::{Edge, EdgeId};
use crate::event::SceneEvents;
use crate::node::{Node, NodeId, NodeSpec};
use crate::socket::{Socket, SocketDirection, SocketId};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SceneId(pub Uuid);

impl SceneId {
    /// Create a new random scene ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SceneId {
    fn default() -> Self {
        Self::new()
    }
}

/// A node graph with dirty/invalid propagation and event listeners
pub struct Scene {
    id: SceneId,
    nodes: IndexMap<NodeId, Node>,
    edges: IndexMap<EdgeId, Edge>,
    pub(crate) events: SceneEvents,
    modified: bool,
}

impl Scene {
    /// Create a new empty scene
    pub fn new() -> Self {
        Self {
            id: SceneId::new(),
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
            events: SceneEvents::default(),
            modified: false,
        }
    }

    /// Get the scene ID
    pub fn id(&self) -> SceneId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: SceneId) {
        self.id = id;
    }

    // ------------------------------------------------------------------
    // Access
    // ------------------------------------------------------------------

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get an edge by ID
    pub fn edge(&self, edge_id: EdgeId) -> Option<&Edge> {
        self.edges.get(&edge_id)
    }

    /// Get all edges
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Get the number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Find a socket and the node owning it
    pub fn socket(&self, socket_id: SocketId) -> Option<(&Node, &Socket)> {
        self.nodes
            .values()
            .find_map(|n| n.socket(socket_id).map(|s| (n, s)))
    }

    /// The edge ending at an input socket, if any (at most one can)
    pub fn edge_into(&self, socket_id: SocketId) -> Option<&Edge> {
        self.edges.values().find(|e| e.end_socket == socket_id)
    }

    /// Edges starting at an output socket
    pub fn edges_from(&self, socket_id: SocketId) -> impl Iterator<Item = &Edge> {
        self.edges
            .values()
            .filter(move |e| e.start_socket == socket_id)
    }

    // ------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------

    /// Nodes feeding this node's input sockets, one entry per input socket
    /// in binding order; `None` marks an unconnected input
    pub fn input_nodes(&self, node_id: NodeId) -> Vec<Option<NodeId>> {
        let Some(node) = self.node(node_id) else {
            return Vec::new();
        };
        node.inputs
            .iter()
            .map(|s| self.edge_into(s.id).map(|e| e.start_node))
            .collect()
    }

    /// Distinct nodes one hop downstream of this node's output sockets,
    /// in edge insertion order
    pub fn output_nodes(&self, node_id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.node(node_id) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for socket in &node.outputs {
            for edge in self.edges_from(socket.id) {
                if !out.contains(&edge.end_node) {
                    out.push(edge.end_node);
                }
            }
        }
        out
    }

    /// The node plus everything transitively reachable through its output
    /// sockets, each visited once even under diamond fan-in or cycles
    fn reachable_from(&self, node_id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        if self.node(node_id).is_none() {
            return order;
        }
        let mut visited = HashSet::new();
        let mut stack = vec![node_id];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            order.push(current);
            for child in self.output_nodes(current) {
                if !visited.contains(&child) {
                    stack.push(child);
                }
            }
        }
        order
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Create a node from a spec and add it to the scene
    pub fn add_node(&mut self, spec: NodeSpec) -> NodeId {
        self.insert_node(Node::new(spec))
    }

    pub(crate) fn insert_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.nodes.insert(id, node);
        tracing::debug!(node = ?id, "node added");
        self.events.emit_node_added(id);
        self.set_modified(true);
        id
    }

    /// Remove a node, cascade-removing every edge touching its sockets
    ///
    /// Edge removal is observable through the edge-removed listeners
    /// before the node-removed listener fires. Fails with
    /// [`GraphError::DanglingReference`] if an edge would be left
    /// pointing at the removed node's sockets.
    pub fn remove_node(&mut self, node_id: NodeId) -> Result<Node, GraphError> {
        if !self.nodes.contains_key(&node_id) {
            return Err(GraphError::NodeNotFound(node_id));
        }
        let touching: Vec<EdgeId> = self
            .edges
            .values()
            .filter(|e| e.involves_node(node_id))
            .map(|e| e.id)
            .collect();
        for edge_id in touching {
            self.remove_edge(edge_id)?;
        }
        if let Some(edge) = self.edges.values().find(|e| e.involves_node(node_id)) {
            return Err(GraphError::DanglingReference {
                node: node_id,
                edge: edge.id,
            });
        }
        let node = self
            .nodes
            .swap_remove(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        tracing::debug!(node = ?node_id, "node removed");
        self.events.emit_node_removed(node_id);
        self.set_modified(true);
        Ok(node)
    }

    /// Connect an output socket to an input socket
    ///
    /// Fails if `from` is not an output, `to` is not an input, the socket
    /// types are incompatible, or the input socket is already connected.
    /// An occupied input is rejected rather than replaced; callers that
    /// want replacement remove the existing edge first (its ID is in the
    /// error).
    pub fn add_edge(&mut self, from: SocketId, to: SocketId) -> Result<EdgeId, ConnectionError> {
        self.add_edge_internal(EdgeId::new(), from, to)
    }

    pub(crate) fn add_edge_internal(
        &mut self,
        id: EdgeId,
        from: SocketId,
        to: SocketId,
    ) -> Result<EdgeId, ConnectionError> {
        let (start_node, start_socket) = self
            .socket(from)
            .ok_or(ConnectionError::SocketNotFound(from))?;
        let (start_node, start_dir, start_type) =
            (start_node.id, start_socket.direction, start_socket.socket_type);
        let (end_node, end_socket) = self
            .socket(to)
            .ok_or(ConnectionError::SocketNotFound(to))?;
        let (end_node, end_dir, end_type) =
            (end_node.id, end_socket.direction, end_socket.socket_type);

        if start_dir != SocketDirection::Output {
            return Err(ConnectionError::NotAnOutput(from));
        }
        if end_dir != SocketDirection::Input {
            return Err(ConnectionError::NotAnInput(to));
        }
        if !start_type.can_connect_to(end_type) {
            return Err(ConnectionError::IncompatibleTypes { from, to });
        }
        if let Some(existing) = self.edge_into(to) {
            return Err(ConnectionError::InputOccupied {
                socket: to,
                edge: existing.id,
            });
        }

        let edge = Edge {
            id,
            start_node,
            start_socket: from,
            end_node,
            end_socket: to,
        };
        self.edges.insert(id, edge);
        tracing::debug!(edge = ?id, "edge added");
        self.events.emit_edge_added(id);
        self.set_modified(true);
        Ok(id)
    }

    /// Remove an edge, detaching it from both endpoint sockets
    ///
    /// Does not touch node flags by itself.
    pub fn remove_edge(&mut self, edge_id: EdgeId) -> Result<Edge, GraphError> {
        let edge = self
            .edges
            .swap_remove(&edge_id)
            .ok_or(GraphError::EdgeNotFound(edge_id))?;
        tracing::debug!(edge = ?edge_id, "edge removed");
        self.events.emit_edge_removed(edge_id);
        self.set_modified(true);
        Ok(edge)
    }

    /// Remove every node and edge, emitting removal events
    pub fn clear(&mut self) {
        let edge_ids: Vec<EdgeId> = self.edges.keys().copied().collect();
        for id in edge_ids {
            let _ = self.remove_edge(id);
        }
        let node_ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        for id in node_ids {
            let _ = self.remove_node(id);
        }
    }

    // ------------------------------------------------------------------
    // Dirty/invalid flags
    // ------------------------------------------------------------------

    /// Set a node's dirty flag
    ///
    /// Returns whether the flag actually changed. The dirty-changed
    /// listeners fire exactly once per call that changes state; writing
    /// the value already held is a no-op that fires nothing.
    pub fn set_dirty(&mut self, node_id: NodeId, value: bool) -> bool {
        let Some(node) = self.nodes.get_mut(&node_id) else {
            return false;
        };
        if node.dirty == value {
            return false;
        }
        node.dirty = value;
        self.events.emit_node_dirty(node_id, value);
        true
    }

    /// Set a node's invalid flag; same transition semantics as [`Scene::set_dirty`]
    pub fn set_invalid(&mut self, node_id: NodeId, value: bool) -> bool {
        let Some(node) = self.nodes.get_mut(&node_id) else {
            return false;
        };
        if node.invalid == value {
            return false;
        }
        node.invalid = value;
        self.events.emit_node_invalid(node_id, value);
        true
    }

    /// Set the dirty flag on every node one hop downstream, never on the node itself
    pub fn mark_children_dirty(&mut self, node_id: NodeId, value: bool) {
        for child in self.output_nodes(node_id) {
            self.set_dirty(child, value);
        }
    }

    /// Set the dirty flag on the node and every transitively reachable descendant
    pub fn mark_descendants_dirty(&mut self, node_id: NodeId, value: bool) {
        for node in self.reachable_from(node_id) {
            self.set_dirty(node, value);
        }
    }

    /// Set the invalid flag on every node one hop downstream, never on the node itself
    pub fn mark_children_invalid(&mut self, node_id: NodeId, value: bool) {
        for child in self.output_nodes(node_id) {
            self.set_invalid(child, value);
        }
    }

    /// Set the invalid flag on the node and every transitively reachable descendant
    pub fn mark_descendants_invalid(&mut self, node_id: NodeId, value: bool) {
        for node in self.reachable_from(node_id) {
            self.set_invalid(node, value);
        }
    }

    // ------------------------------------------------------------------
    // Modified tracking
    // ------------------------------------------------------------------

    /// Whether the scene changed since it was last saved or loaded
    pub fn has_been_modified(&self) -> bool {
        self.modified
    }

    /// Set the modified flag, firing the modified-changed listeners on transition
    ///
    /// Structural mutation sets this automatically; persistence and
    /// history layers clear or restore it.
    pub fn set_modified(&mut self, value: bool) {
        if self.modified == value {
            return;
        }
        self.modified = value;
        self.events.emit_modified_changed(value);
    }

    // ------------------------------------------------------------------
    // Listener registration
    // ------------------------------------------------------------------

    /// Register a callback for node dirty-flag transitions
    pub fn add_node_dirty_listener(&mut self, callback: impl FnMut(NodeId, bool) + 'static) {
        self.events.node_dirty.push(Box::new(callback));
    }

    /// Register a callback for node invalid-flag transitions
    pub fn add_node_invalid_listener(&mut self, callback: impl FnMut(NodeId, bool) + 'static) {
        self.events.node_invalid.push(Box::new(callback));
    }

    /// Register a callback fired after a node is added
    pub fn add_node_added_listener(&mut self, callback: impl FnMut(NodeId) + 'static) {
        self.events.node_added.push(Box::new(callback));
    }

    /// Register a callback fired after a node is removed
    pub fn add_node_removed_listener(&mut self, callback: impl FnMut(NodeId) + 'static) {
        self.events.node_removed.push(Box::new(callback));
    }

    /// Register a callback fired after an edge is added
    pub fn add_edge_added_listener(&mut self, callback: impl FnMut(EdgeId) + 'static) {
        self.events.edge_added.push(Box::new(callback));
    }

    /// Register a callback fired after an edge is removed
    pub fn add_edge_removed_listener(&mut self, callback: impl FnMut(EdgeId) + 'static) {
        self.events.edge_removed.push(Box::new(callback));
    }

    /// Register a callback for modified-flag transitions
    pub fn add_modified_changed_listener(&mut self, callback: impl FnMut(bool) + 'static) {
        self.events.modified_changed.push(Box::new(callback));
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("id", &self.id)
            .field("nodes", &self.nodes.len())
            .field("edges", &self.edges.len())
            .field("modified", &self.modified)
            .finish()
    }
}

/// Error when creating an edge
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// Socket not found in the scene
    #[error("Socket not found: {0:?}")]
    SocketNotFound(SocketId),

    /// Edge must start at an output socket
    #[error("Edge must start at an output socket, {0:?} is an input")]
    NotAnOutput(SocketId),

    /// Edge must end at an input socket
    #[error("Edge must end at an input socket, {0:?} is an output")]
    NotAnInput(SocketId),

    /// Incompatible socket types
    #[error("Incompatible socket types between {from:?} and {to:?}")]
    IncompatibleTypes {
        /// Output-side socket
        from: SocketId,
        /// Input-side socket
        to: SocketId,
    },

    /// Input socket is already connected
    #[error("Input socket {socket:?} is already connected by edge {edge:?}")]
    InputOccupied {
        /// The occupied input socket
        socket: SocketId,
        /// The edge currently occupying it
        edge: EdgeId,
    },
}

/// Error from structural graph operations
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Node not found
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Edge not found
    #[error("Edge not found: {0:?}")]
    EdgeNotFound(EdgeId),

    /// Removal would leave an edge pointing at a deleted socket
    #[error("Removing node {node:?} would leave edge {edge:?} dangling")]
    DanglingReference {
        /// The node being removed
        node: NodeId,
        /// The edge that would dangle
        edge: EdgeId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::socket::SocketType;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn number_node(scene: &mut Scene, title: &str, inputs: usize, outputs: usize) -> NodeId {
        scene.add_node(
            NodeSpec::new(title, "test")
                .with_inputs(&vec![SocketType::Number; inputs])
                .with_outputs(&vec![SocketType::Number; outputs]),
        )
    }

    fn connect(scene: &mut Scene, from: NodeId, from_out: usize, to: NodeId, to_in: usize) -> EdgeId {
        let start = scene.node(from).unwrap().outputs[from_out].id;
        let end = scene.node(to).unwrap().inputs[to_in].id;
        scene.add_edge(start, end).unwrap()
    }

    #[test]
    fn test_add_edge_validates_directions() {
        let mut scene = Scene::new();
        let a = number_node(&mut scene, "A", 1, 1);
        let b = number_node(&mut scene, "B", 1, 1);
        let a_out = scene.node(a).unwrap().outputs[0].id;
        let a_in = scene.node(a).unwrap().inputs[0].id;
        let b_out = scene.node(b).unwrap().outputs[0].id;
        let b_in = scene.node(b).unwrap().inputs[0].id;

        assert!(matches!(
            scene.add_edge(a_in, b_in),
            Err(ConnectionError::NotAnOutput(_))
        ));
        assert!(matches!(
            scene.add_edge(a_out, b_out),
            Err(ConnectionError::NotAnInput(_))
        ));
        assert!(scene.add_edge(a_out, b_in).is_ok());
    }

    #[test]
    fn test_add_edge_rejects_occupied_input() {
        let mut scene = Scene::new();
        let a = number_node(&mut scene, "A", 0, 1);
        let b = number_node(&mut scene, "B", 0, 1);
        let c = number_node(&mut scene, "C", 1, 0);
        let first = connect(&mut scene, a, 0, c, 0);

        let b_out = scene.node(b).unwrap().outputs[0].id;
        let c_in = scene.node(c).unwrap().inputs[0].id;
        let err = scene.add_edge(b_out, c_in).unwrap_err();
        match err {
            ConnectionError::InputOccupied { socket, edge } => {
                assert_eq!(socket, c_in);
                assert_eq!(edge, first);
            }
            other => panic!("unexpected error: {other}"),
        }

        // replacement is remove-then-add
        scene.remove_edge(first).unwrap();
        assert!(scene.add_edge(b_out, c_in).is_ok());
        assert_eq!(scene.edge_count(), 1);
    }

    #[test]
    fn test_add_edge_rejects_incompatible_types() {
        let mut scene = Scene::new();
        let a = scene.add_node(NodeSpec::new("A", "test").with_outputs(&[SocketType::Text]));
        let b = scene.add_node(NodeSpec::new("B", "test").with_inputs(&[SocketType::Number]));
        let a_out = scene.node(a).unwrap().outputs[0].id;
        let b_in = scene.node(b).unwrap().inputs[0].id;
        assert!(matches!(
            scene.add_edge(a_out, b_in),
            Err(ConnectionError::IncompatibleTypes { .. })
        ));
    }

    #[test]
    fn test_remove_node_cascades_edges() {
        let mut scene = Scene::new();
        let a = number_node(&mut scene, "A", 0, 1);
        let b = number_node(&mut scene, "B", 2, 1);
        let c = number_node(&mut scene, "C", 1, 0);
        connect(&mut scene, a, 0, b, 0);
        connect(&mut scene, b, 0, c, 0);
        assert_eq!(scene.edge_count(), 2);

        let removed_edges = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&removed_edges);
        scene.add_edge_removed_listener(move |id| log.borrow_mut().push(id));

        scene.remove_node(b).unwrap();
        assert_eq!(scene.node_count(), 2);
        assert_eq!(scene.edge_count(), 0);
        assert_eq!(removed_edges.borrow().len(), 2);
    }

    #[test]
    fn test_input_nodes_are_ordered_by_socket() {
        let mut scene = Scene::new();
        let a = number_node(&mut scene, "A", 0, 1);
        let b = number_node(&mut scene, "B", 0, 1);
        let c = number_node(&mut scene, "C", 3, 0);
        connect(&mut scene, b, 0, c, 2);
        connect(&mut scene, a, 0, c, 0);

        assert_eq!(scene.input_nodes(c), vec![Some(a), None, Some(b)]);
    }

    #[test]
    fn test_output_nodes_dedup_fan_out() {
        let mut scene = Scene::new();
        let a = number_node(&mut scene, "A", 0, 2);
        let b = number_node(&mut scene, "B", 2, 0);
        connect(&mut scene, a, 0, b, 0);
        connect(&mut scene, a, 1, b, 1);
        assert_eq!(scene.output_nodes(a), vec![b]);
    }

    #[test]
    fn test_descendants_marking_visits_once_in_diamond() {
        // A fans out to B and C which both feed D
        let mut scene = Scene::new();
        let a = number_node(&mut scene, "A", 0, 2);
        let b = number_node(&mut scene, "B", 1, 1);
        let c = number_node(&mut scene, "C", 1, 1);
        let d = number_node(&mut scene, "D", 2, 0);
        connect(&mut scene, a, 0, b, 0);
        connect(&mut scene, a, 1, c, 0);
        connect(&mut scene, b, 0, d, 0);
        connect(&mut scene, c, 0, d, 1);

        let fired = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&fired);
        scene.add_node_dirty_listener(move |id, value| log.borrow_mut().push((id, value)));

        scene.mark_descendants_dirty(a, true);
        for id in [a, b, c, d] {
            assert!(scene.node(id).unwrap().is_dirty());
        }
        // exactly one callback per node despite the diamond
        assert_eq!(fired.borrow().len(), 4);
    }

    #[test]
    fn test_descendants_marking_survives_cycles() {
        let mut scene = Scene::new();
        let a = number_node(&mut scene, "A", 1, 1);
        let b = number_node(&mut scene, "B", 1, 1);
        connect(&mut scene, a, 0, b, 0);
        connect(&mut scene, b, 0, a, 0);

        scene.mark_descendants_invalid(a, true);
        assert!(scene.node(a).unwrap().is_invalid());
        assert!(scene.node(b).unwrap().is_invalid());
    }

    #[test]
    fn test_children_marking_skips_self() {
        let mut scene = Scene::new();
        let a = number_node(&mut scene, "A", 0, 1);
        let b = number_node(&mut scene, "B", 1, 0);
        connect(&mut scene, a, 0, b, 0);

        scene.mark_children_dirty(a, true);
        assert!(!scene.node(a).unwrap().is_dirty());
        assert!(scene.node(b).unwrap().is_dirty());
    }

    #[test]
    fn test_flag_writes_fire_once_per_transition() {
        let mut scene = Scene::new();
        let a = number_node(&mut scene, "A", 0, 0);

        let count = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&count);
        scene.add_node_dirty_listener(move |_, _| *counter.borrow_mut() += 1);

        assert!(scene.set_dirty(a, true));
        assert!(!scene.set_dirty(a, true));
        assert!(scene.set_dirty(a, false));
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn test_modified_flag_tracks_mutation() {
        let mut scene = Scene::new();
        assert!(!scene.has_been_modified());
        let a = number_node(&mut scene, "A", 0, 0);
        assert!(scene.has_been_modified());
        scene.set_modified(false);
        scene.remove_node(a).unwrap();
        assert!(scene.has_been_modified());
    }

    #[test]
    fn test_structural_listeners() {
        let mut scene = Scene::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let added = Rc::clone(&log);
        scene.add_node_added_listener(move |id| added.borrow_mut().push(id));

        let a = number_node(&mut scene, "A", 0, 0);
        assert_eq!(*log.borrow(), vec![a]);
    }
}
