// SPDX-License-Identifier: MIT OR Apache-2.0
//! Listener registration for scene events.
//!
//! Every event kind keeps its own ordered listener list. Listeners run
//! synchronously, in registration order, with no isolation: a listener
//! that panics unwinds into the caller of the mutation that fired it.

use crate::edge::EdgeId;
use crate::node::NodeId;

/// Callback for node flag transitions; receives the node and the new flag value
pub type FlagListener = Box<dyn FnMut(NodeId, bool)>;
/// Callback for structural node events
pub type NodeListener = Box<dyn FnMut(NodeId)>;
/// Callback for structural edge events
pub type EdgeListener = Box<dyn FnMut(EdgeId)>;
/// Callback for scene modified-state transitions
pub type ModifiedListener = Box<dyn FnMut(bool)>;

/// Listener lists for every scene event kind
#[derive(Default)]
pub struct SceneEvents {
    pub(crate) node_dirty: Vec<FlagListener>,
    pub(crate) node_invalid: Vec<FlagListener>,
    pub(crate) node_added: Vec<NodeListener>,
    pub(crate) node_removed: Vec<NodeListener>,
    pub(crate) edge_added: Vec<EdgeListener>,
    pub(crate) edge_removed: Vec<EdgeListener>,
    pub(crate) modified_changed: Vec<ModifiedListener>,
}

impl SceneEvents {
    pub(crate) fn emit_node_dirty(&mut self, id: NodeId, value: bool) {
        for listener in &mut self.node_dirty {
            listener(id, value);
        }
    }

    pub(crate) fn emit_node_invalid(&mut self, id: NodeId, value: bool) {
        for listener in &mut self.node_invalid {
            listener(id, value);
        }
    }

    pub(crate) fn emit_node_added(&mut self, id: NodeId) {
        for listener in &mut self.node_added {
            listener(id);
        }
    }

    pub(crate) fn emit_node_removed(&mut self, id: NodeId) {
        for listener in &mut self.node_removed {
            listener(id);
        }
    }

    pub(crate) fn emit_edge_added(&mut self, id: EdgeId) {
        for listener in &mut self.edge_added {
            listener(id);
        }
    }

    pub(crate) fn emit_edge_removed(&mut self, id: EdgeId) {
        for listener in &mut self.edge_removed {
            listener(id);
        }
    }

    pub(crate) fn emit_modified_changed(&mut self, value: bool) {
        for listener in &mut self.modified_changed {
            listener(value);
        }
    }
}
