// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the graph engine.

use crate::socket::{Socket, SocketId, SocketType};
use crate::value::Value;
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Blueprint describing a node to create
#[derive(Debug, Clone)]
pub struct NodeSpec {
    /// Display title
    pub title: String,
    /// Key selecting the compute implementation in a registry
    pub type_key: String,
    /// Data types of the input sockets, in binding order
    pub inputs: Vec<SocketType>,
    /// Data types of the output sockets, in order
    pub outputs: Vec<SocketType>,
    /// Opaque payload handed to the node's content layer
    pub content: serde_json::Value,
}

impl NodeSpec {
    /// Create a new spec with no sockets and empty content
    pub fn new(title: impl Into<String>, type_key: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            type_key: type_key.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            content: serde_json::Value::Null,
        }
    }

    /// Set the input socket types
    pub fn with_inputs(mut self, inputs: &[SocketType]) -> Self {
        self.inputs = inputs.to_vec();
        self
    }

    /// Set the output socket types
    pub fn with_outputs(mut self, outputs: &[SocketType]) -> Self {
        self.outputs = outputs.to_vec();
        self
    }

    /// Set the content payload
    pub fn with_content(mut self, content: serde_json::Value) -> Self {
        self.content = content;
        self
    }
}

/// A node instance in a scene
///
/// Carries two independent flags: `dirty` ("inputs changed since the last
/// successful evaluation") and `invalid` ("the last evaluation failed or
/// never ran"). Both start false. Flag writes go through the owning
/// [`Scene`](crate::scene::Scene) so listeners observe every transition.
#[derive(Debug, Clone)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Display title
    pub title: String,
    /// Key selecting the compute implementation for this node
    pub type_key: String,
    /// Opaque payload owned by the node's content layer
    pub content: serde_json::Value,
    /// Input sockets; the index is the binding position
    pub inputs: Vec<Socket>,
    /// Output sockets, in order
    pub outputs: Vec<Socket>,
    pub(crate) dirty: bool,
    pub(crate) invalid: bool,
    pub(crate) value: Option<Value>,
}

impl Node {
    pub(crate) fn new(spec: NodeSpec) -> Self {
        let inputs = spec
            .inputs
            .iter()
            .enumerate()
            .map(|(index, ty)| Socket::input(index, *ty))
            .collect();
        let outputs = spec
            .outputs
            .iter()
            .enumerate()
            .map(|(index, ty)| Socket::output(index, *ty))
            .collect();
        Self::with_parts(
            NodeId::new(),
            spec.title,
            spec.type_key,
            spec.content,
            inputs,
            outputs,
        )
    }

    pub(crate) fn with_parts(
        id: NodeId,
        title: String,
        type_key: String,
        content: serde_json::Value,
        inputs: Vec<Socket>,
        outputs: Vec<Socket>,
    ) -> Self {
        Self {
            id,
            title,
            type_key,
            content,
            inputs,
            outputs,
            dirty: false,
            invalid: false,
            value: None,
        }
    }

    /// Get an input socket by position
    pub fn input(&self, index: usize) -> Option<&Socket> {
        self.inputs.get(index)
    }

    /// Get an output socket by position
    pub fn output(&self, index: usize) -> Option<&Socket> {
        self.outputs.get(index)
    }

    /// Get a socket by ID
    pub fn socket(&self, socket_id: SocketId) -> Option<&Socket> {
        self.sockets().find(|s| s.id == socket_id)
    }

    /// Get all sockets, inputs first
    pub fn sockets(&self) -> impl Iterator<Item = &Socket> {
        self.inputs.iter().chain(self.outputs.iter())
    }

    /// Whether the node's inputs changed since the last successful evaluation
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether the node's last evaluation failed or never ran to completion
    pub fn is_invalid(&self) -> bool {
        self.invalid
    }

    /// The value produced by the last successful evaluation, if any
    pub fn cached_value(&self) -> Option<&Value> {
        self.value.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_builds_ordered_sockets() {
        let node = Node::new(
            NodeSpec::new("Add", "add")
                .with_inputs(&[SocketType::Number, SocketType::Number])
                .with_outputs(&[SocketType::Number]),
        );
        assert_eq!(node.inputs.len(), 2);
        assert_eq!(node.outputs.len(), 1);
        assert_eq!(node.inputs[1].index, 1);
        assert!(!node.is_dirty());
        assert!(!node.is_invalid());
        assert!(node.cached_value().is_none());
    }

    #[test]
    fn test_socket_lookup() {
        let node = Node::new(
            NodeSpec::new("N", "n")
                .with_inputs(&[SocketType::Any])
                .with_outputs(&[SocketType::Any]),
        );
        let id = node.outputs[0].id;
        assert_eq!(node.socket(id).map(|s| s.direction), Some(crate::socket::SocketDirection::Output));
        assert!(node.socket(SocketId::new()).is_none());
    }
}
