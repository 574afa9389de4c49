// SPDX-License-Identifier: MIT OR Apache-2.0
//! Socket definitions for node inputs/outputs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SocketId(pub Uuid);

impl SocketId {
    /// Create a new random socket ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SocketId {
    fn default() -> Self {
        Self::new()
    }
}

/// Socket direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SocketDirection {
    /// Input socket; destination of at most one edge
    Input,
    /// Output socket; source of any number of edges
    Output,
}

/// Data type that can flow through a socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SocketType {
    /// Any type (for generic nodes)
    Any,
    /// Floating point number
    Number,
    /// Boolean value
    Boolean,
    /// Text value
    Text,
}

impl SocketType {
    /// Check if this type can connect to another type
    pub fn can_connect_to(self, other: SocketType) -> bool {
        if matches!(self, Self::Any) || matches!(other, Self::Any) {
            return true;
        }
        self == other
    }
}

/// A connection point on a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Socket {
    /// Unique socket ID
    pub id: SocketId,
    /// Socket direction
    pub direction: SocketDirection,
    /// Position within this direction's sequence on the owning node
    pub index: usize,
    /// Data type
    pub socket_type: SocketType,
}

impl Socket {
    /// Create a new input socket at the given position
    pub fn input(index: usize, socket_type: SocketType) -> Self {
        Self {
            id: SocketId::new(),
            direction: SocketDirection::Input,
            index,
            socket_type,
        }
    }

    /// Create a new output socket at the given position
    pub fn output(index: usize, socket_type: SocketType) -> Self {
        Self {
            id: SocketId::new(),
            direction: SocketDirection::Output,
            index,
            socket_type,
        }
    }
}
