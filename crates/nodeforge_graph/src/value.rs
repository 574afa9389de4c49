// SPDX-License-Identifier: MIT OR Apache-2.0
//! Values produced by node evaluation.

use crate::socket::SocketType;
use serde::{Deserialize, Serialize};

/// Value flowing through the graph during evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum Value {
    /// No value; the neutral result of unconnected inputs and placeholder nodes
    #[default]
    Nothing,
    /// Floating point number
    Number(f64),
    /// Boolean value
    Bool(bool),
    /// Text value
    Text(String),
}

impl Value {
    /// Get the number if this is a numeric value
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the boolean if this is a boolean value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the text if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the socket type this value flows through
    pub fn socket_type(&self) -> SocketType {
        match self {
            Self::Nothing => SocketType::Any,
            Self::Number(_) => SocketType::Number,
            Self::Bool(_) => SocketType::Boolean,
            Self::Text(_) => SocketType::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Number(2.5).as_number(), Some(2.5));
        assert_eq!(Value::Nothing.as_number(), None);
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Text("hi".into()).as_text(), Some("hi"));
    }

    #[test]
    fn test_socket_types() {
        assert_eq!(Value::Nothing.socket_type(), SocketType::Any);
        assert_eq!(Value::Number(0.0).socket_type(), SocketType::Number);
    }
}
