// SPDX-License-Identifier: MIT OR Apache-2.0
//! Lazy, dependency-aware graph evaluation.
//!
//! Evaluation is demand-driven: asking for a node's value first resolves
//! its input dependencies, recursing only into upstream nodes that are
//! dirty, invalid, or never evaluated. `invalid` dominates `dirty`: an
//! invalid node is recomputed no matter what its dirty flag says. Cyclic
//! topology is a legal input and surfaces as an error, not a hang.

use crate::node::{Node, NodeId};
use crate::scene::Scene;
use crate::value::Value;
use indexmap::IndexMap;

/// Per-call scratch handed to compute implementations
pub struct ComputeCtx {
    invalid: bool,
}

impl ComputeCtx {
    pub(crate) fn new() -> Self {
        Self { invalid: false }
    }

    /// Flag the node invalid while still returning a value
    ///
    /// The soft-failure channel: the returned value is cached as a
    /// sentinel, downstream evaluation continues, and observers see the
    /// invalid transition through the scene listeners.
    pub fn mark_invalid(&mut self) {
        self.invalid = true;
    }
}

/// Compute behavior for one node type
pub trait Compute {
    /// Produce the node's value from its resolved inputs
    ///
    /// `inputs` holds one value per input socket in binding order, with
    /// [`Value::Nothing`] standing in for unconnected inputs. Returning
    /// an error is a hard failure: the engine marks the node and all of
    /// its descendants invalid and surfaces the error to the caller.
    fn compute(
        &self,
        node: &Node,
        inputs: &[Value],
        ctx: &mut ComputeCtx,
    ) -> Result<Value, EvaluationError>;
}

impl<F> Compute for F
where
    F: Fn(&Node, &[Value], &mut ComputeCtx) -> Result<Value, EvaluationError>,
{
    fn compute(
        &self,
        node: &Node,
        inputs: &[Value],
        ctx: &mut ComputeCtx,
    ) -> Result<Value, EvaluationError> {
        self(node, inputs, ctx)
    }
}

/// Registry of compute implementations keyed by node type key
#[derive(Default)]
pub struct ComputeRegistry {
    computes: IndexMap<String, Box<dyn Compute>>,
}

impl ComputeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            computes: IndexMap::new(),
        }
    }

    /// Register a compute implementation for a node type key
    pub fn register(&mut self, type_key: impl Into<String>, compute: impl Compute + 'static) {
        self.computes.insert(type_key.into(), Box::new(compute));
    }

    /// Get the compute implementation for a type key
    pub fn get(&self, type_key: &str) -> Option<&dyn Compute> {
        self.computes.get(type_key).map(Box::as_ref)
    }
}

/// Evaluation engine walking input dependencies on demand
pub struct Evaluator {
    registry: ComputeRegistry,
}

impl Evaluator {
    /// Create an evaluator over a compute registry
    pub fn new(registry: ComputeRegistry) -> Self {
        Self { registry }
    }

    /// Get the compute registry
    pub fn registry(&self) -> &ComputeRegistry {
        &self.registry
    }

    /// Get the compute registry mutably
    pub fn registry_mut(&mut self) -> &mut ComputeRegistry {
        &mut self.registry
    }

    /// Compute and return a node's value
    ///
    /// On success the node's dirty and invalid flags are cleared and the
    /// value cached. Nodes whose type key has no registered compute are
    /// placeholders: they return [`Value::Nothing`] and leave their flags
    /// untouched.
    pub fn eval(&self, scene: &mut Scene, node_id: NodeId) -> Result<Value, EvaluationError> {
        let mut stack = Vec::new();
        self.eval_node(scene, node_id, &mut stack)
    }

    /// Evaluate only the nodes one hop downstream of this node
    ///
    /// The node's own compute is never called directly; children that
    /// depend on it treat it as an ordinary upstream dependency.
    pub fn eval_children(&self, scene: &mut Scene, node_id: NodeId) -> Result<(), EvaluationError> {
        if scene.node(node_id).is_none() {
            return Err(EvaluationError::NodeNotFound(node_id));
        }
        for child in scene.output_nodes(node_id) {
            self.eval(scene, child)?;
        }
        Ok(())
    }

    fn eval_node(
        &self,
        scene: &mut Scene,
        node_id: NodeId,
        stack: &mut Vec<NodeId>,
    ) -> Result<Value, EvaluationError> {
        if stack.contains(&node_id) {
            return Err(EvaluationError::CyclicDependency(node_id));
        }

        let type_key = {
            let node = scene
                .node(node_id)
                .ok_or(EvaluationError::NodeNotFound(node_id))?;
            // invalid forces recomputation regardless of dirty
            if !node.is_dirty() && !node.is_invalid() {
                if let Some(value) = node.cached_value() {
                    tracing::trace!(node = ?node_id, "using cached value");
                    return Ok(value.clone());
                }
            }
            node.type_key.clone()
        };

        let Some(compute) = self.registry.get(&type_key) else {
            tracing::trace!(node = ?node_id, type_key = %type_key, "no compute registered, neutral value");
            return Ok(Value::default());
        };

        stack.push(node_id);
        let mut inputs = Vec::new();
        for upstream in scene.input_nodes(node_id) {
            let value = match upstream {
                Some(dep) => match self.eval_node(scene, dep, stack) {
                    Ok(value) => value,
                    Err(err) => {
                        stack.pop();
                        return Err(err);
                    }
                },
                None => Value::default(),
            };
            inputs.push(value);
        }

        let mut ctx = ComputeCtx::new();
        let outcome = {
            let node = scene
                .node(node_id)
                .ok_or(EvaluationError::NodeNotFound(node_id))?;
            compute.compute(node, &inputs, &mut ctx)
        };
        stack.pop();

        match outcome {
            Ok(value) => {
                tracing::trace!(node = ?node_id, soft_invalid = ctx.invalid, "node evaluated");
                scene.set_dirty(node_id, false);
                scene.set_invalid(node_id, ctx.invalid);
                if let Some(node) = scene.node_mut(node_id) {
                    node.value = Some(value.clone());
                }
                Ok(value)
            }
            Err(err) => {
                // a hard failure leaves every descendant stale
                scene.mark_descendants_invalid(node_id, true);
                Err(err)
            }
        }
    }
}

/// Error during evaluation
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    /// Node not found
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Evaluation re-entered a node already on its own call stack
    #[error("Cyclic dependency detected at node {0:?}")]
    CyclicDependency(NodeId),

    /// Failure raised by a compute implementation
    #[error("{0}")]
    Custom(String),
}
