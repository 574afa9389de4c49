// SPDX-License-Identifier: MIT OR Apache-2.0
//! Headless calculator graph: two inputs feeding add/multiply nodes.
//!
//! Run with `cargo run --example calculator`.

use nodeforge_graph::{
    Compute, ComputeCtx, ComputeRegistry, EvaluationError, Evaluator, Node, NodeSpec, Scene,
    SocketType, Value,
};

/// Constant source reading its number from the node content
struct Constant;

impl Compute for Constant {
    fn compute(
        &self,
        node: &Node,
        _inputs: &[Value],
        ctx: &mut ComputeCtx,
    ) -> Result<Value, EvaluationError> {
        match node.content.get("value").and_then(serde_json::Value::as_f64) {
            Some(n) => Ok(Value::Number(n)),
            None => {
                // soft failure: stay evaluable downstream, flag staleness
                ctx.mark_invalid();
                Ok(Value::Nothing)
            }
        }
    }
}

fn binary_op(
    op: impl Fn(f64, f64) -> f64 + 'static,
) -> impl Fn(&Node, &[Value], &mut ComputeCtx) -> Result<Value, EvaluationError> {
    move |_node, inputs, _ctx| {
        let a = inputs.first().and_then(Value::as_number).unwrap_or(0.0);
        let b = inputs.get(1).and_then(Value::as_number).unwrap_or(0.0);
        Ok(Value::Number(op(a, b)))
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut registry = ComputeRegistry::new();
    registry.register("constant", Constant);
    registry.register("add", binary_op(|a, b| a + b));
    registry.register("multiply", binary_op(|a, b| a * b));
    let evaluator = Evaluator::new(registry);

    let mut scene = Scene::new();
    scene.add_node_dirty_listener(|id, value| {
        tracing::debug!(node = ?id, value, "dirty flag changed");
    });

    let four = scene.add_node(
        NodeSpec::new("Four", "constant")
            .with_outputs(&[SocketType::Number])
            .with_content(serde_json::json!({"value": 4.0})),
    );
    let three = scene.add_node(
        NodeSpec::new("Three", "constant")
            .with_outputs(&[SocketType::Number])
            .with_content(serde_json::json!({"value": 3.0})),
    );
    let add = scene.add_node(
        NodeSpec::new("Add", "add")
            .with_inputs(&[SocketType::Number, SocketType::Number])
            .with_outputs(&[SocketType::Number]),
    );
    let double = scene.add_node(
        NodeSpec::new("Double", "multiply")
            .with_inputs(&[SocketType::Number, SocketType::Number])
            .with_outputs(&[SocketType::Number]),
    );

    let wire = |scene: &mut Scene, from: nodeforge_graph::NodeId, out: usize, to: nodeforge_graph::NodeId, index: usize| {
        let start = scene.node(from).expect("node").outputs[out].id;
        let end = scene.node(to).expect("node").inputs[index].id;
        scene.add_edge(start, end).expect("connection");
    };
    wire(&mut scene, four, 0, add, 0);
    wire(&mut scene, three, 0, add, 1);
    wire(&mut scene, add, 0, double, 0);
    wire(&mut scene, four, 0, double, 1);

    let result = evaluator.eval(&mut scene, double).expect("evaluation");
    tracing::info!(?result, "(4 + 3) * 4");

    // edit a constant, mark downstream stale, re-evaluate lazily
    if let Some(node) = scene.node_mut(four) {
        node.content = serde_json::json!({"value": 10.0});
    }
    scene.mark_descendants_dirty(four, true);
    let result = evaluator.eval(&mut scene, double).expect("evaluation");
    tracing::info!(?result, "(10 + 3) * 10");
}
