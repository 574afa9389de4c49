// SPDX-License-Identifier: MIT OR Apache-2.0
//! Clipboard copy/cut/paste of scene fragments.
//!
//! The clipboard payload is an ordinary scene document holding the
//! selected nodes and only those edges whose both endpoints are inside
//! the selection; edges crossing the selection boundary are dropped.
//! Pasting merges the fragment back in with fresh ids, so the same
//! fragment can be pasted any number of times.

use nodeforge_graph::{
    DeserializeOpts, GraphError, NodeId, Scene, SceneDoc, SerializeError, SocketId,
};
use std::collections::HashSet;

/// Serialize the selected nodes and their internal edges
pub fn copy(scene: &Scene, selection: &[NodeId]) -> SceneDoc {
    let mut nodes = Vec::new();
    let mut sockets: HashSet<SocketId> = HashSet::new();
    for node_id in selection {
        let Some(node) = scene.node(*node_id) else {
            continue;
        };
        nodes.push(node.to_doc());
        sockets.extend(node.sockets().map(|s| s.id));
    }

    let edges = scene
        .edges()
        .filter(|e| sockets.contains(&e.start_socket) && sockets.contains(&e.end_socket))
        .map(nodeforge_graph::Edge::to_doc)
        .collect::<Vec<_>>();

    tracing::debug!(nodes = nodes.len(), edges = edges.len(), "copied selection");
    SceneDoc {
        id: scene.id().0,
        nodes,
        edges,
    }
}

/// Copy the selection, then remove it from the scene
pub fn cut(scene: &mut Scene, selection: &[NodeId]) -> Result<SceneDoc, GraphError> {
    let doc = copy(scene, selection);
    for node_id in selection {
        if scene.node(*node_id).is_some() {
            scene.remove_node(*node_id)?;
        }
    }
    Ok(doc)
}

/// Merge a copied fragment into the scene with fresh ids
///
/// Returns the ids of the newly created nodes, in fragment order.
pub fn paste(scene: &mut Scene, doc: &SceneDoc) -> Result<Vec<NodeId>, SerializeError> {
    let merged = scene.merge(doc, DeserializeOpts { restore_ids: false })?;
    tracing::debug!(nodes = merged.nodes.len(), "pasted fragment");
    Ok(merged.nodes)
}
