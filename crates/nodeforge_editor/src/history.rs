// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undo/redo history over scene snapshots.
//!
//! Each history step stores a full serialized scene as an encoded
//! snapshot. Restoring a step deserializes the snapshot back into the
//! scene with ids preserved, so listeners attached to the scene keep
//! working across undo/redo. Snapshots are JSON: node content is an
//! opaque JSON payload, which rules out non-self-describing codecs.

use nodeforge_graph::{DeserializeOpts, Scene, SceneDoc, SerializeError};
use std::fmt;

/// Default number of history steps kept
pub const DEFAULT_HISTORY_LIMIT: usize = 32;

/// Callback fired on history traffic
pub type HistoryListener = Box<dyn FnMut()>;

/// One entry in the history stack
struct HistoryStamp {
    /// Step description, surfaced for undo/redo menus
    description: String,
    /// Serialized scene at the time of the stamp
    snapshot: Vec<u8>,
}

/// Undo/redo support for a scene
///
/// Events: "history modified" fires whenever a stamp is stored or
/// restored, "history stored" and "history restored" fire for the
/// specific operation.
pub struct SceneHistory {
    stack: Vec<HistoryStamp>,
    /// Index of the step the scene currently reflects
    current: Option<usize>,
    limit: usize,
    /// First step that modified the document, for modified-flag restore
    modified_step: Option<usize>,
    modified_listeners: Vec<HistoryListener>,
    stored_listeners: Vec<HistoryListener>,
    restored_listeners: Vec<HistoryListener>,
}

impl SceneHistory {
    /// Create a history with the default step limit
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }

    /// Create a history with a custom step limit
    pub fn with_limit(limit: usize) -> Self {
        Self {
            stack: Vec::new(),
            current: None,
            limit: limit.max(1),
            modified_step: None,
            modified_listeners: Vec::new(),
            stored_listeners: Vec::new(),
            restored_listeners: Vec::new(),
        }
    }

    /// Drop every stamp and reset the cursor
    pub fn clear(&mut self) {
        self.stack.clear();
        self.current = None;
        self.modified_step = None;
    }

    /// Store the first stamp after a new or freshly loaded scene
    pub fn store_initial(&mut self, scene: &mut Scene) -> Result<(), HistoryError> {
        self.store(scene, "Initial history stamp", false)
    }

    /// Register a callback fired when the history changes in any way
    pub fn add_history_modified_listener(&mut self, callback: impl FnMut() + 'static) {
        self.modified_listeners.push(Box::new(callback));
    }

    /// Register a callback fired after a stamp is stored
    pub fn add_history_stored_listener(&mut self, callback: impl FnMut() + 'static) {
        self.stored_listeners.push(Box::new(callback));
    }

    /// Register a callback fired after a stamp is restored
    pub fn add_history_restored_listener(&mut self, callback: impl FnMut() + 'static) {
        self.restored_listeners.push(Box::new(callback));
    }

    /// Whether an undo step is available
    pub fn can_undo(&self) -> bool {
        self.current.is_some_and(|c| c > 0)
    }

    /// Whether a redo step is available
    pub fn can_redo(&self) -> bool {
        match self.current {
            Some(current) => current + 1 < self.stack.len(),
            None => !self.stack.is_empty(),
        }
    }

    /// Number of stamps currently stored
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Whether the history holds no stamps
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Description of the step undo would return to
    pub fn undo_description(&self) -> Option<&str> {
        let current = self.current.filter(|c| *c > 0)?;
        Some(&self.stack[current - 1].description)
    }

    /// Description of the step redo would advance to
    pub fn redo_description(&self) -> Option<&str> {
        let next = self.current.map_or(0, |c| c + 1);
        self.stack.get(next).map(|s| s.description.as_str())
    }

    /// Step back to the previous stamp
    pub fn undo(&mut self, scene: &mut Scene) -> Result<(), HistoryError> {
        let Some(current) = self.current.filter(|c| *c > 0) else {
            return Err(HistoryError::NothingToUndo);
        };
        tracing::debug!("undo");
        self.current = Some(current - 1);
        self.restore_current(scene)
    }

    /// Step forward to the next stamp
    pub fn redo(&mut self, scene: &mut Scene) -> Result<(), HistoryError> {
        let next = self.current.map_or(0, |c| c + 1);
        if next >= self.stack.len() {
            return Err(HistoryError::NothingToRedo);
        }
        tracing::debug!("redo");
        self.current = Some(next);
        self.restore_current(scene)
    }

    /// Store a new stamp at the cursor
    ///
    /// Storing while the cursor is mid-stack drops the redo tail. A
    /// stamp identical to the current one is skipped. When the stack is
    /// full the oldest stamp is evicted.
    pub fn store(
        &mut self,
        scene: &mut Scene,
        description: &str,
        modifies: bool,
    ) -> Result<(), HistoryError> {
        if modifies {
            scene.set_modified(true);
        }
        let snapshot = serde_json::to_vec(&scene.serialize())?;

        if let Some(current) = self.current {
            if self.stack[current].snapshot == snapshot {
                tracing::debug!(description, "scene unchanged, skipping stamp");
                return Ok(());
            }
            // drop the redo tail
            self.stack.truncate(current + 1);
            if self.modified_step.is_some_and(|s| s > current) {
                self.modified_step = None;
            }
        }

        if self.stack.len() >= self.limit {
            self.stack.remove(0);
            self.modified_step = self.modified_step.map(|s| s.saturating_sub(1));
        }

        self.stack.push(HistoryStamp {
            description: description.to_owned(),
            snapshot,
        });
        let current = self.stack.len() - 1;
        self.current = Some(current);
        if modifies && self.modified_step.is_none() {
            self.modified_step = Some(current);
        }
        tracing::debug!(description, step = current, "stored history stamp");

        self.emit(Kind::Modified);
        self.emit(Kind::Stored);
        Ok(())
    }

    fn restore_current(&mut self, scene: &mut Scene) -> Result<(), HistoryError> {
        let Some(current) = self.current else {
            return Ok(());
        };
        let stamp = &self.stack[current];
        tracing::debug!(
            step = current,
            total = self.stack.len(),
            description = %stamp.description,
            "restoring history stamp"
        );
        let doc: SceneDoc = serde_json::from_slice(&stamp.snapshot)?;
        scene.deserialize(&doc, DeserializeOpts::default())?;
        // the document counts as modified iff the cursor sits at or past
        // the first modifying step
        let modified = self.modified_step.is_some_and(|s| current >= s);
        scene.set_modified(modified);

        self.emit(Kind::Modified);
        self.emit(Kind::Restored);
        Ok(())
    }

    fn emit(&mut self, kind: Kind) {
        let listeners = match kind {
            Kind::Modified => &mut self.modified_listeners,
            Kind::Stored => &mut self.stored_listeners,
            Kind::Restored => &mut self.restored_listeners,
        };
        for listener in listeners {
            listener();
        }
    }
}

enum Kind {
    Modified,
    Stored,
    Restored,
}

impl Default for SceneHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SceneHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneHistory")
            .field("steps", &self.stack.len())
            .field("current", &self.current)
            .field("limit", &self.limit)
            .finish()
    }
}

/// Error from history operations
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// Nothing to undo
    #[error("Nothing to undo")]
    NothingToUndo,

    /// Nothing to redo
    #[error("Nothing to redo")]
    NothingToRedo,

    /// Snapshot encoding or decoding failed
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// Restoring a snapshot into the scene failed
    #[error(transparent)]
    Restore(#[from] SerializeError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodeforge_graph::{NodeSpec, SocketType};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn add_node(scene: &mut Scene, title: &str) {
        scene.add_node(
            NodeSpec::new(title, "test")
                .with_inputs(&[SocketType::Number])
                .with_outputs(&[SocketType::Number]),
        );
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut scene = Scene::new();
        let mut history = SceneHistory::new();
        history.store_initial(&mut scene).unwrap();

        add_node(&mut scene, "A");
        history.store(&mut scene, "Added node A", true).unwrap();
        add_node(&mut scene, "B");
        history.store(&mut scene, "Added node B", true).unwrap();
        assert_eq!(scene.node_count(), 2);

        history.undo(&mut scene).unwrap();
        assert_eq!(scene.node_count(), 1);
        history.undo(&mut scene).unwrap();
        assert_eq!(scene.node_count(), 0);
        assert!(!history.can_undo());
        assert!(matches!(
            history.undo(&mut scene),
            Err(HistoryError::NothingToUndo)
        ));

        history.redo(&mut scene).unwrap();
        history.redo(&mut scene).unwrap();
        assert_eq!(scene.node_count(), 2);
        assert!(matches!(
            history.redo(&mut scene),
            Err(HistoryError::NothingToRedo)
        ));
    }

    #[test]
    fn test_restore_preserves_ids() {
        let mut scene = Scene::new();
        let mut history = SceneHistory::new();
        history.store_initial(&mut scene).unwrap();

        let id = scene.add_node(NodeSpec::new("A", "test"));
        history.store(&mut scene, "Added node", true).unwrap();
        history.undo(&mut scene).unwrap();
        assert!(scene.node(id).is_none());
        history.redo(&mut scene).unwrap();
        assert!(scene.node(id).is_some());
    }

    #[test]
    fn test_store_after_undo_drops_redo_tail() {
        let mut scene = Scene::new();
        let mut history = SceneHistory::new();
        history.store_initial(&mut scene).unwrap();

        add_node(&mut scene, "A");
        history.store(&mut scene, "Added node A", true).unwrap();
        add_node(&mut scene, "B");
        history.store(&mut scene, "Added node B", true).unwrap();

        history.undo(&mut scene).unwrap();
        add_node(&mut scene, "C");
        history.store(&mut scene, "Added node C", true).unwrap();

        assert!(!history.can_redo());
        assert_eq!(history.len(), 3);
        assert_eq!(history.undo_description(), Some("Added node A"));
    }

    #[test]
    fn test_identical_stamp_is_skipped() {
        let mut scene = Scene::new();
        let mut history = SceneHistory::new();
        add_node(&mut scene, "A");
        history.store(&mut scene, "First", true).unwrap();
        history.store(&mut scene, "No change", true).unwrap();
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_limit_evicts_oldest() {
        let mut scene = Scene::new();
        let mut history = SceneHistory::with_limit(2);
        history.store_initial(&mut scene).unwrap();
        add_node(&mut scene, "A");
        history.store(&mut scene, "Added node A", true).unwrap();
        add_node(&mut scene, "B");
        history.store(&mut scene, "Added node B", true).unwrap();

        assert_eq!(history.len(), 2);
        // the initial stamp was evicted, one undo step remains
        history.undo(&mut scene).unwrap();
        assert_eq!(scene.node_count(), 1);
        assert!(!history.can_undo());
    }

    #[test]
    fn test_modified_flag_follows_cursor() {
        let mut scene = Scene::new();
        let mut history = SceneHistory::new();
        scene.set_modified(false);
        history.store_initial(&mut scene).unwrap();

        add_node(&mut scene, "A");
        history.store(&mut scene, "Added node A", true).unwrap();
        assert!(scene.has_been_modified());

        history.undo(&mut scene).unwrap();
        assert!(!scene.has_been_modified());
        history.redo(&mut scene).unwrap();
        assert!(scene.has_been_modified());
    }

    #[test]
    fn test_listeners_fire_in_order() {
        let mut scene = Scene::new();
        let mut history = SceneHistory::new();
        let log: Rc<RefCell<Vec<&'static str>>> = Rc::default();

        let l = Rc::clone(&log);
        history.add_history_modified_listener(move || l.borrow_mut().push("modified"));
        let l = Rc::clone(&log);
        history.add_history_stored_listener(move || l.borrow_mut().push("stored"));
        let l = Rc::clone(&log);
        history.add_history_restored_listener(move || l.borrow_mut().push("restored"));

        history.store_initial(&mut scene).unwrap();
        add_node(&mut scene, "A");
        history.store(&mut scene, "Added node A", true).unwrap();
        history.undo(&mut scene).unwrap();

        assert_eq!(
            *log.borrow(),
            vec!["modified", "stored", "modified", "stored", "modified", "restored"]
        );
    }
}
