// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor-state services for NodeForge.
//!
//! Everything a node-editor shell needs between the graph engine and its
//! widgets, with no UI dependency of its own:
//! - Undo/redo history over scene snapshots
//! - Clipboard copy/cut/paste of scene fragments
//! - Editor settings persistence

pub mod clipboard;
pub mod history;
pub mod settings;

pub use history::{HistoryError, SceneHistory};
pub use settings::{EditorSettings, SettingsError};
