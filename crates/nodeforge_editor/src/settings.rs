// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor settings and their persistence.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE_NAME: &str = "editor.nodeforge";

/// How many recent files are remembered
const MAX_RECENT_FILES: usize = 10;

/// Editor-wide settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorSettings {
    /// Settings format version
    pub version: u32,
    /// Number of undo steps kept per scene
    pub history_limit: usize,
    /// Seconds between autosaves, 0 to disable
    pub autosave_interval_secs: u32,
    /// Recently opened scene files, most recent first
    #[serde(default)]
    pub recent_files: Vec<PathBuf>,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            history_limit: 32,
            autosave_interval_secs: 300,
            recent_files: Vec::new(),
        }
    }
}

impl EditorSettings {
    /// Load settings from a RON file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        let settings: EditorSettings = ron::from_str(&content)?;

        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(SettingsError::UnsupportedVersion {
                found: settings.version,
                supported: SETTINGS_FORMAT_VERSION,
            });
        }

        Ok(settings)
    }

    /// Save settings to a RON file
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let config = ron::ser::PrettyConfig::default().struct_names(true);
        let content = ron::ser::to_string_pretty(self, config)?;
        std::fs::write(path, content)?;
        tracing::info!(path = %path.display(), "editor settings saved");
        Ok(())
    }

    /// Get the settings file path for a config directory
    pub fn settings_file_path(config_dir: &Path) -> PathBuf {
        config_dir.join(SETTINGS_FILE_NAME)
    }

    /// Record a file at the front of the recent list, deduplicated and capped
    pub fn add_recent_file(&mut self, path: PathBuf) {
        self.recent_files.retain(|p| p != &path);
        self.recent_files.insert(0, path);
        self.recent_files.truncate(MAX_RECENT_FILES);
    }
}

/// Error from settings persistence
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// File I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file does not parse
    #[error("Malformed settings file: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Settings could not be encoded
    #[error("Settings serialization failed: {0}")]
    Encode(#[from] ron::Error),

    /// Settings file comes from a newer build
    #[error("Settings version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version found in the file
        found: u32,
        /// Newest version this build understands
        supported: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("nodeforge-settings-{}.ron", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_ron_round_trip() {
        let mut settings = EditorSettings::default();
        settings.history_limit = 64;
        settings.add_recent_file(PathBuf::from("/tmp/a.json"));

        let path = temp_path();
        settings.save(&path).unwrap();
        let loaded = EditorSettings::load(&path).unwrap();
        assert_eq!(loaded.history_limit, 64);
        assert_eq!(loaded.recent_files, vec![PathBuf::from("/tmp/a.json")]);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let mut settings = EditorSettings::default();
        settings.version = SETTINGS_FORMAT_VERSION + 1;
        let path = temp_path();
        settings.save(&path).unwrap();

        assert!(matches!(
            EditorSettings::load(&path),
            Err(SettingsError::UnsupportedVersion { .. })
        ));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_recent_files_dedup_and_cap() {
        let mut settings = EditorSettings::default();
        for i in 0..12 {
            settings.add_recent_file(PathBuf::from(format!("/tmp/{i}.json")));
        }
        settings.add_recent_file(PathBuf::from("/tmp/5.json"));

        assert_eq!(settings.recent_files.len(), 10);
        assert_eq!(settings.recent_files[0], PathBuf::from("/tmp/5.json"));
        assert_eq!(
            settings
                .recent_files
                .iter()
                .filter(|p| **p == PathBuf::from("/tmp/5.json"))
                .count(),
            1
        );
    }
}
