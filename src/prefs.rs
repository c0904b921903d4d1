//! The preferences document for process-wide state.
//!
//! Everything persisted outside the relational store lives here: the
//! active session's owner id, the theme choice, the category list, and
//! the per-category icon/color documents. The file is YAML; the
//! category entries are JSON strings nested inside it, matching the
//! layout the app has always written, and are parsed leniently on read.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Contents of the preferences file.
///
/// Missing fields take defaults, so the document can grow without
/// invalidating files written by older versions.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct PrefsData {
    /// Id of the signed-in account, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_user_id: Option<i64>,

    /// Theme choice: `"system"`, `"light"`, or `"dark"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,

    /// JSON-encoded list of category names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_categories: Option<String>,

    /// JSON-encoded map of category name to icon key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_icons: Option<String>,

    /// JSON-encoded map of category name to color value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_colors: Option<String>,

    /// Whether data-layer events are appended to the JSONL event log.
    #[serde(default)]
    pub debug_logging: bool,
}

/// Handle to the preferences file.
///
/// Every read loads the file fresh and every write persists the whole
/// document; the handle itself is just a path.
#[derive(Debug, Clone)]
pub struct Preferences {
    path: PathBuf,
}

impl Preferences {
    /// Create a handle for the preferences file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current document.
    ///
    /// A missing or unparseable file reads as the default document;
    /// preferences are recoverable state, never a hard failure.
    #[must_use]
    pub fn get(&self) -> PrefsData {
        let Ok(content) = std::fs::read_to_string(&self.path) else {
            return PrefsData::default();
        };
        serde_yaml::from_str(&content).unwrap_or_default()
    }

    /// Read, modify, and persist the document.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn update(&self, mutate: impl FnOnce(&mut PrefsData)) -> Result<()> {
        let mut data = self.get();
        mutate(&mut data);
        self.save(&data)
    }

    /// Persist the given document.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, data: &PrefsData) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(data)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}
