//! Path utilities for determining data storage locations.
//!
//! All persistent state lives in one per-user data directory: the
//! SQLite database, the preferences document, and (when enabled) the
//! data-event log.

use std::path::{Path, PathBuf};

/// The application directory name inside the platform data directory.
const APP_DIR_NAME: &str = "taskdeck";

/// The database filename.
pub const DATABASE_FILENAME: &str = "taskdeck.sqlite3";

/// The preferences filename.
pub const PREFERENCES_FILENAME: &str = "preferences.yaml";

/// Get the default data directory.
///
/// Returns `<platform data dir>/taskdeck/`, or `None` if the platform
/// data directory cannot be determined.
#[must_use]
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(APP_DIR_NAME))
}

/// Get the database path within a data directory.
#[must_use]
pub fn db_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DATABASE_FILENAME)
}

/// Get the preferences path within a data directory.
#[must_use]
pub fn prefs_path(data_dir: &Path) -> PathBuf {
    data_dir.join(PREFERENCES_FILENAME)
}
