//! Data-event logging.
//!
//! When `debug_logging` is enabled in the preferences, data-layer
//! operations append a JSONL line to `data-events.jsonl` next to the
//! preferences file. Every failure is silently ignored; logging must
//! never break a data operation.

use crate::prefs::Preferences;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Log file name within the data directory.
pub const EVENT_LOG_FILE: &str = "data-events.jsonl";

/// Append a data event if debug logging is enabled.
pub fn log_data_event(prefs: &Preferences, event: &str, details: &serde_json::Value) {
    if !prefs.get().debug_logging {
        return;
    }
    let Some(dir) = prefs.path().parent() else {
        return;
    };
    write_event(dir, event, details);
}

/// Write the event line without consulting the preferences gate.
fn write_event(dir: &Path, event: &str, details: &serde_json::Value) {
    if std::fs::create_dir_all(dir).is_err() {
        return;
    }

    let log_path = dir.join(EVENT_LOG_FILE);
    let entry = serde_json::json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "event": event,
        "details": details,
    });

    let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&log_path) else {
        return;
    };
    let _ = writeln!(file, "{entry}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_prefs(debug_logging: bool) -> (TempDir, Preferences) {
        let dir = TempDir::new().unwrap();
        let prefs = Preferences::new(dir.path().join("preferences.yaml"));
        prefs.update(|data| data.debug_logging = debug_logging).unwrap();
        (dir, prefs)
    }

    #[test]
    fn test_disabled_logging_writes_nothing() {
        let (dir, prefs) = create_test_prefs(false);
        log_data_event(&prefs, "task_added", &serde_json::json!({ "id": 1 }));
        assert!(!dir.path().join(EVENT_LOG_FILE).exists());
    }

    #[test]
    fn test_enabled_logging_appends_lines() {
        let (dir, prefs) = create_test_prefs(true);
        log_data_event(&prefs, "task_added", &serde_json::json!({ "id": 1 }));
        log_data_event(&prefs, "task_deleted", &serde_json::json!({ "id": 1 }));

        let content = std::fs::read_to_string(dir.path().join(EVENT_LOG_FILE)).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event"], "task_added");
        assert_eq!(first["details"]["id"], 1);
        assert!(first["timestamp"].is_string());
    }

    #[test]
    fn test_unwritable_directory_is_silently_ignored() {
        let dir = TempDir::new().unwrap();
        // The prefs "parent" is a file, so the log directory cannot be
        // created; the call must still return quietly.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let prefs = Preferences::new(blocker.join("preferences.yaml"));

        write_event(&blocker.join("nested"), "event", &serde_json::json!({}));
        log_data_event(&prefs, "event", &serde_json::json!({}));
    }
}
