//! `SQLite` database handle and schema management.
//!
//! All account and task rows live in a single `SQLite` database file.
//! [`Database`] opens a new connection per operation and guarantees the
//! schema when it is created: the base tables are created if missing,
//! then every column added after the first release is applied
//! additively. The migration is idempotent and order-independent, so it
//! is safe against a file written by any earlier version and safe to
//! run on every start.

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Columns added after the first released schema, as (table, column, type).
///
/// Only ever appended to. Columns are never dropped or renamed.
const MIGRATED_COLUMNS: &[(&str, &str, &str)] = &[
    ("Account", "Name", "TEXT"),
    ("Task", "Category", "TEXT"),
    ("Task", "Priority", "INTEGER"),
    ("Task", "OrderIndex", "INTEGER"),
    ("Task", "DueDate", "TEXT"),
    ("Task", "CreatedAt", "TEXT"),
    ("Task", "UpdatedAt", "TEXT"),
    ("Task", "TagsRaw", "TEXT"),
    ("Task", "SubtasksJson", "TEXT"),
];

/// Handle to the embedded database file.
///
/// Each operation opens a new connection. This avoids sharing a
/// connection across the data layer and is acceptable for a single
/// interactive session.
#[derive(Debug, Clone)]
pub struct Database {
    /// Path to the database file.
    db_path: PathBuf,
}

impl Database {
    /// Open (or create) the database at the given path and ensure the
    /// schema.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageUnavailable`] if the file cannot be
    /// opened or the migration fails.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db = Self { db_path: db_path.as_ref().to_path_buf() };
        db.ensure_schema()?;
        Ok(db)
    }

    /// Get the database path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Open a connection to the database.
    pub(crate) fn connect(&self) -> Result<Connection> {
        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&self.db_path).map_err(Error::StorageUnavailable)?;
        conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA journal_mode = WAL;")
            .map_err(Error::StorageUnavailable)?;
        Ok(conn)
    }

    /// Create the base tables if missing, then apply the additive
    /// column list.
    ///
    /// Calling this twice produces no error and no duplicate column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageUnavailable`] on any failure; nothing is
    /// cached, so a retry after the environment is repaired starts
    /// clean.
    pub fn ensure_schema(&self) -> Result<()> {
        let conn = self.connect()?;

        conn.execute_batch(
            r"
            -- First-release column set; everything later arrives via
            -- MIGRATED_COLUMNS.
            CREATE TABLE IF NOT EXISTS Account (
                Id INTEGER PRIMARY KEY AUTOINCREMENT,
                Email TEXT NOT NULL UNIQUE,
                PasswordHash TEXT NOT NULL,
                PasswordSalt TEXT NOT NULL,
                CreatedAt TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS Task (
                Id INTEGER PRIMARY KEY AUTOINCREMENT,
                UserId INTEGER NOT NULL,
                Title TEXT NOT NULL,
                IsDone INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_task_user ON Task(UserId);
            ",
        )
        .map_err(Error::StorageUnavailable)?;

        for (table, column, column_type) in MIGRATED_COLUMNS {
            Self::ensure_column(&conn, table, column, column_type)?;
        }

        Ok(())
    }

    /// Add a column if the table does not already have it.
    fn ensure_column(conn: &Connection, table: &str, column: &str, column_type: &str) -> Result<()> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .map_err(Error::StorageUnavailable)?;
        let existing: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .map_err(Error::StorageUnavailable)?
            .flatten()
            .collect();

        if existing.iter().any(|name| name.eq_ignore_ascii_case(column)) {
            return Ok(());
        }

        conn.execute_batch(&format!("ALTER TABLE {table} ADD COLUMN {column} {column_type}"))
            .map_err(Error::StorageUnavailable)?;
        Ok(())
    }
}

/// Encode an instant as RFC 3339 text with microsecond precision.
pub(crate) fn encode_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Decode a stored instant, tolerating missing or malformed text.
///
/// Rows written before the timestamp columns existed read as the Unix
/// epoch, which keeps them at the old end of every recency sort.
pub(crate) fn decode_instant(text: Option<&str>) -> DateTime<Utc> {
    text.and_then(|value| DateTime::parse_from_rfc3339(value).ok())
        .map_or(DateTime::UNIX_EPOCH, |parsed| parsed.with_timezone(&Utc))
}

/// Encode a calendar date as `YYYY-MM-DD`.
pub(crate) fn encode_day(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Decode a stored calendar date; missing or malformed text reads as
/// no due date.
pub(crate) fn decode_day(text: Option<&str>) -> Option<NaiveDate> {
    text.and_then(|value| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok())
}
