//! Task store trait and `SQLite` implementation.

use crate::error::{Error, Result};
use crate::storage::{decode_day, decode_instant, encode_day, encode_instant, Database};
use crate::tasks::models::{Priority, Task, DEFAULT_CATEGORY};
use chrono::Utc;
use rusqlite::{params, Connection};

/// Columns selected for every task query, in `parse_task` order.
const TASK_COLUMNS: &str = "Id, UserId, OrderIndex, Title, IsDone, Category, Priority, DueDate, \
                            TagsRaw, SubtasksJson, CreatedAt, UpdatedAt";

/// Owner-scoped task persistence.
///
/// All methods return a `Result` and may fail with database errors.
#[allow(clippy::missing_errors_doc)]
pub trait TaskStore {
    /// All tasks for `owner_id`, manual order first, newest creation as
    /// the tie-break.
    fn list_tasks(&self, owner_id: i64) -> Result<Vec<Task>>;

    /// Persist a new task: assigns the next manual-order slot, stamps
    /// both timestamps, and backfills the generated id.
    fn add_task(&self, task: &mut Task) -> Result<()>;

    /// Persist every field of `task`, refreshing its update timestamp.
    fn update_task(&self, task: &mut Task) -> Result<()>;

    /// Delete a task.
    fn delete_task(&self, task: &Task) -> Result<()>;

    /// Delete every finished task for `owner_id`, one row at a time.
    ///
    /// A failure partway leaves the earlier deletions in place; the
    /// batch is not transactional.
    fn clear_completed(&self, owner_id: i64) -> Result<()>;

    /// The next free manual-order slot: the owner's maximum plus one,
    /// or 1 when the owner has no tasks.
    fn next_order_index(&self, owner_id: i64) -> Result<i64>;

    /// Write each task's in-memory order index back to storage, in the
    /// given sequence. Callers assign contiguous 1..=N values first.
    fn persist_order(&self, ordered: &[Task]) -> Result<()>;
}

/// SQLite-backed task store.
#[derive(Debug, Clone)]
pub struct SqliteTaskStore {
    db: Database,
}

impl SqliteTaskStore {
    /// Create a store over an opened database.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Parse a task from a row (column order fixed by `TASK_COLUMNS`).
    ///
    /// Columns added by migration read as NULL on legacy rows and fall
    /// back to the field defaults.
    fn parse_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
        let priority: Option<i64> = row.get(6)?;
        let due_date: Option<String> = row.get(7)?;
        let created_at: Option<String> = row.get(10)?;
        let updated_at: Option<String> = row.get(11)?;

        Ok(Task {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            order_index: row.get::<_, Option<i64>>(2)?.unwrap_or(0),
            title: row.get(3)?,
            is_done: row.get(4)?,
            category: row
                .get::<_, Option<String>>(5)?
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            priority: priority
                .map_or(Ok(Priority::Normal), Priority::from_i64)
                .unwrap_or_default(),
            due_date: decode_day(due_date.as_deref()),
            tags_raw: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
            subtasks_json: row.get::<_, Option<String>>(9)?.unwrap_or_else(|| "[]".to_string()),
            created_at: decode_instant(created_at.as_deref()),
            updated_at: decode_instant(updated_at.as_deref()),
        })
    }
}

impl TaskStore for SqliteTaskStore {
    fn list_tasks(&self, owner_id: i64) -> Result<Vec<Task>> {
        let conn = self.db.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM Task WHERE UserId = ?1
             ORDER BY COALESCE(OrderIndex, 0) ASC, CreatedAt DESC"
        ))?;
        let tasks = stmt.query_map(params![owner_id], Self::parse_task)?.flatten().collect();
        Ok(tasks)
    }

    fn add_task(&self, task: &mut Task) -> Result<()> {
        let conn = self.db.connect()?;
        task.order_index = next_order_index_in(&conn, task.owner_id)?;
        task.created_at = Utc::now();
        task.updated_at = task.created_at;

        conn.execute(
            "INSERT INTO Task (UserId, OrderIndex, Title, IsDone, Category, Priority, DueDate,
                               TagsRaw, SubtasksJson, CreatedAt, UpdatedAt)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                task.owner_id,
                task.order_index,
                task.title,
                task.is_done,
                task.category,
                task.priority.as_i64(),
                task.due_date.map(encode_day),
                task.tags_raw,
                task.subtasks_json,
                encode_instant(task.created_at),
                encode_instant(task.updated_at),
            ],
        )
        .map_err(Error::StorageWriteFailed)?;

        task.id = conn.last_insert_rowid();
        Ok(())
    }

    fn update_task(&self, task: &mut Task) -> Result<()> {
        task.updated_at = Utc::now();

        let conn = self.db.connect()?;
        conn.execute(
            "UPDATE Task SET UserId = ?1, OrderIndex = ?2, Title = ?3, IsDone = ?4,
                             Category = ?5, Priority = ?6, DueDate = ?7, TagsRaw = ?8,
                             SubtasksJson = ?9, CreatedAt = ?10, UpdatedAt = ?11
             WHERE Id = ?12",
            params![
                task.owner_id,
                task.order_index,
                task.title,
                task.is_done,
                task.category,
                task.priority.as_i64(),
                task.due_date.map(encode_day),
                task.tags_raw,
                task.subtasks_json,
                encode_instant(task.created_at),
                encode_instant(task.updated_at),
                task.id,
            ],
        )
        .map_err(Error::StorageWriteFailed)?;
        Ok(())
    }

    fn delete_task(&self, task: &Task) -> Result<()> {
        let conn = self.db.connect()?;
        conn.execute("DELETE FROM Task WHERE Id = ?1", params![task.id])
            .map_err(Error::StorageWriteFailed)?;
        Ok(())
    }

    fn clear_completed(&self, owner_id: i64) -> Result<()> {
        let conn = self.db.connect()?;
        let mut stmt = conn.prepare("SELECT Id FROM Task WHERE UserId = ?1 AND IsDone = 1")?;
        let ids: Vec<i64> = stmt.query_map(params![owner_id], |row| row.get(0))?.flatten().collect();
        drop(stmt);

        for id in ids {
            conn.execute("DELETE FROM Task WHERE Id = ?1", params![id])
                .map_err(Error::StorageWriteFailed)?;
        }
        Ok(())
    }

    fn next_order_index(&self, owner_id: i64) -> Result<i64> {
        let conn = self.db.connect()?;
        next_order_index_in(&conn, owner_id)
    }

    fn persist_order(&self, ordered: &[Task]) -> Result<()> {
        let conn = self.db.connect()?;
        for task in ordered {
            conn.execute(
                "UPDATE Task SET OrderIndex = ?1 WHERE Id = ?2",
                params![task.order_index, task.id],
            )
            .map_err(Error::StorageWriteFailed)?;
        }
        Ok(())
    }
}

/// Maximum manual-order slot for the owner, plus one.
fn next_order_index_in(conn: &Connection, owner_id: i64) -> Result<i64> {
    let max: Option<i64> = conn.query_row(
        "SELECT MAX(COALESCE(OrderIndex, 0)) FROM Task WHERE UserId = ?1",
        params![owner_id],
        |row| row.get(0),
    )?;
    Ok(max.unwrap_or(0) + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (TempDir, SqliteTaskStore) {
        let dir = TempDir::new().unwrap();
        let db = Database::open(dir.path().join("test.sqlite3")).unwrap();
        (dir, SqliteTaskStore::new(db))
    }

    fn add_titled(store: &SqliteTaskStore, owner_id: i64, title: &str) -> Task {
        let mut task = Task::new(owner_id, title);
        store.add_task(&mut task).unwrap();
        // Creation instants must differ for recency ordering.
        std::thread::sleep(std::time::Duration::from_millis(2));
        task
    }

    #[test]
    fn test_add_assigns_id_order_and_timestamps() {
        let (_dir, store) = create_test_store();

        let task = add_titled(&store, 1, "First");
        assert!(task.id > 0);
        assert_eq!(task.order_index, 1);
        assert_eq!(task.created_at, task.updated_at);
        assert!(task.created_at > chrono::DateTime::UNIX_EPOCH);
    }

    #[test]
    fn test_add_then_list_contains_task_exactly_once() {
        let (_dir, store) = create_test_store();
        add_titled(&store, 1, "Only");

        let task = add_titled(&store, 1, "New");
        let listed = store.list_tasks(1).unwrap();
        let matches: Vec<_> = listed.iter().filter(|t| t.id == task.id).collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].order_index, 2);
    }

    #[test]
    fn test_next_order_index() {
        let (_dir, store) = create_test_store();
        assert_eq!(store.next_order_index(1).unwrap(), 1);

        add_titled(&store, 1, "a");
        add_titled(&store, 1, "b");
        assert_eq!(store.next_order_index(1).unwrap(), 3);

        // Other owners do not share the sequence.
        assert_eq!(store.next_order_index(2).unwrap(), 1);
    }

    #[test]
    fn test_list_is_scoped_by_owner() {
        let (_dir, store) = create_test_store();
        add_titled(&store, 1, "mine");
        add_titled(&store, 2, "theirs");

        let mine = store.list_tasks(1).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].title, "mine");
    }

    #[test]
    fn test_list_orders_by_order_index_then_newest() {
        let (_dir, store) = create_test_store();
        let mut a = add_titled(&store, 1, "a");
        let mut b = add_titled(&store, 1, "b");
        let mut c = add_titled(&store, 1, "c");

        // Give b the first slot and tie a and c on the second.
        b.order_index = 1;
        a.order_index = 2;
        c.order_index = 2;
        store.persist_order(&[b.clone(), a.clone(), c.clone()]).unwrap();

        let listed = store.list_tasks(1).unwrap();
        let titles: Vec<_> = listed.iter().map(|t| t.title.as_str()).collect();
        // c was created after a, so it wins the tie.
        assert_eq!(titles, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_update_refreshes_updated_at_and_fields() {
        let (_dir, store) = create_test_store();
        let mut task = add_titled(&store, 1, "before");
        let created_at = task.created_at;

        task.title = "after".to_string();
        task.priority = Priority::High;
        task.is_done = true;
        store.update_task(&mut task).unwrap();

        assert!(task.updated_at > created_at);

        let listed = store.list_tasks(1).unwrap();
        assert_eq!(listed[0].title, "after");
        assert_eq!(listed[0].priority, Priority::High);
        assert!(listed[0].is_done);
        assert_eq!(listed[0].created_at, created_at);
    }

    #[test]
    fn test_delete_task() {
        let (_dir, store) = create_test_store();
        let task = add_titled(&store, 1, "doomed");
        store.delete_task(&task).unwrap();
        assert!(store.list_tasks(1).unwrap().is_empty());
    }

    #[test]
    fn test_clear_completed_only_removes_done_rows_for_owner() {
        let (_dir, store) = create_test_store();
        let mut done = add_titled(&store, 1, "done");
        add_titled(&store, 1, "open");
        let mut other_done = add_titled(&store, 2, "other owner done");

        done.is_done = true;
        store.update_task(&mut done).unwrap();
        other_done.is_done = true;
        store.update_task(&mut other_done).unwrap();

        store.clear_completed(1).unwrap();

        let mine = store.list_tasks(1).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].title, "open");
        assert_eq!(store.list_tasks(2).unwrap().len(), 1);
    }

    #[test]
    fn test_persist_order_writes_indices() {
        let (_dir, store) = create_test_store();
        let mut a = add_titled(&store, 1, "a");
        let mut b = add_titled(&store, 1, "b");

        a.order_index = 2;
        b.order_index = 1;
        store.persist_order(&[b.clone(), a.clone()]).unwrap();

        let listed = store.list_tasks(1).unwrap();
        let titles: Vec<_> = listed.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "a"]);
    }

    #[test]
    fn test_round_trips_due_date_tags_and_subtasks() {
        let (_dir, store) = create_test_store();

        let mut task = Task::new(1, "full house");
        task.due_date = chrono::NaiveDate::from_ymd_opt(2025, 12, 24);
        task.tags_raw = "home, #festive".to_string();
        task.subtasks_json = r#"[{"title":"wrap gifts","isDone":false}]"#.to_string();
        store.add_task(&mut task).unwrap();

        let listed = store.list_tasks(1).unwrap();
        assert_eq!(listed[0].due_date, task.due_date);
        assert_eq!(listed[0].tags(), vec!["#home", "#festive"]);
        assert_eq!(listed[0].subtasks().len(), 1);
    }

    #[test]
    fn test_legacy_rows_read_with_defaults() {
        let dir = TempDir::new().unwrap();
        let db = Database::open(dir.path().join("test.sqlite3")).unwrap();

        // A row written before the migrated columns existed.
        let conn = db.connect().unwrap();
        conn.execute(
            "INSERT INTO Task (UserId, Title, IsDone) VALUES (?1, ?2, ?3)",
            params![1, "legacy", false],
        )
        .unwrap();
        drop(conn);

        let store = SqliteTaskStore::new(db);
        let listed = store.list_tasks(1).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].order_index, 0);
        assert_eq!(listed[0].category, DEFAULT_CATEGORY);
        assert_eq!(listed[0].priority, Priority::Normal);
        assert_eq!(listed[0].due_date, None);
        assert!(listed[0].tags().is_empty());
        assert!(listed[0].subtasks().is_empty());
    }

    #[test]
    fn test_unknown_priority_value_reads_as_normal() {
        let (_dir, store) = create_test_store();
        let task = add_titled(&store, 1, "odd");

        let conn = store.db.connect().unwrap();
        conn.execute("UPDATE Task SET Priority = 9 WHERE Id = ?1", params![task.id]).unwrap();
        drop(conn);

        let listed = store.list_tasks(1).unwrap();
        assert_eq!(listed[0].priority, Priority::Normal);
    }
}
