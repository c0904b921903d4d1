//! Task domain: models and persistence.
//!
//! Tasks belong to exactly one account and carry a category, a
//! priority, an optional due date, free-typed tags, and a checklist.
//! Tags and the checklist live inside the row as text documents and are
//! re-derived on read. A per-owner order index records the manual drag
//! order.
//!
//! # Example
//!
//! ```no_run
//! use taskdeck::storage::Database;
//! use taskdeck::tasks::{SqliteTaskStore, Task, TaskStore};
//!
//! let db = Database::open("/tmp/taskdeck.sqlite3").unwrap();
//! let store = SqliteTaskStore::new(db);
//!
//! let mut task = Task::new(1, "Water the plants");
//! task.tags_raw = "home, #garden".to_string();
//! store.add_task(&mut task).unwrap();
//!
//! let tasks = store.list_tasks(1).unwrap();
//! assert_eq!(tasks.len(), 1);
//! ```

pub mod models;
pub mod store;

pub use models::{
    normalize_tags, parse_tag_list, InvalidPriority, Priority, Subtask, Task, DEFAULT_CATEGORY,
};
pub use store::{SqliteTaskStore, TaskStore};
