//! # `taskdeck`
//!
//! Local data layer for a personal task manager: accounts with salted
//! password hashes, tasks in an embedded `SQLite` store with additive
//! schema migration, a category registry kept in the preferences file,
//! and a filter/sort/reorder pipeline that projects the loaded task set
//! into the displayed list.
//!
//! # Example
//!
//! ```no_run
//! use taskdeck::auth::AuthService;
//! use taskdeck::prefs::Preferences;
//! use taskdeck::session::SessionContext;
//! use taskdeck::storage::Database;
//! use taskdeck::tasks::SqliteTaskStore;
//! use taskdeck::view::TaskView;
//!
//! let data_dir = taskdeck::paths::default_data_dir().unwrap();
//! let db = Database::open(taskdeck::paths::db_path(&data_dir)).unwrap();
//! let prefs = Preferences::new(taskdeck::paths::prefs_path(&data_dir));
//! let auth = AuthService::new(db.clone(), SessionContext::new(prefs));
//!
//! let account = auth.register("ada@example.com", "hunter2", "Ada").unwrap();
//! auth.session().set_current_user(account.id).unwrap();
//!
//! let mut view = TaskView::new(SqliteTaskStore::new(db));
//! view.load(account.id).unwrap();
//! view.set_draft_title("Buy groceries");
//! view.add_task_from_draft().unwrap();
//! ```

pub mod auth;
pub mod categories;
pub mod error;
pub mod events;
pub mod logging;
pub mod paths;
pub mod prefs;
pub mod session;
pub mod stats;
pub mod storage;
pub mod suggest;
pub mod tasks;
pub mod view;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
