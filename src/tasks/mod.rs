//! Task tracking.
//!
//! This module provides:
//! - Validators for every user-editable field
//! - Due-date parsing and display
//! - A validated [`Task`] entity and the flat [`TaskRecord`] stored for it
//! - A filter builder turning raw filter text into a [`TaskQuery`]
//! - The [`TaskStore`] contract and its `SQLite` implementation
//! - A [`TaskManager`] tying validation to storage
//! - An optional [`TaskWorker`] that serializes mutations on one thread
//!
//! # Example
//!
//! ```no_run
//! use task_console::tasks::{NewTask, RawFilters, SqliteTaskStore, TaskManager};
//!
//! let store = SqliteTaskStore::new("/tmp/tasks.db").unwrap();
//! let manager = TaskManager::new(store);
//!
//! let id = manager
//!     .create(&NewTask {
//!         title: "Ship report".to_string(),
//!         description: "Quarterly numbers".to_string(),
//!         due_date: "2030-07-01 09:30".to_string(),
//!         priority: "high".to_string(),
//!         status: None,
//!     })
//!     .unwrap();
//!
//! manager.complete(&id.to_string()).unwrap();
//! let high = RawFilters { priority: Some("High".to_string()), ..RawFilters::default() };
//! for task in manager.list(&high).unwrap() {
//!     println!("{task}");
//! }
//! ```

pub mod dates;
pub mod filter;
pub mod id;
pub mod manager;
pub mod models;
pub mod store;
pub mod validate;
pub mod worker;

pub use filter::{build_query, parse_date_range, DueRange, RawFilters, TaskQuery, TitleMatch};
pub use id::TaskId;
pub use manager::TaskManager;
pub use models::{NewTask, Priority, RawTaskUpdate, Status, Task, TaskRecord, TaskUpdate};
pub use store::{AuditEntry, SqliteTaskStore, TaskStore};
pub use worker::{Operation, Outcome, TaskWorker};
