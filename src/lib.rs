//! # `task_console`
//!
//! A single-user task tracker: validated tasks with due dates, priorities
//! and statuses, stored in `SQLite` and driven from an interactive menu.

pub mod config;
pub mod console;
pub mod error;
#[cfg(feature = "cli")]
pub mod logging;
pub mod tasks;
pub mod testing;
pub mod traits;

pub use error::{Error, Result};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
