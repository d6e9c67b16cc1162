//! Task store trait and `SQLite` implementation.

use crate::config::AppConfig;
use crate::error::{Result, StoreError};
use crate::tasks::filter::{fold_case, TaskQuery};
use crate::tasks::id::TaskId;
use crate::tasks::models::{Priority, Status, TaskRecord, TaskUpdate};
use crate::traits::{Clock, SystemClock};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Storage format for due dates. Fixed width, so text order is time order.
const DUE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Columns selected whenever a full record is read.
const TASK_COLUMNS: &str = "id, title, description, due_date, priority, status, creation_timestamp";

/// Trait for task storage operations.
///
/// All methods return a `Result` and may fail with database errors, which
/// callers propagate without retrying.
#[allow(clippy::missing_errors_doc)]
pub trait TaskStore {
    /// Persist a new record and return the id the store assigned.
    ///
    /// Any `id` or `creation_timestamp` on the record is ignored: the store
    /// generates both.
    fn insert(&self, record: &TaskRecord) -> Result<TaskId>;

    /// Records matching the query, by due date then creation time.
    ///
    /// An empty query matches everything.
    fn find(&self, query: &TaskQuery) -> Result<Vec<TaskRecord>>;

    /// Apply an update to one record.
    ///
    /// Returns true only if a stored value actually changed; an unknown id
    /// or an update that sets every field to its current value gives false.
    fn update_one(&self, id: &TaskId, update: &TaskUpdate) -> Result<bool>;

    /// Delete one record. Returns whether it existed.
    fn delete_one(&self, id: &TaskId) -> Result<bool>;

    /// Delete every record. Returns whether anything was removed.
    fn delete_all(&self) -> Result<bool>;
}

impl<S: TaskStore + ?Sized> TaskStore for &S {
    fn insert(&self, record: &TaskRecord) -> Result<TaskId> {
        (**self).insert(record)
    }

    fn find(&self, query: &TaskQuery) -> Result<Vec<TaskRecord>> {
        (**self).find(query)
    }

    fn update_one(&self, id: &TaskId, update: &TaskUpdate) -> Result<bool> {
        (**self).update_one(id, update)
    }

    fn delete_one(&self, id: &TaskId) -> Result<bool> {
        (**self).delete_one(id)
    }

    fn delete_all(&self) -> Result<bool> {
        (**self).delete_all()
    }
}

/// An entry in the append-only audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEntry {
    /// Row id; increases with every entry.
    pub id: i64,
    /// When the entry was written (`SQLite` `datetime('now')`, UTC).
    pub timestamp: String,
    /// `create`, `update`, `delete` or `delete_all`.
    pub operation: String,
    /// The affected task, if the operation targeted one.
    pub task_id: Option<String>,
    /// JSON of the record before the operation.
    pub old_value: Option<String>,
    /// JSON of the record after the operation.
    pub new_value: Option<String>,
    /// Free-form details.
    pub details: Option<String>,
}

/// SQLite-based task store.
///
/// Only the database path is kept; each operation opens its own connection.
#[derive(Debug, Clone)]
pub struct SqliteTaskStore<C = SystemClock> {
    db_path: PathBuf,
    clock: C,
}

impl SqliteTaskStore {
    /// Create a new `SQLite` task store at the given database path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        Self::with_clock(db_path, SystemClock)
    }

    /// Create a store at the database path named by the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if no path can be resolved or the database cannot be
    /// initialized.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(config.resolved_database_path()?)
    }
}

impl<C: Clock> SqliteTaskStore<C> {
    /// Create a store that stamps new records using `clock`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn with_clock(db_path: impl AsRef<Path>, clock: C) -> Result<Self> {
        let store = Self { db_path: db_path.as_ref().to_path_buf(), clock };
        store.init_schema()?;
        Ok(store)
    }

    /// Get the database path.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Open a connection to the database.
    fn open(&self) -> Result<Connection> {
        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent).map_err(StoreError::Io)?;
        }
        let conn = Connection::open(&self.db_path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA journal_mode = WAL;")?;
        Ok(conn)
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> Result<()> {
        let conn = self.open()?;

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                title_folded TEXT NOT NULL,
                description TEXT NOT NULL,
                due_date TEXT NOT NULL,
                priority TEXT NOT NULL CHECK (priority IN ('Low', 'Medium', 'High')),
                status TEXT NOT NULL DEFAULT 'Pending'
                    CHECK (status IN ('Pending', 'In Progress', 'Completed')),
                creation_timestamp TEXT NOT NULL
            );

            -- Immutable audit log
            CREATE TABLE IF NOT EXISTS task_audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL DEFAULT (datetime('now')),
                operation TEXT NOT NULL,
                task_id TEXT,
                old_value TEXT,
                new_value TEXT,
                details TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_title_folded ON tasks(title_folded);
            CREATE INDEX IF NOT EXISTS idx_tasks_due_date ON tasks(due_date, creation_timestamp);
            CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
            CREATE INDEX IF NOT EXISTS idx_tasks_priority ON tasks(priority);
            CREATE INDEX IF NOT EXISTS idx_task_audit_task_id ON task_audit_log(task_id);
            ",
        )?;

        Ok(())
    }

    /// Log an operation to the audit log.
    fn log_audit(
        conn: &Connection,
        operation: &str,
        task_id: Option<&str>,
        old_value: Option<&str>,
        new_value: Option<&str>,
        details: Option<&str>,
    ) -> Result<()> {
        conn.execute(
            "INSERT INTO task_audit_log (operation, task_id, old_value, new_value, details)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![operation, task_id, old_value, new_value, details],
        )?;
        Ok(())
    }

    /// Read one record by id.
    fn fetch(conn: &Connection, id: &str) -> Result<Option<TaskRecord>> {
        let row = conn
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
                params![id],
                StoredRow::read,
            )
            .optional()?;
        Ok(row.map(StoredRow::into_record).transpose()?)
    }

    /// Get the most recent audit log entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be read.
    pub fn audit_log(&self, limit: Option<usize>) -> Result<Vec<AuditEntry>> {
        let conn = self.open()?;
        // SQLite treats a negative LIMIT as "no limit"
        let limit = limit.map_or(-1, |lim| i64::try_from(lim).unwrap_or(i64::MAX));

        let mut stmt = conn.prepare(
            "SELECT id, timestamp, operation, task_id, old_value, new_value, details
             FROM task_audit_log ORDER BY id DESC LIMIT ?1",
        )?;
        let entries = stmt
            .query_map(params![limit], |row| {
                Ok(AuditEntry {
                    id: row.get(0)?,
                    timestamp: row.get(1)?,
                    operation: row.get(2)?,
                    task_id: row.get(3)?,
                    old_value: row.get(4)?,
                    new_value: row.get(5)?,
                    details: row.get(6)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(entries)
    }
}

impl<C: Clock> TaskStore for SqliteTaskStore<C> {
    fn insert(&self, record: &TaskRecord) -> Result<TaskId> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        let created = self.clock.now_utc();
        let id = TaskId::generate(created);
        let stored = TaskRecord { id: Some(id), creation_timestamp: created, ..record.clone() };
        let key = id.to_string();

        tx.execute(
            "INSERT INTO tasks (id, title, title_folded, description, due_date, priority, status, creation_timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                key,
                stored.title,
                fold_case(&stored.title),
                stored.description,
                format_due(stored.due_date),
                stored.priority.as_str(),
                stored.status.as_str(),
                format_created(created),
            ],
        )?;

        let new_json = serde_json::to_string(&stored)?;
        Self::log_audit(&tx, "create", Some(&key), None, Some(&new_json), None)?;
        tx.commit()?;
        debug!(task_id = %key, title = %stored.title, "inserted task");

        Ok(id)
    }

    fn find(&self, query: &TaskQuery) -> Result<Vec<TaskRecord>> {
        let conn = self.open()?;

        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(id) = query.id {
            clauses.push("id = ?");
            values.push(Box::new(id.to_string()));
        }
        if let Some(title) = &query.title {
            clauses.push("title_folded = ?");
            values.push(Box::new(title.folded().to_string()));
        }
        if let Some(range) = query.due {
            if let Some(from) = range.from {
                clauses.push("due_date >= ?");
                values.push(Box::new(format_due(from)));
            }
            if let Some(to) = range.to {
                clauses.push("due_date <= ?");
                values.push(Box::new(format_due(to)));
            }
        }
        if let Some(priority) = query.priority {
            clauses.push("priority = ?");
            values.push(Box::new(priority.as_str()));
        }
        if let Some(status) = query.status {
            clauses.push("status = ?");
            values.push(Box::new(status.as_str()));
        }

        let mut sql = format!("SELECT {TASK_COLUMNS} FROM tasks");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY due_date, creation_timestamp, rowid");

        let params: Vec<&dyn rusqlite::ToSql> = values.iter().map(AsRef::as_ref).collect();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params.as_slice(), StoredRow::read)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        debug!(count = rows.len(), "found tasks");
        Ok(rows.into_iter().map(StoredRow::into_record).collect::<std::result::Result<Vec<_>, StoreError>>()?)
    }

    fn update_one(&self, id: &TaskId, update: &TaskUpdate) -> Result<bool> {
        if update.is_empty() {
            return Ok(false);
        }

        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        let key = id.to_string();

        let Some(old) = Self::fetch(&tx, &key)? else {
            return Ok(false);
        };

        // Each present field is both assigned and compared, so a row only
        // counts as updated when some value really differs.
        let mut sets: Vec<&str> = Vec::new();
        let mut set_values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        let mut diffs: Vec<&str> = Vec::new();
        let mut diff_values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref title) = update.title {
            sets.push("title = ?");
            set_values.push(Box::new(title.clone()));
            sets.push("title_folded = ?");
            set_values.push(Box::new(fold_case(title)));
            diffs.push("title IS NOT ?");
            diff_values.push(Box::new(title.clone()));
        }
        if let Some(ref description) = update.description {
            sets.push("description = ?");
            set_values.push(Box::new(description.clone()));
            diffs.push("description IS NOT ?");
            diff_values.push(Box::new(description.clone()));
        }
        if let Some(due_date) = update.due_date {
            sets.push("due_date = ?");
            set_values.push(Box::new(format_due(due_date)));
            diffs.push("due_date IS NOT ?");
            diff_values.push(Box::new(format_due(due_date)));
        }
        if let Some(priority) = update.priority {
            sets.push("priority = ?");
            set_values.push(Box::new(priority.as_str()));
            diffs.push("priority IS NOT ?");
            diff_values.push(Box::new(priority.as_str()));
        }
        if let Some(status) = update.status {
            sets.push("status = ?");
            set_values.push(Box::new(status.as_str()));
            diffs.push("status IS NOT ?");
            diff_values.push(Box::new(status.as_str()));
        }

        let sql = format!(
            "UPDATE tasks SET {} WHERE id = ? AND ({})",
            sets.join(", "),
            diffs.join(" OR ")
        );
        set_values.push(Box::new(key.clone()));
        set_values.extend(diff_values);

        let params: Vec<&dyn rusqlite::ToSql> = set_values.iter().map(AsRef::as_ref).collect();
        let changed = tx.execute(&sql, params.as_slice())? > 0;

        if changed {
            let mut new = old.clone();
            update.apply_to(&mut new);
            let old_json = serde_json::to_string(&old)?;
            let new_json = serde_json::to_string(&new)?;
            Self::log_audit(&tx, "update", Some(&key), Some(&old_json), Some(&new_json), None)?;
        }
        tx.commit()?;

        debug!(task_id = %key, changed, "updated task");
        Ok(changed)
    }

    fn delete_one(&self, id: &TaskId) -> Result<bool> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        let key = id.to_string();

        let Some(old) = Self::fetch(&tx, &key)? else {
            return Ok(false);
        };

        tx.execute("DELETE FROM tasks WHERE id = ?1", params![key])?;
        let old_json = serde_json::to_string(&old)?;
        Self::log_audit(&tx, "delete", Some(&key), Some(&old_json), None, None)?;
        tx.commit()?;

        debug!(task_id = %key, "deleted task");
        Ok(true)
    }

    fn delete_all(&self) -> Result<bool> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        let removed = tx.execute("DELETE FROM tasks", [])?;

        if removed > 0 {
            let details = format!("removed {removed} tasks");
            Self::log_audit(&tx, "delete_all", None, None, None, Some(&details))?;
        }
        tx.commit()?;

        debug!(removed, "deleted all tasks");
        Ok(removed > 0)
    }
}

fn format_due(due: NaiveDateTime) -> String {
    due.format(DUE_DATE_FORMAT).to_string()
}

fn format_created(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// A `tasks` row as raw column text.
struct StoredRow {
    id: String,
    title: String,
    description: String,
    due_date: String,
    priority: String,
    status: String,
    creation_timestamp: String,
}

impl StoredRow {
    fn read(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            due_date: row.get(3)?,
            priority: row.get(4)?,
            status: row.get(5)?,
            creation_timestamp: row.get(6)?,
        })
    }

    fn into_record(self) -> std::result::Result<TaskRecord, StoreError> {
        let corrupt = |reason: String| StoreError::CorruptRecord { id: self.id.clone(), reason };

        let id = TaskId::parse(&self.id).map_err(|e| corrupt(e.to_string()))?;
        let due_date = NaiveDateTime::parse_from_str(&self.due_date, DUE_DATE_FORMAT)
            .map_err(|e| corrupt(format!("due date '{}': {e}", self.due_date)))?;
        let priority = Priority::from_canonical(&self.priority)
            .ok_or_else(|| corrupt(format!("unknown priority '{}'", self.priority)))?;
        let status = Status::from_canonical(&self.status)
            .ok_or_else(|| corrupt(format!("unknown status '{}'", self.status)))?;
        let creation_timestamp = DateTime::parse_from_rfc3339(&self.creation_timestamp)
            .map_err(|e| corrupt(format!("creation timestamp '{}': {e}", self.creation_timestamp)))?
            .with_timezone(&Utc);

        Ok(TaskRecord {
            id: Some(id),
            title: self.title,
            description: self.description,
            due_date,
            priority,
            status,
            creation_timestamp,
        })
    }
}
