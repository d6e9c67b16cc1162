//! Error types for `task_console`.

use chrono::NaiveDateTime;

/// Errors raised by a task store.
///
/// Store errors are never retried or reinterpreted by the task manager; they
/// reach the caller exactly as the backend reported them.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A `SQLite` database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A record could not be serialized for the audit log.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An I/O error occurred while preparing the database location.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored row could not be turned back into a record.
    #[error("Corrupt record {id}: {reason}")]
    CorruptRecord {
        /// The identifier of the offending row.
        id: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// Errors that can occur while validating, querying or persisting tasks.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A free-text field was empty or too long.
    #[error("{field} {reason}")]
    InvalidField {
        /// The field name as shown to the user ("Title", "Description").
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// An enumerated field held a value outside its allowed set.
    #[error("{field} must be one of: {}", .allowed.join(", "))]
    InvalidEnum {
        /// The field name as shown to the user ("Priority", "Status").
        field: &'static str,
        /// The rejected input.
        value: String,
        /// The canonical allowed values.
        allowed: &'static [&'static str],
    },

    /// Date text matched none of the accepted shapes.
    #[error("Invalid date format '{0}'. Please use YYYY-MM-DD or YYYY-MM-DD HH:MM format.")]
    InvalidDateFormat(String),

    /// A due date was earlier than the current instant.
    #[error("Due date and time cannot be in the past ({})", .0.format("%Y-%m-%d %H:%M"))]
    PastDate(NaiveDateTime),

    /// A task identifier was malformed.
    #[error("Invalid task ID format: '{0}'")]
    InvalidIdFormat(String),

    /// A due-date range had neither bound.
    #[error("At least one date must be provided")]
    MissingRangeBound,

    /// A due-date range had its lower bound after its upper bound.
    #[error(
        "Invalid date range: from ({}) cannot be after to ({})",
        .from.format("%Y-%m-%d"),
        .to.format("%Y-%m-%d")
    )]
    InvalidRange {
        /// The lower bound.
        from: NaiveDateTime,
        /// The upper bound.
        to: NaiveDateTime,
    },

    /// The persistence layer failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Configuration was invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A YAML parsing error occurred.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An I/O error occurred outside the store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A job was submitted to a worker that has already shut down.
    #[error("Task worker has stopped")]
    WorkerStopped,
}

impl Error {
    /// Whether the user can fix this by entering different input.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidField { .. }
                | Self::InvalidEnum { .. }
                | Self::InvalidDateFormat(_)
                | Self::PastDate(_)
                | Self::InvalidIdFormat(_)
                | Self::MissingRangeBound
                | Self::InvalidRange { .. }
        )
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Store(StoreError::Database(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Store(StoreError::Json(err))
    }
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn test_invalid_enum_lists_allowed_values() {
        let err = Error::InvalidEnum {
            field: "Priority",
            value: "urgent".to_string(),
            allowed: &["Low", "Medium", "High"],
        };
        assert_eq!(err.to_string(), "Priority must be one of: Low, Medium, High");
    }

    #[test]
    fn test_date_format_message_names_both_shapes() {
        let msg = Error::InvalidDateFormat("tomorrow-ish".to_string()).to_string();
        assert!(msg.contains("YYYY-MM-DD"));
        assert!(msg.contains("YYYY-MM-DD HH:MM"));
    }

    #[test]
    fn test_invalid_range_display() {
        let err = Error::InvalidRange { from: at(2024, 1, 1), to: at(2023, 1, 1) };
        assert_eq!(
            err.to_string(),
            "Invalid date range: from (2024-01-01) cannot be after to (2023-01-01)"
        );
    }

    #[test]
    fn test_recoverable_kinds() {
        assert!(Error::PastDate(at(2020, 1, 1)).is_recoverable());
        assert!(Error::InvalidIdFormat("x".to_string()).is_recoverable());
        assert!(Error::MissingRangeBound.is_recoverable());
        assert!(!Error::WorkerStopped.is_recoverable());
        assert!(!Error::Config("bad".to_string()).is_recoverable());
    }

    #[test]
    fn test_store_error_is_transparent() {
        let err = Error::from(StoreError::CorruptRecord {
            id: "abc".to_string(),
            reason: "bad priority".to_string(),
        });
        assert_eq!(err.to_string(), "Corrupt record abc: bad priority");
        assert!(!err.is_recoverable());
    }
}
