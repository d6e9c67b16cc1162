//! Task model types.

use crate::error::Result;
use crate::tasks::dates::{format_due_date, format_timestamp, parse_due_date};
use crate::tasks::id::TaskId;
use crate::tasks::validate::{
    validate_description, validate_priority, validate_status, validate_title,
};
use crate::traits::Clock;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task priority levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    /// Low priority.
    Low,
    /// Medium priority.
    Medium,
    /// High priority.
    High,
}

impl Priority {
    /// Canonical names, in display order.
    pub const NAMES: [&'static str; 3] = ["Low", "Medium", "High"];

    /// Look up a priority by its exact canonical name.
    #[must_use]
    pub fn from_canonical(name: &str) -> Option<Self> {
        match name {
            "Low" => Some(Self::Low),
            "Medium" => Some(Self::Medium),
            "High" => Some(Self::High),
            _ => None,
        }
    }

    /// Get the canonical name of the priority.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Status {
    /// Not started yet.
    #[default]
    Pending,
    /// Being worked on.
    #[serde(rename = "In Progress")]
    InProgress,
    /// Done.
    Completed,
}

impl Status {
    /// Canonical names, in display order.
    pub const NAMES: [&'static str; 3] = ["Pending", "In Progress", "Completed"];

    /// Look up a status by its exact canonical name.
    #[must_use]
    pub fn from_canonical(name: &str) -> Option<Self> {
        match name {
            "Pending" => Some(Self::Pending),
            "In Progress" => Some(Self::InProgress),
            "Completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Get the canonical name of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raw user input for a new task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    /// Title text.
    pub title: String,
    /// Description text.
    pub description: String,
    /// Due date text, e.g. `2024-07-01` or `2024-07-01 09:30`.
    pub due_date: String,
    /// Priority text, any case.
    pub priority: String,
    /// Status text; `None` means Pending.
    pub status: Option<String>,
}

/// A validated task.
///
/// A `Task` only exists if every field passed validation. It is never
/// modified after construction: updates go to the store and a fresh `Task`
/// is rebuilt from the stored record on the next read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: Option<TaskId>,
    title: String,
    description: String,
    due_date: NaiveDateTime,
    priority: Priority,
    status: Status,
    creation_timestamp: DateTime<Utc>,
}

impl Task {
    /// Validate user input and build a new, not yet persisted task.
    ///
    /// The due date must not be in the past relative to `clock`.
    ///
    /// # Errors
    ///
    /// Returns the first validation error encountered.
    pub fn new(fields: &NewTask, clock: &impl Clock) -> Result<Self> {
        let title = validate_title(&fields.title)?;
        let description = validate_description(&fields.description)?;
        let due_date = parse_due_date(&fields.due_date, true, clock)?;
        let priority = validate_priority(&fields.priority)?;
        let status = fields.status.as_deref().map(validate_status).transpose()?.unwrap_or_default();

        Ok(Self {
            id: None,
            title,
            description,
            due_date,
            priority,
            status,
            creation_timestamp: clock.now_utc(),
        })
    }

    /// Rebuild a task from a stored record.
    ///
    /// Text fields are validated again so a hand-edited database cannot
    /// produce an invalid task. Past due dates are accepted and the stored
    /// creation timestamp is kept.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a stored text field is invalid.
    pub fn from_record(record: TaskRecord) -> Result<Self> {
        Ok(Self {
            id: record.id,
            title: validate_title(&record.title)?,
            description: validate_description(&record.description)?,
            due_date: record.due_date,
            priority: record.priority,
            status: record.status,
            creation_timestamp: record.creation_timestamp,
        })
    }

    /// Convert to the flat form exchanged with a store.
    #[must_use]
    pub fn to_record(&self) -> TaskRecord {
        TaskRecord {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            due_date: self.due_date,
            priority: self.priority,
            status: self.status,
            creation_timestamp: self.creation_timestamp,
        }
    }

    /// Store-assigned identifier, absent until persisted.
    #[must_use]
    pub const fn id(&self) -> Option<TaskId> {
        self.id
    }

    /// Title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Due date (local wall-clock time).
    #[must_use]
    pub const fn due_date(&self) -> NaiveDateTime {
        self.due_date
    }

    /// Priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Status.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// When the task was created.
    #[must_use]
    pub const fn creation_timestamp(&self) -> DateTime<Utc> {
        self.creation_timestamp
    }

    /// Check if the task is completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.id {
            Some(id) => writeln!(f, "Task ID: {id}")?,
            None => writeln!(f, "Task ID: (not saved)")?,
        }
        writeln!(f, "Title: {}", self.title)?;
        writeln!(f, "Description: {}", self.description)?;
        writeln!(f, "Due Date: {}", format_due_date(self.due_date))?;
        writeln!(f, "Priority: {}", self.priority)?;
        writeln!(f, "Status: {}", self.status)?;
        write!(f, "Created: {}", format_timestamp(self.creation_timestamp))
    }
}

/// The flat representation of a task exchanged with a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Identifier; `None` before insertion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TaskId>,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Due date (local wall-clock time).
    pub due_date: NaiveDateTime,
    /// Priority.
    pub priority: Priority,
    /// Status.
    pub status: Status,
    /// Creation time, assigned by the store on insert.
    pub creation_timestamp: DateTime<Utc>,
}

/// Raw user input for a partial update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTaskUpdate {
    /// New title text.
    pub title: Option<String>,
    /// New description text.
    pub description: Option<String>,
    /// New due date text.
    pub due_date: Option<String>,
    /// New priority text.
    pub priority: Option<String>,
    /// New status text.
    pub status: Option<String>,
}

impl RawTaskUpdate {
    /// Run each present field through its validator.
    ///
    /// A new due date must not be in the past.
    ///
    /// # Errors
    ///
    /// Returns the first validation error encountered.
    pub fn validate(&self, clock: &impl Clock) -> Result<TaskUpdate> {
        Ok(TaskUpdate {
            title: self.title.as_deref().map(validate_title).transpose()?,
            description: self.description.as_deref().map(validate_description).transpose()?,
            due_date: self
                .due_date
                .as_deref()
                .map(|raw| parse_due_date(raw, true, clock))
                .transpose()?,
            priority: self.priority.as_deref().map(validate_priority).transpose()?,
            status: self.status.as_deref().map(validate_status).transpose()?,
        })
    }
}

/// Validated fields that can be updated on a task.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct TaskUpdate {
    /// New title (if Some).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description (if Some).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New due date (if Some).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDateTime>,
    /// New priority (if Some).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// New status (if Some).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

impl TaskUpdate {
    /// An update that only marks the task completed.
    #[must_use]
    pub fn completed() -> Self {
        Self { status: Some(Status::Completed), ..Self::default() }
    }

    /// Check if any fields are set for update.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.priority.is_none()
            && self.status.is_none()
    }

    /// Apply this update to a record in place.
    ///
    /// Returns whether any stored value actually changed.
    pub fn apply_to(&self, record: &mut TaskRecord) -> bool {
        let before = record.clone();
        if let Some(title) = &self.title {
            record.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            record.description.clone_from(description);
        }
        if let Some(due_date) = self.due_date {
            record.due_date = due_date;
        }
        if let Some(priority) = self.priority {
            record.priority = priority;
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        *record != before
    }
}
