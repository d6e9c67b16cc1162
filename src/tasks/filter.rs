//! Query filters.
//!
//! [`RawFilters`] holds what the user typed; [`build_query`] normalizes it
//! into a [`TaskQuery`] that a store can evaluate.

use crate::error::{Error, Result};
use crate::tasks::dates::{parse_filter_date, parse_filter_start};
use crate::tasks::id::TaskId;
use crate::tasks::models::{Priority, Status, TaskRecord};
use crate::tasks::validate::{validate_priority, validate_status};
use chrono::NaiveDateTime;

/// Text meaning "leave this bound open" in a date range.
pub const WILDCARD: &str = "*";

/// Raw filter values as entered by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFilters {
    /// Exact title, any letter case.
    pub title: Option<String>,
    /// Task identifier text.
    pub id: Option<String>,
    /// Earliest due date, or `*`.
    pub due_from: Option<String>,
    /// Latest due date, or `*`.
    pub due_to: Option<String>,
    /// Priority, any letter case.
    pub priority: Option<String>,
    /// Status, any letter case.
    pub status: Option<String>,
}

/// A case-insensitive, whole-string title match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleMatch {
    folded: String,
}

impl TitleMatch {
    /// Build a matcher for the given title.
    #[must_use]
    pub fn new(title: &str) -> Self {
        Self { folded: fold_case(title.trim()) }
    }

    /// The lower-cased title being matched.
    #[must_use]
    pub fn folded(&self) -> &str {
        &self.folded
    }

    /// Check a candidate title.
    #[must_use]
    pub fn matches(&self, title: &str) -> bool {
        fold_case(title) == self.folded
    }
}

/// Lower-case text for case-insensitive comparison.
#[must_use]
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// An inclusive due-date range; `None` bounds are open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DueRange {
    /// Inclusive lower bound.
    pub from: Option<NaiveDateTime>,
    /// Inclusive upper bound.
    pub to: Option<NaiveDateTime>,
}

impl DueRange {
    /// Check if neither bound is set.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Check a due date against both bounds.
    #[must_use]
    pub fn contains(&self, due: NaiveDateTime) -> bool {
        self.from.map_or(true, |from| due >= from) && self.to.map_or(true, |to| due <= to)
    }
}

/// The normalized predicate passed to a store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    /// Exact id.
    pub id: Option<TaskId>,
    /// Case-insensitive exact title.
    pub title: Option<TitleMatch>,
    /// Due-date range.
    pub due: Option<DueRange>,
    /// Exact priority.
    pub priority: Option<Priority>,
    /// Exact status.
    pub status: Option<Status>,
}

impl TaskQuery {
    /// A query matching one id.
    #[must_use]
    pub fn by_id(id: TaskId) -> Self {
        Self { id: Some(id), ..Self::default() }
    }

    /// A query matching one title, ignoring case.
    #[must_use]
    pub fn by_title(title: &str) -> Self {
        Self { title: Some(TitleMatch::new(title)), ..Self::default() }
    }

    /// Check if the query matches every record.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.title.is_none()
            && self.due.map_or(true, |range| range.is_unbounded())
            && self.priority.is_none()
            && self.status.is_none()
    }

    /// Evaluate the query against a record.
    #[must_use]
    pub fn matches(&self, record: &TaskRecord) -> bool {
        self.id.map_or(true, |id| record.id == Some(id))
            && self.title.as_ref().map_or(true, |title| title.matches(&record.title))
            && self.due.map_or(true, |range| range.contains(record.due_date))
            && self.priority.map_or(true, |priority| record.priority == priority)
            && self.status.map_or(true, |status| record.status == status)
    }
}

/// Treat a blank or wildcard date bound as open.
fn given(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty() && *s != WILDCARD)
}

/// Normalize raw filter values into a query.
///
/// `None` leaves a field unconstrained; any other value goes through its
/// parser, so a blank id is malformed and `*` is a literal title. Only the
/// due-date bounds accept blank or `*` as an open side. A date range with
/// no bounds is simply left out; rejecting it is up to the caller, see
/// [`parse_date_range`].
///
/// # Errors
///
/// Returns [`Error::InvalidIdFormat`] for a malformed id, the validator
/// errors for priority and status, and [`Error::InvalidDateFormat`] for a
/// malformed bound.
pub fn build_query(raw: &RawFilters) -> Result<TaskQuery> {
    let from = given(raw.due_from.as_deref()).map(parse_filter_start).transpose()?;
    let to = given(raw.due_to.as_deref()).map(parse_filter_date).transpose()?;
    let due = DueRange { from, to };

    Ok(TaskQuery {
        id: raw.id.as_deref().map(TaskId::parse).transpose()?,
        title: raw.title.as_deref().map(TitleMatch::new),
        due: (!due.is_unbounded()).then_some(due),
        priority: raw.priority.as_deref().map(validate_priority).transpose()?,
        status: raw.status.as_deref().map(validate_status).transpose()?,
    })
}

/// Caller-side check of a due-date range before querying.
///
/// Each side is a date, or `*`/blank for an open bound.
///
/// # Errors
///
/// Returns [`Error::MissingRangeBound`] if both sides are open,
/// [`Error::InvalidDateFormat`] for a malformed side, and
/// [`Error::InvalidRange`] if the lower bound is after the upper bound.
pub fn parse_date_range(from: &str, to: &str) -> Result<DueRange> {
    let (from_text, to_text) = (given(Some(from)), given(Some(to)));
    if from_text.is_none() && to_text.is_none() {
        return Err(Error::MissingRangeBound);
    }

    let range = DueRange {
        from: from_text.map(parse_filter_start).transpose()?,
        to: to_text.map(parse_filter_date).transpose()?,
    };

    if let (Some(from), Some(to)) = (range.from, range.to) {
        if from > to {
            return Err(Error::InvalidRange { from, to });
        }
    }
    Ok(range)
}
