//! Task manager.
//!
//! The manager sits between user input and a [`TaskStore`]: it validates raw
//! text, turns it into typed values, forwards them to the store and rebuilds
//! tasks from what the store returns. Failures are logged and then returned
//! unchanged; nothing is retried.

use crate::error::Result;
use crate::tasks::filter::{build_query, RawFilters, TaskQuery};
use crate::tasks::id::TaskId;
use crate::tasks::models::{NewTask, RawTaskUpdate, Task, TaskUpdate};
use crate::tasks::store::TaskStore;
use crate::traits::{Clock, SystemClock};
use tracing::{error, info};

/// Log a failed operation and pass the result through.
fn logged<T>(operation: &str, result: Result<T>) -> Result<T> {
    if let Err(ref e) = result {
        error!(operation, error = %e, "task operation failed");
    }
    result
}

/// Validates input and forwards task operations to a store.
#[derive(Debug, Clone)]
pub struct TaskManager<S, C = SystemClock> {
    store: S,
    clock: C,
}

impl<S: TaskStore> TaskManager<S> {
    /// Create a manager over `store` using the system clock.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store, clock: SystemClock }
    }
}

impl<S: TaskStore, C: Clock> TaskManager<S, C> {
    /// Create a manager whose "now" comes from `clock`.
    #[must_use]
    pub const fn with_clock(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The clock used for due-date checks.
    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// Validate and persist a new task.
    ///
    /// The due date must not be in the past and the status defaults to
    /// Pending.
    ///
    /// # Errors
    ///
    /// Returns the first validation error, or the store's error.
    pub fn create(&self, fields: &NewTask) -> Result<TaskId> {
        logged("create", self.try_create(fields))
    }

    fn try_create(&self, fields: &NewTask) -> Result<TaskId> {
        let task = Task::new(fields, &self.clock)?;
        let id = self.store.insert(&task.to_record())?;
        info!(task_id = %id, title = task.title(), "created task");
        Ok(id)
    }

    /// List tasks matching the given filters.
    ///
    /// Past due dates are fine here; stored tasks are not re-checked against
    /// the clock.
    ///
    /// # Errors
    ///
    /// Returns a filter validation error, the store's error, or a validation
    /// error for a stored record with invalid text.
    pub fn list(&self, filters: &RawFilters) -> Result<Vec<Task>> {
        logged("list", build_query(filters).and_then(|query| self.find(&query)))
    }

    /// Look up one task by id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidIdFormat`] for a malformed id, or the
    /// store's error.
    pub fn get(&self, id: &str) -> Result<Option<Task>> {
        let result = TaskId::parse(id)
            .and_then(|id| self.find(&TaskQuery::by_id(id)))
            .map(|tasks| tasks.into_iter().next());
        logged("get", result)
    }

    /// Every task whose title matches `title`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns the store's error.
    pub fn find_by_title(&self, title: &str) -> Result<Vec<Task>> {
        logged("find_by_title", self.find(&TaskQuery::by_title(title)))
    }

    fn find(&self, query: &TaskQuery) -> Result<Vec<Task>> {
        self.store.find(query)?.into_iter().map(Task::from_record).collect()
    }

    /// Apply a partial update.
    ///
    /// Returns whether the task changed. An update with no fields returns
    /// false without touching the store.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidIdFormat`], the first field validation
    /// error (a new due date must not be in the past), or the store's error.
    pub fn update(&self, id: &str, raw: &RawTaskUpdate) -> Result<bool> {
        logged("update", self.try_update(id, raw))
    }

    fn try_update(&self, id: &str, raw: &RawTaskUpdate) -> Result<bool> {
        let id = TaskId::parse(id)?;
        let update = raw.validate(&self.clock)?;
        self.apply(&id, &update)
    }

    fn apply(&self, id: &TaskId, update: &TaskUpdate) -> Result<bool> {
        if update.is_empty() {
            return Ok(false);
        }
        let changed = self.store.update_one(id, update)?;
        info!(task_id = %id, changed, "updated task");
        Ok(changed)
    }

    /// Delete one task. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidIdFormat`] or the store's error.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let result = TaskId::parse(id).and_then(|id| {
            let deleted = self.store.delete_one(&id)?;
            info!(task_id = %id, deleted, "deleted task");
            Ok(deleted)
        });
        logged("delete", result)
    }

    /// Mark one task completed. Returns whether its status changed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidIdFormat`] or the store's error.
    pub fn complete(&self, id: &str) -> Result<bool> {
        let result = TaskId::parse(id).and_then(|id| self.apply(&id, &TaskUpdate::completed()));
        logged("complete", result)
    }

    /// Delete every task. Returns whether anything was removed.
    ///
    /// # Errors
    ///
    /// Returns the store's error.
    pub fn delete_all(&self) -> Result<bool> {
        let result = self.store.delete_all().inspect(|deleted| info!(deleted, "deleted all tasks"));
        logged("delete_all", result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, StoreError};
    use crate::tasks::models::{Priority, Status};
    use crate::testing::MemoryTaskStore;
    use crate::traits::FixedClock;
    use chrono::{NaiveDate, NaiveDateTime};

    fn noon(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    fn manager() -> TaskManager<MemoryTaskStore<FixedClock>, FixedClock> {
        let clock = FixedClock(noon(15));
        TaskManager::with_clock(MemoryTaskStore::with_clock(clock), clock)
    }

    fn ship_report() -> NewTask {
        NewTask {
            title: "Ship report".to_string(),
            description: "Quarterly numbers".to_string(),
            due_date: "2024-07-01 09:30".to_string(),
            priority: "high".to_string(),
            status: None,
        }
    }

    #[test]
    fn test_create_then_get() {
        let mgr = manager();
        let id = mgr.create(&ship_report()).unwrap();

        let task = mgr.get(&id.to_string()).unwrap().unwrap();
        assert_eq!(task.id(), Some(id));
        assert_eq!(task.title(), "Ship report");
        assert_eq!(task.priority(), Priority::High);
        assert_eq!(task.status(), Status::Pending);
        assert_eq!(task.creation_timestamp(), noon(15).and_utc());
    }

    #[test]
    fn test_create_rejects_invalid_input_before_store() {
        let mgr = manager();
        let mut fields = ship_report();
        fields.due_date = "2024-06-14".to_string();

        assert!(matches!(mgr.create(&fields).unwrap_err(), Error::PastDate(_)));

        fields = ship_report();
        fields.title = "  ".to_string();
        assert!(matches!(mgr.create(&fields).unwrap_err(), Error::InvalidField { field: "Title", .. }));

        assert_eq!(mgr.store().call_count(), 0);
    }

    #[test]
    fn test_create_with_explicit_status() {
        let mgr = manager();
        let mut fields = ship_report();
        fields.status = Some("in progress".to_string());
        let id = mgr.create(&fields).unwrap();
        assert_eq!(mgr.get(&id.to_string()).unwrap().unwrap().status(), Status::InProgress);
    }

    #[test]
    fn test_list_filters() {
        let mgr = manager();
        mgr.create(&ship_report()).unwrap();
        let mut other = ship_report();
        other.title = "Plan offsite".to_string();
        other.priority = "Low".to_string();
        other.due_date = "2024-08-01".to_string();
        mgr.create(&other).unwrap();

        assert_eq!(mgr.list(&RawFilters::default()).unwrap().len(), 2);

        let high = RawFilters { priority: Some("HIGH".to_string()), ..RawFilters::default() };
        let found = mgr.list(&high).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title(), "Ship report");

        let august = RawFilters {
            due_from: Some("2024-08-01".to_string()),
            due_to: Some("*".to_string()),
            ..RawFilters::default()
        };
        assert_eq!(mgr.list(&august).unwrap()[0].title(), "Plan offsite");
    }

    #[test]
    fn test_list_includes_overdue_tasks() {
        let mgr = manager();
        mgr.store().seed(crate::tasks::models::TaskRecord {
            id: Some(TaskId::parse("65f2a1b3c4d5e6f708091a2b").unwrap()),
            title: "Old".to_string(),
            description: "From last year".to_string(),
            due_date: noon(1) - chrono::Duration::days(365),
            priority: Priority::Low,
            status: Status::Pending,
            creation_timestamp: noon(1).and_utc(),
        });
        assert_eq!(mgr.list(&RawFilters::default()).unwrap().len(), 1);
    }

    #[test]
    fn test_list_bad_filter() {
        let mgr = manager();
        let bad = RawFilters { status: Some("done".to_string()), ..RawFilters::default() };
        assert!(matches!(mgr.list(&bad).unwrap_err(), Error::InvalidEnum { field: "Status", .. }));
    }

    #[test]
    fn test_list_wildcard_only_opens_date_bounds() {
        let mgr = manager();
        let mut plain = ship_report();
        plain.title = "A".to_string();
        mgr.create(&plain).unwrap();
        let mut star = ship_report();
        star.title = "*".to_string();
        mgr.create(&star).unwrap();

        for id in ["*", "   "] {
            let raw = RawFilters { id: Some(id.to_string()), ..RawFilters::default() };
            assert!(matches!(mgr.list(&raw).unwrap_err(), Error::InvalidIdFormat(_)));
        }

        let titled = RawFilters { title: Some("*".to_string()), ..RawFilters::default() };
        let found = mgr.list(&titled).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title(), "*");
    }

    #[test]
    fn test_find_by_title_returns_duplicates() {
        let mgr = manager();
        mgr.create(&ship_report()).unwrap();
        let mut dup = ship_report();
        dup.title = "SHIP REPORT".to_string();
        mgr.create(&dup).unwrap();

        assert_eq!(mgr.find_by_title("ship report").unwrap().len(), 2);
        assert!(mgr.find_by_title("ship").unwrap().is_empty());
    }

    #[test]
    fn test_update_partial_fields() {
        let mgr = manager();
        let id = mgr.create(&ship_report()).unwrap().to_string();

        let raw = RawTaskUpdate {
            priority: Some("low".to_string()),
            due_date: Some("2024-07-02".to_string()),
            ..RawTaskUpdate::default()
        };
        assert!(mgr.update(&id, &raw).unwrap());

        let task = mgr.get(&id).unwrap().unwrap();
        assert_eq!(task.priority(), Priority::Low);
        assert_eq!(task.title(), "Ship report");
        assert_eq!(task.due_date(), NaiveDate::from_ymd_opt(2024, 7, 2).unwrap().and_hms_opt(23, 59, 59).unwrap());
    }

    #[test]
    fn test_update_same_values_reports_no_change() {
        let mgr = manager();
        let id = mgr.create(&ship_report()).unwrap().to_string();
        let raw = RawTaskUpdate { priority: Some("High".to_string()), ..RawTaskUpdate::default() };
        assert!(!mgr.update(&id, &raw).unwrap());
    }

    #[test]
    fn test_empty_update_skips_store() {
        let mgr = manager();
        let id = mgr.create(&ship_report()).unwrap().to_string();
        let calls = mgr.store().call_count();

        assert!(!mgr.update(&id, &RawTaskUpdate::default()).unwrap());
        assert_eq!(mgr.store().call_count(), calls);
    }

    #[test]
    fn test_update_validation_errors() {
        let mgr = manager();
        let id = mgr.create(&ship_report()).unwrap().to_string();

        let past = RawTaskUpdate { due_date: Some("2024-01-01".to_string()), ..RawTaskUpdate::default() };
        assert!(matches!(mgr.update(&id, &past).unwrap_err(), Error::PastDate(_)));

        let bad_id = mgr.update("not-an-id", &RawTaskUpdate::default()).unwrap_err();
        assert!(matches!(bad_id, Error::InvalidIdFormat(_)));
    }

    #[test]
    fn test_complete_and_delete() {
        let mgr = manager();
        let id = mgr.create(&ship_report()).unwrap().to_string();

        assert!(mgr.complete(&id).unwrap());
        assert!(!mgr.complete(&id).unwrap());
        assert!(mgr.get(&id).unwrap().unwrap().is_completed());

        assert!(mgr.delete(&id).unwrap());
        assert!(!mgr.delete(&id).unwrap());
        assert!(mgr.get(&id).unwrap().is_none());
    }

    #[test]
    fn test_unknown_id_is_not_an_error() {
        let mgr = manager();
        let missing = "65f2a1b3c4d5e6f708091a2b";
        assert!(mgr.get(missing).unwrap().is_none());
        assert!(!mgr.complete(missing).unwrap());
        assert!(!mgr.delete(missing).unwrap());
    }

    #[test]
    fn test_delete_all() {
        let mgr = manager();
        assert!(!mgr.delete_all().unwrap());
        mgr.create(&ship_report()).unwrap();
        assert!(mgr.delete_all().unwrap());
        assert!(mgr.list(&RawFilters::default()).unwrap().is_empty());
    }

    #[test]
    fn test_store_errors_propagate_unchanged() {
        let mgr = manager();
        mgr.store().set_failing(true);

        assert!(matches!(mgr.create(&ship_report()).unwrap_err(), Error::Store(StoreError::Io(_))));
        assert!(matches!(mgr.delete_all().unwrap_err(), Error::Store(StoreError::Io(_))));
        assert!(!mgr.list(&RawFilters::default()).unwrap_err().is_recoverable());
        // One attempt each, no retries
        assert_eq!(mgr.store().call_count(), 3);
    }
}
