//! Testing utilities and mock implementations.
//!
//! These types are provided for use in tests. They may appear unused in
//! the library itself but are consumed by unit and integration tests.

#![allow(dead_code)]

use crate::error::{Result, StoreError};
use crate::tasks::filter::TaskQuery;
use crate::tasks::id::TaskId;
use crate::tasks::models::{TaskRecord, TaskUpdate};
use crate::tasks::store::TaskStore;
use crate::traits::{Clock, SystemClock};
use std::cell::{Cell, RefCell};

/// An in-memory task store.
///
/// Honors the same contract as the `SQLite` store, including "changed only
/// if a value differs" for updates. It can also be told to fail, to exercise
/// error paths.
#[derive(Debug, Default)]
pub struct MemoryTaskStore<C = SystemClock> {
    records: RefCell<Vec<TaskRecord>>,
    clock: C,
    failing: Cell<bool>,
    calls: Cell<usize>,
}

impl MemoryTaskStore {
    /// Create an empty store using the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: Clock> MemoryTaskStore<C> {
    /// Create an empty store that stamps records using `clock`.
    #[must_use]
    pub fn with_clock(clock: C) -> Self {
        Self { records: RefCell::default(), clock, failing: Cell::new(false), calls: Cell::new(0) }
    }

    /// Make every following call fail (or stop failing).
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    /// Number of store calls made so far, failed ones included.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.get()
    }

    /// Snapshot of every stored record, in insertion order.
    #[must_use]
    pub fn records(&self) -> Vec<TaskRecord> {
        self.records.borrow().clone()
    }

    /// Store a record verbatim, bypassing id and timestamp assignment.
    pub fn seed(&self, record: TaskRecord) {
        self.records.borrow_mut().push(record);
    }

    fn enter(&self) -> Result<()> {
        self.calls.set(self.calls.get() + 1);
        if self.failing.get() {
            return Err(StoreError::Io(std::io::Error::other("store unavailable")).into());
        }
        Ok(())
    }
}

impl<C: Clock> TaskStore for MemoryTaskStore<C> {
    fn insert(&self, record: &TaskRecord) -> Result<TaskId> {
        self.enter()?;
        let created = self.clock.now_utc();
        let id = TaskId::generate(created);
        self.records.borrow_mut().push(TaskRecord {
            id: Some(id),
            creation_timestamp: created,
            ..record.clone()
        });
        Ok(id)
    }

    fn find(&self, query: &TaskQuery) -> Result<Vec<TaskRecord>> {
        self.enter()?;
        let mut found: Vec<TaskRecord> =
            self.records.borrow().iter().filter(|r| query.matches(r)).cloned().collect();
        found.sort_by_key(|r| (r.due_date, r.creation_timestamp));
        Ok(found)
    }

    fn update_one(&self, id: &TaskId, update: &TaskUpdate) -> Result<bool> {
        self.enter()?;
        let mut records = self.records.borrow_mut();
        Ok(records
            .iter_mut()
            .find(|r| r.id == Some(*id))
            .is_some_and(|record| update.apply_to(record)))
    }

    fn delete_one(&self, id: &TaskId) -> Result<bool> {
        self.enter()?;
        let mut records = self.records.borrow_mut();
        let before = records.len();
        records.retain(|r| r.id != Some(*id));
        Ok(records.len() < before)
    }

    fn delete_all(&self) -> Result<bool> {
        self.enter()?;
        let mut records = self.records.borrow_mut();
        let removed = !records.is_empty();
        records.clear();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::tasks::models::{Priority, Status};
    use crate::traits::FixedClock;
    use chrono::{NaiveDate, NaiveDateTime, Utc};

    fn dt(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap().and_hms_opt(9, 0, 0).unwrap()
    }

    fn record(title: &str, due: NaiveDateTime) -> TaskRecord {
        TaskRecord {
            id: None,
            title: title.to_string(),
            description: "d".to_string(),
            due_date: due,
            priority: Priority::Medium,
            status: Status::Pending,
            creation_timestamp: Utc::now(),
        }
    }

    fn store() -> MemoryTaskStore<FixedClock> {
        MemoryTaskStore::with_clock(FixedClock(dt(1)))
    }

    #[test]
    fn test_memory_store_insert_and_find() {
        let store = store();
        let id = store.insert(&record("b", dt(3))).unwrap();
        store.insert(&record("a", dt(2))).unwrap();

        let all = store.find(&TaskQuery::default()).unwrap();
        assert_eq!(all.iter().map(|r| r.title.as_str()).collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(store.find(&TaskQuery::by_id(id)).unwrap()[0].title, "b");
        assert_eq!(all[0].creation_timestamp, dt(1).and_utc());
    }

    #[test]
    fn test_memory_store_update_semantics() {
        let store = store();
        let id = store.insert(&record("a", dt(2))).unwrap();
        assert!(store.update_one(&id, &TaskUpdate::completed()).unwrap());
        assert!(!store.update_one(&id, &TaskUpdate::completed()).unwrap());
        assert!(!store.update_one(&TaskId::generate(Utc::now()), &TaskUpdate::completed()).unwrap());
    }

    #[test]
    fn test_memory_store_deletes() {
        let store = store();
        assert!(!store.delete_all().unwrap());
        let id = store.insert(&record("a", dt(2))).unwrap();
        assert!(store.delete_one(&id).unwrap());
        assert!(!store.delete_one(&id).unwrap());
        store.insert(&record("b", dt(2))).unwrap();
        assert!(store.delete_all().unwrap());
        assert!(store.records().is_empty());
    }

    #[test]
    fn test_memory_store_failure_mode() {
        let store = store();
        store.set_failing(true);
        let err = store.find(&TaskQuery::default()).unwrap_err();
        assert!(matches!(err, Error::Store(StoreError::Io(_))));
        assert_eq!(store.call_count(), 1);

        store.set_failing(false);
        assert!(store.find(&TaskQuery::default()).is_ok());
    }
}
