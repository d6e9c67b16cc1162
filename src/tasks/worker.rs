//! Serializing worker.
//!
//! A [`TaskWorker`] owns a [`TaskManager`] on a dedicated thread and runs
//! mutating operations one at a time, in the order they were submitted.
//! Submitting blocks until that operation's outcome comes back, so callers
//! see the same results as calling the manager directly.
//!
//! Listing does not go through the worker.

use crate::error::{Error, Result};
use crate::tasks::id::TaskId;
use crate::tasks::manager::TaskManager;
use crate::tasks::models::{NewTask, RawTaskUpdate};
use crate::tasks::store::TaskStore;
use crate::traits::Clock;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

/// A mutating task operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Create a task.
    Create(NewTask),
    /// Update the task with the given id.
    Update(String, RawTaskUpdate),
    /// Delete the task with the given id.
    Delete(String),
    /// Mark the task with the given id completed.
    Complete(String),
    /// Delete every task.
    DeleteAll,
}

impl Operation {
    /// Run the operation against a manager.
    ///
    /// # Errors
    ///
    /// Returns whatever the manager returns.
    pub fn run<S: TaskStore, C: Clock>(&self, manager: &TaskManager<S, C>) -> Result<Outcome> {
        match self {
            Self::Create(fields) => manager.create(fields).map(Outcome::Created),
            Self::Update(id, raw) => manager.update(id, raw).map(Outcome::Changed),
            Self::Delete(id) => manager.delete(id).map(Outcome::Changed),
            Self::Complete(id) => manager.complete(id).map(Outcome::Changed),
            Self::DeleteAll => manager.delete_all().map(Outcome::Changed),
        }
    }

    const fn name(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Update(..) => "update",
            Self::Delete(_) => "delete",
            Self::Complete(_) => "complete",
            Self::DeleteAll => "delete_all",
        }
    }
}

/// The result of a successful operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A task was created with this id.
    Created(TaskId),
    /// Whether anything changed.
    Changed(bool),
}

impl Outcome {
    /// The created id, if this was a create.
    #[must_use]
    pub const fn created(self) -> Option<TaskId> {
        match self {
            Self::Created(id) => Some(id),
            Self::Changed(_) => None,
        }
    }

    /// Whether anything changed. Creates always change something.
    #[must_use]
    pub const fn changed(self) -> bool {
        match self {
            Self::Created(_) => true,
            Self::Changed(changed) => changed,
        }
    }
}

/// A queued operation and where to send its outcome.
struct Job {
    operation: Operation,
    reply: Sender<Result<Outcome>>,
}

enum Message {
    Run(Job),
    Stop,
}

/// Runs task operations one at a time on a background thread.
#[derive(Debug)]
pub struct TaskWorker {
    sender: Option<Sender<Message>>,
    handle: Option<JoinHandle<()>>,
}

impl TaskWorker {
    /// Start a worker that owns `manager`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the thread cannot be spawned.
    pub fn spawn<S, C>(manager: TaskManager<S, C>) -> Result<Self>
    where
        S: TaskStore + Send + 'static,
        C: Clock + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("task-worker".to_string())
            .spawn(move || drain(&manager, &receiver))?;
        Ok(Self { sender: Some(sender), handle: Some(handle) })
    }

    /// Run an operation and wait for its outcome.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerStopped`] after shutdown, otherwise the
    /// operation's own error.
    pub fn submit(&self, operation: Operation) -> Result<Outcome> {
        let sender = self.sender.as_ref().ok_or(Error::WorkerStopped)?;
        let (reply, outcome) = mpsc::channel();
        sender.send(Message::Run(Job { operation, reply })).map_err(|_| Error::WorkerStopped)?;
        outcome.recv().map_err(|_| Error::WorkerStopped)?
    }

    /// Create a task.
    ///
    /// # Errors
    ///
    /// See [`TaskManager::create`] and [`TaskWorker::submit`].
    pub fn create(&self, fields: NewTask) -> Result<TaskId> {
        self.submit(Operation::Create(fields))?.created().ok_or(Error::WorkerStopped)
    }

    /// Update a task.
    ///
    /// # Errors
    ///
    /// See [`TaskManager::update`] and [`TaskWorker::submit`].
    pub fn update(&self, id: &str, raw: RawTaskUpdate) -> Result<bool> {
        self.submit(Operation::Update(id.to_string(), raw)).map(Outcome::changed)
    }

    /// Delete a task.
    ///
    /// # Errors
    ///
    /// See [`TaskManager::delete`] and [`TaskWorker::submit`].
    pub fn delete(&self, id: &str) -> Result<bool> {
        self.submit(Operation::Delete(id.to_string())).map(Outcome::changed)
    }

    /// Mark a task completed.
    ///
    /// # Errors
    ///
    /// See [`TaskManager::complete`] and [`TaskWorker::submit`].
    pub fn complete(&self, id: &str) -> Result<bool> {
        self.submit(Operation::Complete(id.to_string())).map(Outcome::changed)
    }

    /// Delete every task.
    ///
    /// # Errors
    ///
    /// See [`TaskManager::delete_all`] and [`TaskWorker::submit`].
    pub fn delete_all(&self) -> Result<bool> {
        self.submit(Operation::DeleteAll).map(Outcome::changed)
    }

    /// Check if the worker still accepts operations.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.sender.is_some()
    }

    /// Stop the worker after already-queued operations finish.
    ///
    /// Calling this more than once is harmless.
    pub fn shutdown(&mut self) {
        if let Some(sender) = self.sender.take() {
            // The thread may already be gone; joining below reports that
            let _ = sender.send(Message::Stop);
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("task worker thread panicked");
            }
        }
    }
}

impl Drop for TaskWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn drain<S: TaskStore, C: Clock>(manager: &TaskManager<S, C>, receiver: &Receiver<Message>) {
    debug!("task worker started");
    while let Ok(Message::Run(job)) = receiver.recv() {
        debug!(operation = job.operation.name(), "running job");
        let outcome = job.operation.run(manager);
        // The submitter only goes away if it panicked; nothing to report to
        let _ = job.reply.send(outcome);
    }
    debug!("task worker stopped");
}
