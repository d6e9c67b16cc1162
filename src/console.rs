//! Interactive menu.
//!
//! The console reads answers line by line from any [`BufRead`] and writes
//! prompts and results to any [`Write`], so the whole menu can be driven
//! from a script or a test. Invalid answers re-prompt; failed operations
//! print `Error: <message>` and return to the main menu.

use crate::error::{Error, Result};
use crate::tasks::dates::parse_due_date;
use crate::tasks::filter::{parse_date_range, RawFilters};
use crate::tasks::manager::TaskManager;
use crate::tasks::models::{NewTask, RawTaskUpdate, Task};
use crate::tasks::store::TaskStore;
use crate::tasks::validate::{
    validate_description, validate_priority, validate_status, validate_title,
};
use crate::tasks::worker::{Operation, Outcome, TaskWorker};
use crate::traits::{Clock, SystemClock};
use std::io::{BufRead, ErrorKind, Write};
use tracing::debug;

/// The main menu, one entry per line.
const MENU_ITEMS: [&str; 7] = [
    "1. Add Task",
    "2. List Tasks",
    "3. Update Task",
    "4. Delete Task",
    "5. Mark Task as Completed",
    "6. Delete All Tasks",
    "7. Exit",
];

/// The interactive task console.
pub struct Console<R, W, S, C = SystemClock> {
    input: R,
    output: W,
    manager: TaskManager<S, C>,
    worker: Option<TaskWorker>,
    app_name: String,
}

impl<R: BufRead, W: Write, S: TaskStore, C: Clock> Console<R, W, S, C> {
    /// Create a console that calls `manager` directly.
    pub fn new(input: R, output: W, manager: TaskManager<S, C>, app_name: impl Into<String>) -> Self {
        Self { input, output, manager, worker: None, app_name: app_name.into() }
    }

    /// Route create, update, delete and complete through `worker`.
    ///
    /// Listing and lookups keep using the console's own manager.
    #[must_use]
    pub fn with_worker(mut self, worker: TaskWorker) -> Self {
        self.worker = Some(worker);
        self
    }

    /// Run the menu until the user exits or input ends.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if reading input or writing output fails. Task
    /// errors are printed, not returned.
    pub fn run(&mut self) -> Result<()> {
        loop {
            match self.step() {
                Ok(true) => {}
                Ok(false) => break,
                Err(Error::Io(e)) if e.kind() == ErrorKind::UnexpectedEof => {
                    debug!("input closed");
                    break;
                }
                Err(e @ Error::Io(_)) => return Err(e),
                Err(e) => writeln!(self.output, "Error: {e}")?,
            }
        }
        if let Some(mut worker) = self.worker.take() {
            worker.shutdown();
        }
        Ok(())
    }

    /// Show the menu and handle one choice. Returns false on exit.
    fn step(&mut self) -> Result<bool> {
        writeln!(self.output, "\n{}", self.app_name)?;
        for item in MENU_ITEMS {
            writeln!(self.output, "{item}")?;
        }
        let choice = self.prompt("Select an option (1-7): ")?;
        debug!(choice = %choice, "menu selection");

        match choice.as_str() {
            "1" => self.add_task()?,
            "2" => self.list_tasks()?,
            "3" => self.update_task()?,
            "4" => self.delete_task()?,
            "5" => self.mark_completed()?,
            "6" => self.delete_all_tasks()?,
            "7" => {
                writeln!(self.output, "Goodbye!")?;
                return Ok(false);
            }
            _ => writeln!(self.output, "Invalid option. Please try again.")?,
        }
        Ok(true)
    }

    /// Print `label` and read one trimmed line.
    fn prompt(&mut self, label: &str) -> Result<String> {
        write!(self.output, "{label}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(std::io::Error::from(ErrorKind::UnexpectedEof).into());
        }
        Ok(line.trim().to_string())
    }

    /// Prompt until `check` accepts the answer, printing each rejection.
    fn prompt_valid<T>(&mut self, label: &str, check: impl Fn(&str) -> Result<T>) -> Result<String> {
        loop {
            let answer = self.prompt(label)?;
            match check(&answer) {
                Ok(_) => return Ok(answer),
                Err(e) => writeln!(self.output, "Error: {e}")?,
            }
        }
    }

    /// Prompt until the answer is a due date that is not in the past.
    fn prompt_due_date(&mut self, label: &str) -> Result<String> {
        loop {
            let answer = self.prompt(label)?;
            match parse_due_date(&answer, true, self.manager.clock()) {
                Ok(_) => return Ok(answer),
                Err(e) => writeln!(self.output, "Error: {e}")?,
            }
        }
    }

    fn mutate(&self, operation: Operation) -> Result<Outcome> {
        match &self.worker {
            Some(worker) => worker.submit(operation),
            None => operation.run(&self.manager),
        }
    }

    fn add_task(&mut self) -> Result<()> {
        writeln!(self.output, "\nAdd New Task")?;
        let title = self.prompt_valid("Title: ", validate_title)?;
        let description = self.prompt_valid("Description: ", validate_description)?;
        let due_date = self.prompt_due_date("Due Date (YYYY-MM-DD or YYYY-MM-DD HH:MM): ")?;
        let priority = self.prompt_valid("Priority (Low/Medium/High): ", validate_priority)?;

        let fields = NewTask { title, description, due_date, priority, status: None };
        let id = self.mutate(Operation::Create(fields))?.created().ok_or(Error::WorkerStopped)?;

        writeln!(self.output, "\nTask created successfully!")?;
        match self.manager.get(&id.to_string())? {
            Some(task) => writeln!(self.output, "{task}")?,
            None => writeln!(self.output, "Task ID: {id}")?,
        }
        Ok(())
    }

    fn list_tasks(&mut self) -> Result<()> {
        writeln!(self.output, "\nList Tasks")?;
        writeln!(self.output, "Filter options:")?;
        writeln!(self.output, "1. All tasks")?;
        writeln!(self.output, "2. By priority")?;
        writeln!(self.output, "3. By status")?;
        writeln!(self.output, "4. By due date range")?;

        let mut filters = RawFilters::default();
        match self.prompt("Select filter option (1-4): ")?.as_str() {
            "2" => {
                let priority = self.prompt_valid("Enter priority (Low/Medium/High): ", validate_priority)?;
                filters.priority = Some(priority);
            }
            "3" => {
                let status =
                    self.prompt_valid("Enter status (Pending/In Progress/Completed): ", validate_status)?;
                filters.status = Some(status);
            }
            "4" => {
                let (from, to) = self.prompt_date_range()?;
                filters.due_from = Some(from);
                filters.due_to = Some(to);
            }
            _ => {}
        }

        let tasks = self.manager.list(&filters)?;
        if tasks.is_empty() {
            writeln!(self.output, "\nNo tasks found.")?;
            return Ok(());
        }

        writeln!(self.output, "\nTasks:")?;
        for task in &tasks {
            writeln!(self.output, "\n{task}")?;
        }
        Ok(())
    }

    fn prompt_date_range(&mut self) -> Result<(String, String)> {
        writeln!(self.output, "\nEnter date range (YYYY-MM-DD format)")?;
        writeln!(self.output, "Use * to leave either From or To date blank")?;
        writeln!(self.output, "Example: From: 2024-01-01, To: * (shows all tasks from 2024-01-01 onwards)")?;
        writeln!(self.output, "Example: From: *, To: 2024-12-31 (shows all tasks up to 2024-12-31)")?;

        loop {
            let from = self.prompt("From date: ")?;
            let to = self.prompt("To date: ")?;
            match parse_date_range(&from, &to) {
                Ok(range) => {
                    let day = |d: chrono::NaiveDateTime| d.format("%Y-%m-%d").to_string();
                    let description = match (range.from, range.to) {
                        (Some(f), Some(t)) => format!(" between {} and {}", day(f), day(t)),
                        (Some(f), None) => format!(" from {} onwards", day(f)),
                        (None, Some(t)) => format!(" up to {}", day(t)),
                        (None, None) => String::new(),
                    };
                    writeln!(self.output, "\nSearching for tasks{description}")?;
                    return Ok((from, to));
                }
                Err(e) => {
                    writeln!(self.output, "\nError: {e}")?;
                    writeln!(self.output, "Please enter valid dates in YYYY-MM-DD format or * for wildcard.")?;
                }
            }
        }
    }

    /// Ask how to search, then find one task by id or title.
    ///
    /// Prints why nothing was found and returns `None` in that case.
    fn find_task(&mut self) -> Result<Option<Task>> {
        writeln!(self.output, "Search by:")?;
        writeln!(self.output, "1. Task ID")?;
        writeln!(self.output, "2. Task Title")?;
        let by_id = self.prompt("Select search option (1-2): ")? == "1";

        let mut tasks = if by_id {
            let id = self.prompt("Enter task ID: ")?;
            match self.manager.get(&id) {
                Ok(task) => task.into_iter().collect(),
                Err(Error::InvalidIdFormat(_)) => {
                    writeln!(self.output, "Invalid task ID format")?;
                    return Ok(None);
                }
                Err(e) => return Err(e),
            }
        } else {
            let title = self.prompt("Enter task title: ")?;
            self.manager.find_by_title(&title)?
        };

        match tasks.len() {
            0 => {
                writeln!(self.output, "No task found.")?;
                Ok(None)
            }
            1 => Ok(tasks.pop()),
            count => {
                writeln!(self.output, "\nMultiple tasks found:")?;
                for (i, task) in tasks.iter().enumerate() {
                    writeln!(self.output, "\n{}. Task Details:\n{task}", i + 1)?;
                }
                loop {
                    match self.prompt("\nSelect task number: ")?.parse::<usize>() {
                        Ok(n) if (1..=count).contains(&n) => return Ok(Some(tasks.swap_remove(n - 1))),
                        Ok(_) => writeln!(self.output, "Invalid selection. Please try again.")?,
                        Err(_) => writeln!(self.output, "Please enter a valid number.")?,
                    }
                }
            }
        }
    }

    /// The id text of a task read back from the store.
    fn id_of(task: &Task) -> String {
        task.id().map(|id| id.to_string()).unwrap_or_default()
    }

    fn update_task(&mut self) -> Result<()> {
        writeln!(self.output, "\nUpdate Task")?;
        let Some(task) = self.find_task()? else {
            return Ok(());
        };
        writeln!(self.output, "\nCurrent task details:\n{task}")?;

        writeln!(self.output, "\nUpdate options:")?;
        writeln!(self.output, "1. Title")?;
        writeln!(self.output, "2. Description")?;
        writeln!(self.output, "3. Due Date")?;
        writeln!(self.output, "4. Priority")?;
        writeln!(self.output, "5. Status")?;

        let mut raw = RawTaskUpdate::default();
        match self.prompt("Select field to update (1-5): ")?.as_str() {
            "1" => raw.title = Some(self.prompt_valid("New title: ", validate_title)?),
            "2" => raw.description = Some(self.prompt_valid("New description: ", validate_description)?),
            "3" => raw.due_date = Some(self.prompt_due_date("New due date (YYYY-MM-DD or YYYY-MM-DD HH:MM): ")?),
            "4" => raw.priority = Some(self.prompt_valid("New priority (Low/Medium/High): ", validate_priority)?),
            "5" => {
                raw.status = Some(
                    self.prompt_valid("New status (Pending/In Progress/Completed): ", validate_status)?,
                );
            }
            _ => {
                writeln!(self.output, "Invalid option.")?;
                return Ok(());
            }
        }

        if self.mutate(Operation::Update(Self::id_of(&task), raw))?.changed() {
            writeln!(self.output, "Task updated successfully")?;
        } else {
            writeln!(self.output, "No changes were made to the task")?;
        }
        Ok(())
    }

    fn delete_task(&mut self) -> Result<()> {
        writeln!(self.output, "\nDelete Task")?;
        let Some(task) = self.find_task()? else {
            return Ok(());
        };
        writeln!(self.output, "\nTask to delete:\n{task}")?;

        let confirm = self.prompt("\nAre you sure you want to delete this task? (yes/no): ")?;
        if !confirm.eq_ignore_ascii_case("yes") {
            writeln!(self.output, "Deletion cancelled")?;
            return Ok(());
        }

        if self.mutate(Operation::Delete(Self::id_of(&task)))?.changed() {
            writeln!(self.output, "Task deleted successfully")?;
        } else {
            writeln!(self.output, "Failed to delete task")?;
        }
        Ok(())
    }

    fn mark_completed(&mut self) -> Result<()> {
        writeln!(self.output, "\nMark Task as Completed")?;
        let Some(task) = self.find_task()? else {
            return Ok(());
        };

        if self.mutate(Operation::Complete(Self::id_of(&task)))?.changed() {
            writeln!(self.output, "Task marked as completed")?;
        } else {
            writeln!(self.output, "Task is already completed")?;
        }
        Ok(())
    }

    fn delete_all_tasks(&mut self) -> Result<()> {
        writeln!(self.output, "\nDelete All Tasks")?;
        writeln!(self.output, "WARNING: This action cannot be undone!")?;
        writeln!(self.output, "All tasks will be permanently deleted.")?;

        let confirm = self.prompt("\nAre you sure you want to delete ALL tasks? (yes/no): ")?;
        if !confirm.eq_ignore_ascii_case("yes") {
            writeln!(self.output, "Operation cancelled")?;
            return Ok(());
        }

        if self.mutate(Operation::DeleteAll)?.changed() {
            writeln!(self.output, "All tasks have been deleted successfully")?;
        } else {
            writeln!(self.output, "No tasks were found to delete")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::filter::TaskQuery;
    use crate::tasks::models::{Priority, Status};
    use crate::tasks::store::SqliteTaskStore;
    use crate::testing::MemoryTaskStore;
    use crate::traits::FixedClock;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn clock() -> FixedClock {
        FixedClock(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap().and_hms_opt(12, 0, 0).unwrap())
    }

    /// Run the console over `script` and return everything it printed.
    fn run_script(store: &MemoryTaskStore<FixedClock>, script: &str) -> String {
        let mut out = Vec::new();
        let manager = TaskManager::with_clock(store, clock());
        Console::new(script.as_bytes(), &mut out, manager, "Test Tasks").run().unwrap();
        String::from_utf8(out).unwrap()
    }

    fn seeded_store(titles: &[&str]) -> MemoryTaskStore<FixedClock> {
        let store = MemoryTaskStore::with_clock(clock());
        let manager = TaskManager::with_clock(&store, clock());
        for title in titles {
            manager
                .create(&NewTask {
                    title: (*title).to_string(),
                    description: "seeded".to_string(),
                    due_date: "2024-07-01".to_string(),
                    priority: "Medium".to_string(),
                    status: None,
                })
                .unwrap();
        }
        store
    }

    #[test]
    fn test_menu_and_exit() {
        let store = seeded_store(&[]);
        let out = run_script(&store, "7\n");
        assert!(out.contains("Test Tasks\n1. Add Task\n"));
        assert!(out.contains("7. Exit"));
        assert!(out.ends_with("Goodbye!\n"));
    }

    #[test]
    fn test_end_of_input_exits_quietly() {
        let store = seeded_store(&[]);
        let out = run_script(&store, "");
        assert!(out.contains("Select an option (1-7): "));
        assert!(!out.contains("Error"));
    }

    #[test]
    fn test_invalid_menu_option() {
        let store = seeded_store(&[]);
        let out = run_script(&store, "9\n7\n");
        assert!(out.contains("Invalid option. Please try again."));
    }

    #[test]
    fn test_add_task_reprompts_until_valid() {
        let store = seeded_store(&[]);
        let script = "1\n\nShip report\nQuarterly numbers\nyesterday\n2024-06-14\n2024-07-01 09:30\nurgent\nhigh\n7\n";
        let out = run_script(&store, script);

        assert!(out.contains("Error: Title cannot be empty"));
        assert!(out.contains("Error: Invalid date format 'yesterday'"));
        assert!(out.contains("Error: Due date and time cannot be in the past"));
        assert!(out.contains("Error: Priority must be one of: Low, Medium, High"));
        assert!(out.contains("Task created successfully!"));
        assert!(out.contains("Title: Ship report"));
        assert!(out.contains("Due Date: 2024-07-01 09:30"));
        assert!(out.contains("Priority: High"));

        let records = store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].priority, Priority::High);
    }

    #[test]
    fn test_list_all_and_empty() {
        let store = seeded_store(&[]);
        assert!(run_script(&store, "2\n1\n7\n").contains("No tasks found."));

        let store = seeded_store(&["Alpha", "Beta"]);
        let out = run_script(&store, "2\n1\n7\n");
        assert!(out.contains("Tasks:"));
        assert!(out.contains("Title: Alpha"));
        assert!(out.contains("Title: Beta"));
        assert!(out.contains("Due Date: 2024-07-01\n"));
        assert!(out.contains("Status: Pending"));
    }

    #[test]
    fn test_list_by_status_reprompts() {
        let store = seeded_store(&["Alpha"]);
        let out = run_script(&store, "2\n3\ndone\nin progress\n7\n");
        assert!(out.contains("Error: Status must be one of: Pending, In Progress, Completed"));
        assert!(out.contains("No tasks found."));
    }

    #[test]
    fn test_list_by_date_range() {
        let store = seeded_store(&["Alpha"]);
        let script = "2\n4\n*\n*\n2024-08-01\n2024-07-01\n2024-07-01\n*\n7\n";
        let out = run_script(&store, script);

        assert!(out.contains("Error: At least one date must be provided"));
        assert!(out.contains("Error: Invalid date range: from (2024-08-01) cannot be after to (2024-07-01)"));
        assert!(out.contains("Searching for tasks from 2024-07-01 onwards"));
        assert!(out.contains("Title: Alpha"));
    }

    #[test]
    fn test_update_by_title() {
        let store = seeded_store(&["Alpha"]);
        let out = run_script(&store, "3\n2\nalpha\n4\nlow\n7\n");
        assert!(out.contains("Current task details:"));
        assert!(out.contains("Task updated successfully"));
        assert_eq!(store.records()[0].priority, Priority::Low);
    }

    #[test]
    fn test_update_with_same_value_reports_no_change() {
        let store = seeded_store(&["Alpha"]);
        let out = run_script(&store, "3\n2\nAlpha\n4\nmedium\n7\n");
        assert!(out.contains("No changes were made to the task"));
    }

    #[test]
    fn test_update_picks_among_duplicates() {
        let store = seeded_store(&["Same", "same"]);
        let out = run_script(&store, "3\n2\nSAME\nx\n3\n2\n1\nFirst of two\n7\n");

        assert!(out.contains("Multiple tasks found:"));
        assert!(out.contains("Please enter a valid number."));
        assert!(out.contains("Invalid selection. Please try again."));
        assert!(out.contains("Task updated successfully"));

        let titles: Vec<String> = store.records().into_iter().map(|r| r.title).collect();
        assert_eq!(titles, ["Same", "First of two"]);
    }

    #[test]
    fn test_find_by_bad_id() {
        let store = seeded_store(&["Alpha"]);
        let out = run_script(&store, "5\n1\n1234\n7\n");
        assert!(out.contains("Invalid task ID format"));
        assert_eq!(store.records()[0].status, Status::Pending);
    }

    #[test]
    fn test_find_by_unknown_title() {
        let store = seeded_store(&["Alpha"]);
        let out = run_script(&store, "4\n2\nGamma\n7\n");
        assert!(out.contains("No task found."));
    }

    #[test]
    fn test_mark_completed_by_id() {
        let store = seeded_store(&["Alpha"]);
        let id = store.records()[0].id.unwrap();
        let out = run_script(&store, &format!("5\n1\n{id}\n5\n1\n{id}\n7\n"));

        assert!(out.contains("Task marked as completed"));
        assert!(out.contains("Task is already completed"));
        assert_eq!(store.records()[0].status, Status::Completed);
    }

    #[test]
    fn test_delete_requires_yes() {
        let store = seeded_store(&["Alpha"]);
        let out = run_script(&store, "4\n2\nAlpha\nno\n7\n");
        assert!(out.contains("Deletion cancelled"));
        assert_eq!(store.records().len(), 1);

        let out = run_script(&store, "4\n2\nAlpha\nYES\n7\n");
        assert!(out.contains("Task deleted successfully"));
        assert!(store.records().is_empty());
    }

    #[test]
    fn test_delete_all() {
        let store = seeded_store(&[]);
        let out = run_script(&store, "6\nyes\n7\n");
        assert!(out.contains("No tasks were found to delete"));

        let store = seeded_store(&["Alpha", "Beta"]);
        let out = run_script(&store, "6\nnope\n6\nyes\n7\n");
        assert!(out.contains("Operation cancelled"));
        assert!(out.contains("All tasks have been deleted successfully"));
        assert!(store.find(&TaskQuery::default()).unwrap().is_empty());
    }

    #[test]
    fn test_store_failure_prints_error_and_continues() {
        let store = seeded_store(&["Alpha"]);
        store.set_failing(true);
        let out = run_script(&store, "2\n1\n7\n");
        assert!(out.contains("Error: I/O error: store unavailable"));
        assert!(out.ends_with("Goodbye!\n"));
    }

    #[test]
    fn test_console_with_worker() {
        let dir = TempDir::new().unwrap();
        let store = SqliteTaskStore::with_clock(dir.path().join("tasks.db"), clock()).unwrap();
        let worker = TaskWorker::spawn(TaskManager::with_clock(store.clone(), clock())).unwrap();

        let mut out = Vec::new();
        let script = "1\nShip report\nQuarterly numbers\n2024-07-01\nHigh\n5\n2\nship report\n7\n";
        Console::new(script.as_bytes(), &mut out, TaskManager::with_clock(&store, clock()), "Tasks")
            .with_worker(worker)
            .run()
            .unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains("Task created successfully!"));
        assert!(out.contains("Task marked as completed"));
        let found = store.find(&TaskQuery::default()).unwrap();
        assert_eq!(found[0].status, Status::Completed);
    }
}
