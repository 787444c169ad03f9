//! In-memory quest ledger
//!
//! All state lives behind one mutex: id assignment and every read or write
//! happen under the same lock, so concurrent requests can never observe a
//! half-applied patch or race on the id counter.

use crate::core::error::{LedgerError, Result};
use crate::core::types::{Priority, TaskFilter, TaskId};
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

/// A single quest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub completed: bool,
    pub created_at: NaiveDateTime,
}

impl Task {
    pub fn matches(&self, filter: TaskFilter, today: NaiveDate) -> bool {
        match filter {
            TaskFilter::All => true,
            TaskFilter::Pending => !self.completed,
            TaskFilter::Completed => self.completed,
            TaskFilter::Urgent => self.priority == Priority::High,
            TaskFilter::Today => self.due_date == Some(today),
        }
    }
}

/// Fields for a new quest
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub description: String,
    pub priority: Option<Priority>,
    /// Raw date text; anything that is not `YYYY-MM-DD` is dropped
    pub due_date: Option<String>,
}

impl NewTask {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }
}

/// Partial update; `None` leaves a field untouched
///
/// `due_date` is doubly optional: `Some(None)` clears the date.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<String>>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn complete() -> Self {
        Self {
            completed: Some(true),
            ..Default::default()
        }
    }

    pub fn priority(priority: Priority) -> Self {
        Self {
            priority: Some(priority),
            ..Default::default()
        }
    }

    pub fn due_date(due_date: Option<String>) -> Self {
        Self {
            due_date: Some(due_date),
            ..Default::default()
        }
    }
}

/// Parse a `YYYY-MM-DD` date, returning `None` for anything else
pub fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

#[derive(Debug)]
struct Ledger {
    tasks: Vec<Task>,
    next_id: u64,
}

/// Shared, process-lifetime quest store
#[derive(Debug)]
pub struct TaskStore {
    inner: Mutex<Ledger>,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Ledger {
                tasks: Vec::new(),
                next_id: 1,
            }),
        }
    }

    // Poisoning is recoverable: every mutation validates before it writes.
    fn lock(&self) -> MutexGuard<'_, Ledger> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Quests matching `filter`, in creation order
    pub fn list(&self, filter: TaskFilter, today: NaiveDate) -> Vec<Task> {
        self.lock()
            .tasks
            .iter()
            .filter(|t| t.matches(filter, today))
            .cloned()
            .collect()
    }

    pub fn get(&self, id: TaskId) -> Result<Task> {
        self.lock()
            .tasks
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(LedgerError::TaskNotFound(id))
    }

    pub fn create(&self, new: NewTask) -> Result<Task> {
        let description = new.description.trim();
        if description.is_empty() {
            return Err(LedgerError::Validation("Description is required".into()));
        }

        let mut ledger = self.lock();
        let task = Task {
            id: TaskId(ledger.next_id),
            description: description.to_string(),
            priority: new.priority.unwrap_or_default(),
            due_date: new.due_date.as_deref().and_then(parse_due_date),
            completed: false,
            created_at: Local::now().naive_local(),
        };
        ledger.next_id += 1;
        ledger.tasks.push(task.clone());

        tracing::debug!(id = %task.id, "Quest inscribed");
        Ok(task)
    }

    pub fn update(&self, id: TaskId, patch: TaskPatch) -> Result<Task> {
        let description = match &patch.description {
            Some(d) => {
                let d = d.trim();
                if d.is_empty() {
                    return Err(LedgerError::Validation("Description cannot be empty".into()));
                }
                Some(d.to_string())
            }
            None => None,
        };

        let mut ledger = self.lock();
        let task = ledger
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(LedgerError::TaskNotFound(id))?;

        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(completed) = patch.completed {
            task.completed = completed;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date.as_deref().and_then(parse_due_date);
        }
        if let Some(description) = description {
            task.description = description;
        }

        Ok(task.clone())
    }

    /// Remove a quest permanently; false if the id is unknown
    pub fn delete(&self, id: TaskId) -> bool {
        let mut ledger = self.lock();
        let before = ledger.tasks.len();
        ledger.tasks.retain(|t| t.id != id);
        ledger.tasks.len() != before
    }

    pub fn len(&self) -> usize {
        self.lock().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
