//! Command execution - applies resolved chat actions to the quest ledger

use crate::core::error::LedgerError;
use crate::core::types::TaskId;
use crate::llm::parser::ActionIntent;
use crate::store::{NewTask, Task, TaskPatch, TaskStore};
use chrono::NaiveDate;
use serde::Serialize;

/// Executes validated actions against the store
pub struct CommandExecutor;

impl CommandExecutor {
    /// Apply one action; store-side failures land in `error`
    pub fn execute(store: &TaskStore, intent: &ActionIntent, today: NaiveDate) -> ExecutionResult {
        let outcome = match intent {
            ActionIntent::Add {
                description,
                due_date,
                priority,
            } => {
                let new = NewTask {
                    description: description.clone(),
                    priority: *priority,
                    due_date: due_date.clone(),
                };
                store.create(new).map(|task| vec![task])
            }
            ActionIntent::Complete { task_id } => update(store, *task_id, TaskPatch::complete()),
            ActionIntent::Delete { task_id } => {
                if store.delete(*task_id) {
                    Ok(Vec::new())
                } else {
                    Err(LedgerError::TaskNotFound(*task_id))
                }
            }
            ActionIntent::Show { filter } => Ok(store.list(*filter, today)),
            ActionIntent::SetPriority { task_id, priority } => {
                update(store, *task_id, TaskPatch::priority(*priority))
            }
            ActionIntent::SetDueDate { task_id, due_date } => {
                update(store, *task_id, TaskPatch::due_date(Some(due_date.clone())))
            }
        };

        match outcome {
            Ok(tasks) => ExecutionResult {
                action: intent.name(),
                tasks,
                error: None,
            },
            Err(e) => {
                tracing::info!(action = intent.name(), error = %e, "Chat action not applied");
                ExecutionResult {
                    action: intent.name(),
                    tasks: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

fn update(store: &TaskStore, id: TaskId, patch: TaskPatch) -> Result<Vec<Task>, LedgerError> {
    store.update(id, patch).map(|task| vec![task])
}

/// Result of executing an action
///
/// `tasks` holds the created or changed quest, or the listing for `show`.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub action: &'static str,
    pub tasks: Vec<Task>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}
