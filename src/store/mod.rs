//! Quest storage

pub mod task_store;

pub use task_store::{parse_due_date, NewTask, Task, TaskPatch, TaskStore};
