pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{LedgerError, Result};
pub use types::{Priority, TaskFilter, TaskId};
