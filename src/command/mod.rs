//! Chat command pipeline
//!
//! Converts a chat message into a validated action and applies it:
//! message -> ChatResolver -> ChatResponse -> CommandExecutor -> ExecutionResult

pub mod executor;
pub mod resolver;

pub use executor::{CommandExecutor, ExecutionResult};
pub use resolver::ChatResolver;
