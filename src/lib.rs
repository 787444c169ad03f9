//! Dungeon Task Master - quest ledger with a natural language chat interface

pub mod api;
pub mod command;
pub mod core;
pub mod llm;
pub mod store;
