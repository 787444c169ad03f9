//! HTTP surface: quest CRUD and chat

pub mod error;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, run, AppState};
