use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Quest not found: {0}")]
    TaskNotFound(crate::core::types::TaskId),

    #[error("{0}")]
    Validation(String),

    #[error("Model invocation failed: {0}")]
    ModelInvocation(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Schema violation: {0}")]
    Schema(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
