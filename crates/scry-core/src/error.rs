//! Error types for Scry

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    #[error("Invalid pipeline stage: expected {expected}, found {found}")]
    Stage { expected: String, found: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Scoring worker error: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, Error>;
