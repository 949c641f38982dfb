use crate::DocId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("document {0} is not in the index")]
    NotFound(DocId),
    #[error("invalid prior: {0}")]
    InvalidPrior(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("{path}:{line}: {message}")]
    Parse { path: String, line: usize, message: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
