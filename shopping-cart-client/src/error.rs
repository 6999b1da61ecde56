use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("No {resource} found for {id}")]
    NotFound { resource: &'static str, id: String },
    #[error("Upstream answered with status {status}: {data}")]
    UnexpectedStatus { status: u16, data: Value },
    #[error("{0}")]
    DeserializationError(#[from] serde_json::Error),
}
