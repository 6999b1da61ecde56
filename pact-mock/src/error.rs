use crate::{contract::ContractDifference, tracker::VerificationFailure};
use hyper::http;
use std::{io, path::PathBuf, sync};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    VerificationFailed(VerificationFailure),
    #[error("The mock provider session has been finalized")]
    SessionClosed,
    #[error("The mock provider is already listening")]
    AlreadyListening,
    #[error("The mock provider is not listening, call setup() first")]
    NotListening,
    #[error("The contract can only be written after a successful verification")]
    NotVerified,
    #[error("The contract at {} has changed: {difference}", .path.display())]
    ContractChanged {
        path: PathBuf,
        difference: ContractDifference,
    },
    #[error("Invalid regex matcher /{pattern}/: {reason}")]
    InvalidRegex { pattern: String, reason: String },
    #[error("Invalid contract document: {0}")]
    InvalidContract(String),
    #[error("The lock was poisoned")]
    PoisonedLock,
    #[error("The mock provider server thread panicked")]
    ServerPanicked,
    #[error("IoError: {0}")]
    IoError(#[from] io::Error),
    #[error("Json error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Hyper error: {0}")]
    HyperError(#[from] hyper::Error),
    #[error("Http Error: {0}")]
    HttpError(#[from] http::Error),
    #[error("Invalid header name")]
    InvalidHeaderName,
    #[error("Invalid header value")]
    InvalidHeaderValue,
    #[error("Invalid body")]
    InvalidBody,
}

impl<T> From<sync::PoisonError<T>> for Error {
    fn from(_: sync::PoisonError<T>) -> Self {
        Error::PoisonedLock
    }
}

impl From<hyper::header::InvalidHeaderName> for Error {
    fn from(_: hyper::header::InvalidHeaderName) -> Self {
        Error::InvalidHeaderName
    }
}

impl From<hyper::header::InvalidHeaderValue> for Error {
    fn from(_: hyper::header::InvalidHeaderValue) -> Self {
        Error::InvalidHeaderValue
    }
}

impl From<VerificationFailure> for Error {
    fn from(failure: VerificationFailure) -> Self {
        Error::VerificationFailed(failure)
    }
}
