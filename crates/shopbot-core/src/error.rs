//! Error taxonomy shared by every crate in the workspace

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::traits::llm::LLMError;

/// Classification attached to a failed function call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnknownFunction,
    InvalidArguments,
    BusinessLogic,
    StorageUnavailable,
    ModelUnavailable,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnknownFunction => "unknown_function",
            ErrorKind::InvalidArguments => "invalid_arguments",
            ErrorKind::BusinessLogic => "business_logic",
            ErrorKind::StorageUnavailable => "storage_unavailable",
            ErrorKind::ModelUnavailable => "model_unavailable",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure while resolving, validating or running a business function.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FunctionError {
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Invalid argument '{parameter}': {reason}")]
    InvalidArguments { parameter: String, reason: String },

    #[error("{0}")]
    BusinessLogic(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl FunctionError {
    pub fn invalid(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        FunctionError::InvalidArguments {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    pub fn business(message: impl Into<String>) -> Self {
        FunctionError::BusinessLogic(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FunctionError::UnknownFunction(_) => ErrorKind::UnknownFunction,
            FunctionError::InvalidArguments { .. } => ErrorKind::InvalidArguments,
            FunctionError::BusinessLogic(_) => ErrorKind::BusinessLogic,
            FunctionError::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
        }
    }
}

/// Failure of the record store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    #[error("Malformed data in {path}: {message}")]
    Malformed { path: String, message: String },
}

impl StorageError {
    pub fn io(path: impl Into<String>, err: impl std::fmt::Display) -> Self {
        StorageError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub fn malformed(path: impl Into<String>, err: impl std::fmt::Display) -> Self {
        StorageError::Malformed {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

impl From<StorageError> for FunctionError {
    fn from(err: StorageError) -> Self {
        FunctionError::StorageUnavailable(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ShopError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Duplicate function name: {0}")]
    DuplicateName(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error(transparent)]
    Function(#[from] FunctionError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Model(#[from] LLMError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ShopError>;
