use thiserror::Error;

use crate::core::types::CtlValueKind;

#[derive(Error, Debug)]
pub enum CtlError {
    #[error("Malformed ctl path: '{0}'")]
    MalformedPath(String),

    #[error("Unknown ctl path: '{0}'")]
    UnknownPath(String),

    #[error("Incomplete ctl path: '{0}' names a namespace, not a leaf")]
    IncompletePath(String),

    #[error("Invalid value {0} (expected 0 or 1)")]
    InvalidValue(i32),

    #[error("Type mismatch: leaf expects {expected:?}, got {actual:?}")]
    TypeMismatch {
        expected: CtlValueKind,
        actual: CtlValueKind,
    },

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("Pool unavailable: {0}")]
    PoolUnavailable(String),

    #[error("Residency probe failed: {0}")]
    ProbeFailure(String),
}

pub type Result<T> = std::result::Result<T, CtlError>;

impl<T> From<std::sync::PoisonError<T>> for CtlError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Lock(err.to_string())
    }
}

impl From<std::io::Error> for CtlError {
    fn from(err: std::io::Error) -> Self {
        Self::PoolUnavailable(err.to_string())
    }
}
