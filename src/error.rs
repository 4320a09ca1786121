/*
 * Error types shared by every layer of the crate. `PlatformError` is what the
 * managed API surfaces to callers; `NativeError` is what a `NativeToolkit`
 * implementation reports and is wrapped transparently when it crosses into the
 * managed layer.
 */
use crate::types::RawHandle;

use thiserror::Error;

/// Failures reported by a native toolkit implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NativeError {
    #[error("native toolkit initialization failed: {0}")]
    InitFailed(String),

    #[error("native toolkit is not initialized")]
    NotInitialized,

    #[error("unknown native handle {0:?}")]
    UnknownHandle(RawHandle),

    #[error("native operation failed: {0}")]
    OperationFailed(String),
}

/// Errors surfaced by the managed control layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// The control or component was already released, or native creation returned null.
    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    /// Native init failed, or an application is already live on this toolkit.
    #[error("Application initialization failed: {0}")]
    ApplicationInitialization(String),

    /// A structural invariant of the control tree would be violated.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Index {index} is out of range for a collection of {len} item(s)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error(transparent)]
    Native(#[from] NativeError),
}

pub type Result<T> = std::result::Result<T, PlatformError>;
pub type NativeResult<T> = std::result::Result<T, NativeError>;
