//! # Domain Errors
//!
//! Error types for the operation pool, the protocol skeleton and backends.
//!
//! Every error maps onto exactly one boundary [`StatusCode`].

use shared_types::{IdentityError, StatusCode};
use thiserror::Error;

/// Failures reported by a crypto backend or a derivation delegate.
///
/// Passed through to the caller unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Algorithm or step not implemented.
    #[error("Not supported")]
    NotSupported,

    /// Argument rejected by the backend.
    #[error("Invalid argument")]
    InvalidArgument,

    /// Digest, MAC or tag mismatch.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Step issued out of order within a live operation.
    #[error("Bad state")]
    BadState,

    /// Caller-provided output buffer too small.
    #[error("Buffer too small")]
    BufferTooSmall,

    /// Not enough data, or derivation capacity exhausted.
    #[error("Insufficient data")]
    InsufficientData,

    /// Backend workspace exhausted.
    #[error("Insufficient memory")]
    InsufficientMemory,

    /// Hardware accelerator failure.
    #[error("Hardware failure")]
    HardwareFailure,

    /// Backend transport failure.
    #[error("Communication failure")]
    CommunicationFailure,
}

impl From<BackendError> for StatusCode {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotSupported => StatusCode::NotSupported,
            BackendError::InvalidArgument => StatusCode::InvalidArgument,
            BackendError::InvalidSignature => StatusCode::InvalidSignature,
            BackendError::BadState => StatusCode::BadState,
            BackendError::BufferTooSmall => StatusCode::BufferTooSmall,
            BackendError::InsufficientData => StatusCode::InsufficientData,
            BackendError::InsufficientMemory => StatusCode::InsufficientMemory,
            BackendError::HardwareFailure => StatusCode::HardwareFailure,
            BackendError::CommunicationFailure => StatusCode::CommunicationFailure,
        }
    }
}

/// Crypto operation service errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoServiceError {
    /// Malformed call shape.
    #[error("Programmer error: {0}")]
    ProgrammerError(String),

    /// Handle does not resolve for this caller and kind.
    ///
    /// Deliberately carries no detail: a caller probing foreign handles
    /// learns nothing about the slot.
    #[error("Bad state")]
    BadState,

    /// Every slot is in use.
    #[error("Operation pool exhausted: {capacity} slots in use")]
    PoolExhausted {
        /// Pool capacity.
        capacity: usize,
    },

    /// Argument rejected before reaching the backend.
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Backend failure, passed through.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

impl CryptoServiceError {
    /// Boundary status code for this error.
    pub fn status(&self) -> StatusCode {
        StatusCode::from(self)
    }
}

impl From<&CryptoServiceError> for StatusCode {
    fn from(err: &CryptoServiceError) -> Self {
        match err {
            CryptoServiceError::ProgrammerError(_) => StatusCode::ProgrammerError,
            CryptoServiceError::BadState => StatusCode::BadState,
            CryptoServiceError::PoolExhausted { .. } => StatusCode::InsufficientMemory,
            CryptoServiceError::InvalidArgument(_) => StatusCode::InvalidArgument,
            CryptoServiceError::Backend(err) => (*err).into(),
        }
    }
}

impl From<CryptoServiceError> for StatusCode {
    fn from(err: CryptoServiceError) -> Self {
        StatusCode::from(&err)
    }
}

impl From<IdentityError> for CryptoServiceError {
    fn from(err: IdentityError) -> Self {
        CryptoServiceError::ProgrammerError(err.to_string())
    }
}

/// Collapses a call result into the boundary status code.
pub fn status_of<T>(result: &Result<T, CryptoServiceError>) -> StatusCode {
    match result {
        Ok(_) => StatusCode::Success,
        Err(err) => err.status(),
    }
}
