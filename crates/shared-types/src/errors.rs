//! # Error Types
//!
//! Status codes exchanged across the service boundary and identity errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The closed set of result codes external callers depend on.
///
/// Numeric values are part of the wire contract and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum StatusCode {
    /// Call completed.
    Success = 0,
    /// Malformed call shape; a caller bug.
    ProgrammerError = -129,
    /// Algorithm or step not supported.
    NotSupported = -134,
    /// Argument rejected.
    InvalidArgument = -135,
    /// Handle does not resolve for this caller and kind.
    BadState = -137,
    /// Output buffer too small.
    BufferTooSmall = -138,
    /// Not enough data, or derivation capacity exhausted.
    InsufficientData = -143,
    /// No free operation slot or backend workspace exhausted.
    InsufficientMemory = -141,
    /// Backend transport failed.
    CommunicationFailure = -145,
    /// Backend hardware failed.
    HardwareFailure = -147,
    /// Digest, MAC or tag did not verify.
    InvalidSignature = -149,
}

impl StatusCode {
    /// Raw code value.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Whether the code reports success.
    pub fn is_success(self) -> bool {
        self == StatusCode::Success
    }
}

impl From<StatusCode> for i32 {
    fn from(status: StatusCode) -> Self {
        status.code()
    }
}

/// Errors resolving the identity of the current caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// No request is being dispatched.
    #[error("No caller is bound to the current request")]
    NoCaller,

    /// The dispatcher reported the reserved partition id.
    #[error("Caller identity {0} is reserved")]
    ReservedIdentity(i32),
}

impl From<IdentityError> for StatusCode {
    fn from(_: IdentityError) -> Self {
        StatusCode::ProgrammerError
    }
}
