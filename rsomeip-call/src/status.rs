//! Outcome of calls, attribute accesses and broadcast waits.

use crate::ReturnCode;
use rsomeip_deploy::{DeserializeError, SerializeError};

/// Status of a completed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallStatus {
    /// The call completed and its results were decoded.
    Success,
    /// The arguments of the call could not be serialized. Nothing was sent.
    SerializationError,
    /// The remote answered with an error, its reply could not be decoded, or it is gone.
    RemoteError,
    /// No answer or event arrived in time.
    Timeout,
}

impl CallStatus {
    /// Returns the status of the given call result.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rsomeip_call::{CallError, CallStatus};
    ///
    /// assert_eq!(CallStatus::of(&Ok::<u8, CallError>(1)), CallStatus::Success);
    /// assert_eq!(CallStatus::of(&Err::<u8, _>(CallError::Timeout)), CallStatus::Timeout);
    /// ```
    pub fn of<T>(result: &Result<T, CallError>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(error) => error.status(),
        }
    }
}

/// Error returned by a call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    #[error("failed to serialize the payload: {0}")]
    Serialization(#[from] SerializeError),
    #[error("failed to deserialize the reply: {0}")]
    Deserialization(#[from] DeserializeError),
    #[error("remote replied with an error: {0}")]
    Remote(ReturnCode),
    #[error("timed out waiting for the remote")]
    Timeout,
    #[error("remote is no longer available")]
    Closed,
}

impl CallError {
    /// Returns the [`CallStatus`] reported for this error.
    pub fn status(&self) -> CallStatus {
        match self {
            Self::Serialization(_) => CallStatus::SerializationError,
            Self::Deserialization(_) | Self::Remote(_) | Self::Closed => CallStatus::RemoteError,
            Self::Timeout => CallStatus::Timeout,
        }
    }
}
