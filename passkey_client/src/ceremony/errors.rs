use thiserror::Error;

use crate::authenticator::AuthenticatorError;
use crate::utils::UtilError;

/// Errors that can occur while driving a WebAuthn ceremony.
///
/// Each variant corresponds to one way a pipeline stage can fail. A failure
/// at any stage short-circuits the remaining stages; the ceremony drivers
/// funnel the value to the configured [`ErrorSink`](super::ErrorSink)
/// exactly once.
#[derive(Debug, Error)]
pub enum CeremonyError {
    /// The request was rejected in transit or the server was unreachable
    #[error("Network error: {0}")]
    Network(String),

    /// A ceremony endpoint answered with a non-success status
    #[error("Server error: status {status}: {message}")]
    Server { status: u16, message: String },

    /// A server payload could not be decoded (malformed base64url or JSON)
    #[error("Decode error: {0}")]
    Decode(String),

    /// The authenticator backend was absent, refused, or was cancelled
    #[error("Platform error: {0}")]
    Platform(#[from] AuthenticatorError),

    /// The backend result had an unexpected shape (e.g. an empty required
    /// binary field) or could not be serialized for transport
    #[error("Encode error: {0}")]
    Encode(String),

    /// The client was constructed with invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<UtilError> for CeremonyError {
    fn from(err: UtilError) -> Self {
        CeremonyError::Decode(err.to_string())
    }
}
