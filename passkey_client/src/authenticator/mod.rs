mod soft;

pub use soft::SoftAuthenticator;

use async_trait::async_trait;
use thiserror::Error;

use crate::ceremony::{
    Assertion, CreatedCredential, CredentialCreationOptions, CredentialRequestOptions,
};

/// Errors that can occur inside an authenticator backend.
///
/// User cancellation and the absence of a compatible authenticator are
/// ordinary error values here; the ceremony pipeline maps all of them to its
/// Platform failure kind.
#[derive(Debug, Error)]
pub enum AuthenticatorError {
    /// The user (or the backend on their behalf) declined the request
    #[error("Request declined: {0}")]
    Declined(String),

    /// No credential eligible for the request exists on this backend
    #[error("No eligible credential: {0}")]
    NoCredential(String),

    /// A cryptographic operation failed inside the backend
    #[error("Crypto error: {0}")]
    Crypto(String),
}

/// The platform credential capability the ceremonies drive.
///
/// `create` may suspend indefinitely awaiting user interaction; the
/// pipeline imposes no timeout on it. Both methods consume their options
/// exactly once.
#[async_trait]
pub trait AuthenticatorBackend: Send + Sync {
    /// Creates a new credential for the decoded creation options.
    async fn create(
        &self,
        options: CredentialCreationOptions,
    ) -> Result<CreatedCredential, AuthenticatorError>;

    /// Produces an assertion for the decoded request options.
    async fn get(
        &self,
        options: CredentialRequestOptions,
    ) -> Result<Assertion, AuthenticatorError>;
}
