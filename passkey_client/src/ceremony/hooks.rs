use async_trait::async_trait;
use thiserror::Error;

use super::errors::CeremonyError;
use super::rp::Navigation;

/// Error returned by a [`Navigator`] when it cannot perform a navigation.
/// The pipeline treats it like any other network failure.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct NavigationError(pub String);

/// Performs the browser-side navigation the completion response asked for.
///
/// Implementations receive the already-normalized [`Navigation`] value, so
/// they never need to distinguish explicit redirect responses from synthetic
/// in-body instructions.
#[async_trait]
pub trait Navigator: Send + Sync {
    async fn follow(&self, navigation: &Navigation) -> Result<(), NavigationError>;
}

/// Navigator that goes nowhere. Useful for headless callers that only care
/// about the ceremony outcome.
pub struct NoopNavigator;

#[async_trait]
impl Navigator for NoopNavigator {
    async fn follow(&self, _navigation: &Navigation) -> Result<(), NavigationError> {
        Ok(())
    }
}

/// Terminal error display for a failed ceremony.
///
/// Called exactly once per failed ceremony, from the failure path, with
/// whatever error the pipeline stopped on. The signature is infallible so a
/// sink can never abort error handling itself.
pub trait ErrorSink: Send + Sync {
    fn render(&self, error: &CeremonyError);
}

/// ErrorSink that reports through the tracing stack.
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn render(&self, error: &CeremonyError) {
        tracing::error!("Ceremony failed: {}", error);
    }
}
