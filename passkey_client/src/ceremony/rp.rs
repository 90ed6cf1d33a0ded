use std::time::Duration;

use reqwest::StatusCode;
use url::Url;

use super::config::HTTP_TIMEOUT;
use super::errors::CeremonyError;
use super::types::FormFields;

/// Where the browser-equivalent should go after a completion response.
///
/// Normalizes the two forms the relying party uses: an explicit redirect
/// response (3xx + Location) and a synthetic `redirect:<target>` instruction
/// in a 2xx body. Anything else means stay on the current page.
#[derive(Debug, Clone, PartialEq)]
pub enum Navigation {
    Redirect(Url),
    Stay,
}

impl Navigation {
    pub(super) fn from_response(
        base: &Url,
        status: StatusCode,
        location: Option<&str>,
        body: &str,
    ) -> Result<Self, CeremonyError> {
        if status.is_redirection() {
            let target = location.ok_or_else(|| {
                CeremonyError::Decode("Redirect response without Location header".to_string())
            })?;
            let url = base
                .join(target)
                .map_err(|e| CeremonyError::Decode(format!("Invalid redirect target: {e}")))?;
            return Ok(Navigation::Redirect(url));
        }

        if let Some(target) = body.trim().strip_prefix("redirect:") {
            let url = base
                .join(target.trim())
                .map_err(|e| CeremonyError::Decode(format!("Invalid redirect target: {e}")))?;
            return Ok(Navigation::Redirect(url));
        }

        Ok(Navigation::Stay)
    }
}

/// HTTP face of the relying-party server.
///
/// Holds the base URL the ceremony endpoints hang off and a reqwest client
/// configured for ceremony traffic. Redirects are never followed by the
/// client itself; the pipeline observes them and hands them to the
/// [`Navigator`](super::Navigator) collaborator.
pub struct RelyingParty {
    base: Url,
    client: reqwest::Client,
}

impl RelyingParty {
    pub fn new(base: &str) -> Result<Self, CeremonyError> {
        let base = Url::parse(base)
            .map_err(|e| CeremonyError::Config(format!("Invalid base URL {base:?}: {e}")))?;
        Ok(Self {
            base,
            client: build_client(),
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// POSTs form fields as a multipart body and returns the raw response.
    /// Transport failures map to Network errors; status handling is the
    /// caller's.
    pub(super) async fn post_form(
        &self,
        path: &str,
        fields: &FormFields,
    ) -> Result<reqwest::Response, CeremonyError> {
        let url = self
            .base
            .join(path)
            .map_err(|e| CeremonyError::Config(format!("Invalid endpoint path {path:?}: {e}")))?;

        let mut form = reqwest::multipart::Form::new();
        for (name, value) in fields.iter() {
            form = form.text(name.to_string(), value.to_string());
        }

        tracing::debug!("POST {}", url);
        self.client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| CeremonyError::Network(e.to_string()))
    }
}

/// Creates the HTTP client used for ceremony requests:
///
/// - `timeout`: bounds each network stage so a dead server cannot hang the
///   pipeline. The authenticator stage is deliberately not bounded here.
///
/// - `redirect`: disabled, so the completion response's redirect reaches the
///   pipeline instead of being consumed by reqwest.
fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(*HTTP_TIMEOUT))
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(32)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create reqwest client")
}
