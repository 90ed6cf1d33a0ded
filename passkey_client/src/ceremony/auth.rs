use super::config::{LOGIN_PATH, WELCOME_PATH};
use super::errors::CeremonyError;
use super::hooks::{ErrorSink, Navigator};
use super::register::CeremonyOutcome;
use super::rp::{Navigation, RelyingParty};
use super::types::{
    Assertion, CredentialRequestOptions, EncodedAssertion, FormFields, RequestResponse,
};
use crate::authenticator::AuthenticatorBackend;

/// Submits the form to the login endpoint and decodes the returned
/// assertion-request options.
pub async fn request_assertion_options(
    rp: &RelyingParty,
    form: &FormFields,
) -> Result<CredentialRequestOptions, CeremonyError> {
    let response = rp.post_form(LOGIN_PATH.as_str(), form).await?;

    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(CeremonyError::Server {
            status: status.as_u16(),
            message,
        });
    }

    let wire: RequestResponse = response
        .json()
        .await
        .map_err(|e| CeremonyError::Decode(format!("Malformed options body: {e}")))?;

    tracing::debug!("Received assertion-request options");
    wire.decode()
}

/// Encodes the assertion and submits it to the login completion endpoint.
pub async fn submit_assertion(
    rp: &RelyingParty,
    form: &FormFields,
    assertion: &Assertion,
) -> Result<Navigation, CeremonyError> {
    let encoded = EncodedAssertion::from_assertion(assertion)?;
    let payload = serde_json::to_string(&encoded)
        .map_err(|e| CeremonyError::Encode(format!("Failed to serialize assertion: {e}")))?;

    let mut fields = form.clone();
    fields.append("credential", payload);

    let response = rp.post_form(WELCOME_PATH.as_str(), &fields).await?;

    let status = response.status();
    if !status.is_success() && !status.is_redirection() {
        let message = response.text().await.unwrap_or_default();
        return Err(CeremonyError::Server {
            status: status.as_u16(),
            message,
        });
    }

    let location = response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let body = response.text().await.unwrap_or_default();

    Navigation::from_response(rp.base(), status, location.as_deref(), &body)
}

/// One authentication (login) ceremony, bound to the form that triggered it.
/// One-shot like [`RegistrationCeremony`](super::RegistrationCeremony).
pub struct AuthenticationCeremony {
    form: FormFields,
}

impl AuthenticationCeremony {
    pub fn new(form: FormFields) -> Self {
        Self { form }
    }

    pub async fn run(
        self,
        rp: &RelyingParty,
        backend: &dyn AuthenticatorBackend,
        navigator: &dyn Navigator,
        errors: &dyn ErrorSink,
    ) -> CeremonyOutcome {
        match self.execute(rp, backend, navigator).await {
            Ok(navigation) => CeremonyOutcome::Complete(navigation),
            Err(err) => {
                tracing::warn!("Authentication ceremony failed: {}", err);
                errors.render(&err);
                CeremonyOutcome::Failed(err)
            }
        }
    }

    async fn execute(
        &self,
        rp: &RelyingParty,
        backend: &dyn AuthenticatorBackend,
        navigator: &dyn Navigator,
    ) -> Result<Navigation, CeremonyError> {
        let options = request_assertion_options(rp, &self.form).await?;

        tracing::debug!("Invoking authenticator backend for assertion");
        let assertion = backend.get(options).await?;

        let navigation = submit_assertion(rp, &self.form, &assertion).await?;

        navigator
            .follow(&navigation)
            .await
            .map_err(|e| CeremonyError::Network(e.to_string()))?;

        Ok(navigation)
    }
}
