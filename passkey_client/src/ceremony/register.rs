use super::config::{FINISH_PATH, REGISTER_PATH};
use super::errors::CeremonyError;
use super::hooks::{ErrorSink, Navigator};
use super::rp::{Navigation, RelyingParty};
use super::types::{
    CreatedCredential, CreationResponse, CredentialCreationOptions, EncodedCredential, FormFields,
};
use crate::authenticator::AuthenticatorBackend;

/// Outcome of a driven ceremony.
///
/// `Failed` is produced only after the error has been handed to the
/// [`ErrorSink`]; callers that just want the result can match on it without
/// wiring their own display.
#[derive(Debug)]
pub enum CeremonyOutcome {
    Complete(Navigation),
    Failed(CeremonyError),
}

/// Submits the form to the registration endpoint and decodes the returned
/// creation options (pipeline stages RequestOptions and DecodeOptions).
pub async fn request_creation_options(
    rp: &RelyingParty,
    form: &FormFields,
) -> Result<CredentialCreationOptions, CeremonyError> {
    let response = rp.post_form(REGISTER_PATH.as_str(), form).await?;

    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(CeremonyError::Server {
            status: status.as_u16(),
            message,
        });
    }

    let wire: CreationResponse = response
        .json()
        .await
        .map_err(|e| CeremonyError::Decode(format!("Malformed options body: {e}")))?;

    tracing::debug!("Received creation options");
    wire.decode()
}

/// Encodes the backend result and submits it to the completion endpoint
/// (pipeline stages EncodeCredential and Finish). The credential is appended
/// to a fresh copy of the original form fields.
pub async fn submit_credential(
    rp: &RelyingParty,
    form: &FormFields,
    credential: &CreatedCredential,
) -> Result<Navigation, CeremonyError> {
    let encoded = EncodedCredential::from_created(credential)?;
    let payload = serde_json::to_string(&encoded)
        .map_err(|e| CeremonyError::Encode(format!("Failed to serialize credential: {e}")))?;

    let mut fields = form.clone();
    fields.append("credential", payload);

    let response = rp.post_form(FINISH_PATH.as_str(), &fields).await?;

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

/// One registration ceremony, bound to the form that triggered it.
///
/// The driver is one-shot: [`run`](Self::run) consumes the ceremony, so an
/// in-flight ceremony can never be resubmitted. Starting over requires
/// constructing a new one from freshly captured form fields.
pub struct RegistrationCeremony {
    form: FormFields,
}

impl RegistrationCeremony {
    pub fn new(form: FormFields) -> Self {
        Self { form }
    }

    /// Drives the pipeline to completion.
    ///
    /// Stages run strictly in order; the first failure short-circuits the
    /// rest, reaches `errors` exactly once, and nothing is retried. The
    /// authenticator stage is not bounded by any timeout here; the ceremony
    /// waits as long as the backend does.
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
                tracing::warn!("Registration ceremony failed: {}", err);
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
        let options = request_creation_options(rp, &self.form).await?;

        tracing::debug!("Invoking authenticator backend for credential creation");
        let credential = backend.create(options).await?;

        let navigation = submit_credential(rp, &self.form, &credential).await?;

        navigator
            .follow(&navigation)
            .await
            .map_err(|e| CeremonyError::Network(e.to_string()))?;

        Ok(navigation)
    }
}
