mod auth;
mod config;
mod errors;
mod hooks;
mod register;
mod rp;
mod types;

pub use auth::{AuthenticationCeremony, request_assertion_options, submit_assertion};
pub use errors::CeremonyError;
pub use hooks::{ErrorSink, NavigationError, Navigator, NoopNavigator, TracingErrorSink};
pub use register::{
    CeremonyOutcome, RegistrationCeremony, request_creation_options, submit_credential,
};
pub use rp::{Navigation, RelyingParty};
pub use types::{
    Assertion, CreatedCredential, CreationOptions, CreationResponse, CredentialCreationOptions,
    CredentialDescriptor, CredentialRequestOptions, DecodedCredentialDescriptor,
    DecodedUserEntity, EncodedAssertion, EncodedAssertionResponse, EncodedAttestationResponse,
    EncodedCredential, FormFields, PublicKeyCreationOptions, PublicKeyRequestOptions,
    RequestOptions, RequestResponse, UserEntity,
};
