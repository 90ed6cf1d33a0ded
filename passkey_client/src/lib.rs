//! passkey-client - Client-side WebAuthn/Passkey ceremony driver
//!
//! This crate drives WebAuthn credential ceremonies against a relying-party
//! server: it submits a form, decodes the server-issued options, invokes an
//! authenticator backend, encodes the result and submits it back. The
//! authenticator itself sits behind the [`AuthenticatorBackend`] trait; a
//! software implementation is bundled for demos and tests.

mod authenticator;
mod ceremony;
mod utils;

pub use authenticator::{AuthenticatorBackend, AuthenticatorError, SoftAuthenticator};

pub use ceremony::{
    AuthenticationCeremony, CeremonyError, CeremonyOutcome, ErrorSink, Navigation,
    NavigationError, Navigator, NoopNavigator, RegistrationCeremony, RelyingParty,
    TracingErrorSink, request_assertion_options, request_creation_options, submit_assertion,
    submit_credential,
};

pub use ceremony::{
    Assertion, CreatedCredential, CreationOptions, CreationResponse, CredentialCreationOptions,
    CredentialDescriptor, CredentialRequestOptions, DecodedCredentialDescriptor,
    DecodedUserEntity, EncodedAssertion, EncodedAssertionResponse, EncodedAttestationResponse,
    EncodedCredential, FormFields, PublicKeyCreationOptions, PublicKeyRequestOptions,
    RequestOptions, RequestResponse, UserEntity,
};

pub use utils::{UtilError, base64url_decode, base64url_encode};
