use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::CeremonyError;
use crate::utils::{base64url_decode, base64url_encode};

/// Form fields captured from the user-facing form that starts a ceremony.
///
/// The original fields are sent verbatim to the options endpoint; the
/// completion stage appends the encoded credential to a fresh copy, so the
/// captured fields are never mutated by a running ceremony.
#[derive(Debug, Clone, Default)]
pub struct FormFields {
    fields: Vec<(String, String)>,
}

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

/// Body of a successful options response from the registration endpoint.
///
/// This is the wire form, with every binary field as unpadded base64url
/// text. Fields the client does not know about are preserved in the flatten
/// maps and carried through decoding unchanged, so newer servers can add
/// option fields without breaking older clients.
#[derive(Debug, Clone, Deserialize)]
pub struct CreationResponse {
    #[serde(rename = "publicKey")]
    pub public_key: CreationOptions,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreationOptions {
    pub challenge: String,
    pub user: UserEntity,
    #[serde(default)]
    pub exclude_credentials: Vec<CredentialDescriptor>,
    #[serde(default)]
    pub extensions: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEntity {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of `excludeCredentials` / `allowCredentials` on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialDescriptor {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Decoded creation options, shaped as the authenticator backend consumes
/// them: `{ publicKey: { ... } }` with binary fields as raw bytes.
#[derive(Debug, Clone)]
pub struct CredentialCreationOptions {
    pub public_key: PublicKeyCreationOptions,
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct PublicKeyCreationOptions {
    pub challenge: Vec<u8>,
    pub user: DecodedUserEntity,
    pub exclude_credentials: Vec<DecodedCredentialDescriptor>,
    pub extensions: Option<Value>,
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct DecodedUserEntity {
    pub id: Vec<u8>,
    pub name: String,
    pub display_name: String,
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct DecodedCredentialDescriptor {
    pub id: Vec<u8>,
    pub type_: String,
    pub extra: Map<String, Value>,
}

impl CredentialDescriptor {
    fn decode(self, list: &str) -> Result<DecodedCredentialDescriptor, CeremonyError> {
        let id = base64url_decode(&self.id)
            .map_err(|e| CeremonyError::Decode(format!("Malformed {list} id: {e}")))?;
        Ok(DecodedCredentialDescriptor {
            id,
            type_: self.type_,
            extra: self.extra,
        })
    }
}

impl CreationResponse {
    /// Decodes `challenge`, `user.id` and every `excludeCredentials[].id`
    /// from base64url. `extensions` and all unlisted fields pass through
    /// unchanged.
    pub fn decode(self) -> Result<CredentialCreationOptions, CeremonyError> {
        let pk = self.public_key;

        let challenge = base64url_decode(&pk.challenge)
            .map_err(|e| CeremonyError::Decode(format!("Malformed challenge: {e}")))?;

        let user_id = base64url_decode(&pk.user.id)
            .map_err(|e| CeremonyError::Decode(format!("Malformed user id: {e}")))?;

        let exclude_credentials = pk
            .exclude_credentials
            .into_iter()
            .map(|c| c.decode("excludeCredentials"))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CredentialCreationOptions {
            public_key: PublicKeyCreationOptions {
                challenge,
                user: DecodedUserEntity {
                    id: user_id,
                    name: pk.user.name,
                    display_name: pk.user.display_name,
                    extra: pk.user.extra,
                },
                exclude_credentials,
                extensions: pk.extensions,
                extra: pk.extra,
            },
            extra: self.extra,
        })
    }
}

/// Credential produced by an authenticator backend during registration.
///
/// All binary fields are raw bytes. `transports` is optional because not
/// every backend can enumerate its transports; encoding defaults an absent
/// list to an empty one.
#[derive(Debug, Clone)]
pub struct CreatedCredential {
    pub type_: String,
    pub id: Vec<u8>,
    pub attestation_object: Vec<u8>,
    pub client_data_json: Vec<u8>,
    pub transports: Option<Vec<String>>,
    pub client_extension_results: Value,
}

/// Wire-transport form of [`CreatedCredential`], ready to be serialized
/// into the `credential` form field of the completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedCredential {
    #[serde(rename = "type")]
    pub type_: String,
    pub id: String,
    pub response: EncodedAttestationResponse,
    pub client_extension_results: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedAttestationResponse {
    pub attestation_object: String,
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    pub transports: Vec<String>,
}

impl EncodedCredential {
    /// Builds the wire form of a backend result, base64url-encoding every
    /// binary field. Fails with an Encode error if a required binary field
    /// is empty.
    pub fn from_created(credential: &CreatedCredential) -> Result<Self, CeremonyError> {
        if credential.id.is_empty() {
            return Err(CeremonyError::Encode("Credential id is empty".to_string()));
        }
        if credential.attestation_object.is_empty() {
            return Err(CeremonyError::Encode(
                "Attestation object is empty".to_string(),
            ));
        }
        if credential.client_data_json.is_empty() {
            return Err(CeremonyError::Encode(
                "Client data JSON is empty".to_string(),
            ));
        }

        Ok(Self {
            type_: credential.type_.clone(),
            id: base64url_encode(&credential.id),
            response: EncodedAttestationResponse {
                attestation_object: base64url_encode(&credential.attestation_object),
                client_data_json: base64url_encode(&credential.client_data_json),
                transports: credential.transports.clone().unwrap_or_default(),
            },
            client_extension_results: credential.client_extension_results.clone(),
        })
    }
}

/// Body of a successful options response from the login endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestResponse {
    #[serde(rename = "publicKey")]
    pub public_key: RequestOptions,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions {
    pub challenge: String,
    #[serde(default)]
    pub allow_credentials: Vec<CredentialDescriptor>,
    #[serde(default)]
    pub extensions: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Decoded request options, shaped as the authenticator backend consumes
/// them for an assertion.
#[derive(Debug, Clone)]
pub struct CredentialRequestOptions {
    pub public_key: PublicKeyRequestOptions,
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct PublicKeyRequestOptions {
    pub challenge: Vec<u8>,
    pub allow_credentials: Vec<DecodedCredentialDescriptor>,
    pub extensions: Option<Value>,
    pub extra: Map<String, Value>,
}

impl RequestResponse {
    /// Decodes `challenge` and every `allowCredentials[].id` from base64url.
    pub fn decode(self) -> Result<CredentialRequestOptions, CeremonyError> {
        let pk = self.public_key;

        let challenge = base64url_decode(&pk.challenge)
            .map_err(|e| CeremonyError::Decode(format!("Malformed challenge: {e}")))?;

        let allow_credentials = pk
            .allow_credentials
            .into_iter()
            .map(|c| c.decode("allowCredentials"))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CredentialRequestOptions {
            public_key: PublicKeyRequestOptions {
                challenge,
                allow_credentials,
                extensions: pk.extensions,
                extra: pk.extra,
            },
            extra: self.extra,
        })
    }
}

/// Assertion produced by an authenticator backend during login.
#[derive(Debug, Clone)]
pub struct Assertion {
    pub type_: String,
    pub id: Vec<u8>,
    pub authenticator_data: Vec<u8>,
    pub client_data_json: Vec<u8>,
    pub signature: Vec<u8>,
    pub user_handle: Option<Vec<u8>>,
    pub client_extension_results: Value,
}

/// Wire-transport form of [`Assertion`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedAssertion {
    #[serde(rename = "type")]
    pub type_: String,
    pub id: String,
    pub response: EncodedAssertionResponse,
    pub client_extension_results: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedAssertionResponse {
    pub authenticator_data: String,
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    pub signature: String,
    pub user_handle: Option<String>,
}

impl EncodedAssertion {
    pub fn from_assertion(assertion: &Assertion) -> Result<Self, CeremonyError> {
        if assertion.id.is_empty() {
            return Err(CeremonyError::Encode("Credential id is empty".to_string()));
        }
        if assertion.authenticator_data.is_empty() {
            return Err(CeremonyError::Encode(
                "Authenticator data is empty".to_string(),
            ));
        }
        if assertion.signature.is_empty() {
            return Err(CeremonyError::Encode("Signature is empty".to_string()));
        }
        if assertion.client_data_json.is_empty() {
            return Err(CeremonyError::Encode(
                "Client data JSON is empty".to_string(),
            ));
        }

        Ok(Self {
            type_: assertion.type_.clone(),
            id: base64url_encode(&assertion.id),
            response: EncodedAssertionResponse {
                authenticator_data: base64url_encode(&assertion.authenticator_data),
                client_data_json: base64url_encode(&assertion.client_data_json),
                signature: base64url_encode(&assertion.signature),
                user_handle: assertion.user_handle.as_ref().map(base64url_encode),
            },
            client_extension_results: assertion.client_extension_results.clone(),
        })
    }
}
