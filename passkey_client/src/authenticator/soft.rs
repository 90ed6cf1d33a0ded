use std::sync::Mutex;

use ciborium::value::{Integer, Value as CborValue};
use ring::digest;
use ring::rand::{SecureRandom, SystemRandom};
use ring::signature::{ECDSA_P256_SHA256_ASN1_SIGNING, EcdsaKeyPair, KeyPair};

use super::{AuthenticatorBackend, AuthenticatorError};
use crate::ceremony::{
    Assertion, CreatedCredential, CredentialCreationOptions, CredentialRequestOptions,
};
use crate::utils::base64url_encode;

/// Flags byte of the authenticator data, per WebAuthn Level 2
mod flags {
    /// User Present (UP) - Bit 0
    pub(super) const UP: u8 = 1 << 0;
    /// User Verified (UV) - Bit 2
    pub(super) const UV: u8 = 1 << 2;
    /// Attested Credential Data Present (AT) - Bit 6
    pub(super) const AT: u8 = 1 << 6;
}

// Zero AAGUID, as self-asserted authenticators report with "none" attestation
const AAGUID: [u8; 16] = [0u8; 16];

struct StoredCredential {
    id: Vec<u8>,
    pkcs8: Vec<u8>,
    user_handle: Vec<u8>,
    counter: u32,
}

/// In-process software authenticator.
///
/// Generates P-256 credentials with `fmt: "none"` attestation objects and
/// signs assertions with the held keys, so demos and end-to-end tests can
/// drive the full ceremony pipeline without platform hardware. Credentials
/// live only as long as the value does; nothing is persisted.
pub struct SoftAuthenticator {
    origin: String,
    rp_id: String,
    rng: SystemRandom,
    credentials: Mutex<Vec<StoredCredential>>,
}

impl SoftAuthenticator {
    /// Creates an authenticator scoped to `origin`. The RP ID is derived
    /// from the origin the same way relying parties derive it: scheme
    /// stripped, port and path dropped.
    pub fn new(origin: &str) -> Self {
        let rp_id = origin
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .split(|c| c == ':' || c == '/')
            .next()
            .unwrap_or_default()
            .to_string();

        Self {
            origin: origin.trim_end_matches('/').to_string(),
            rp_id,
            rng: SystemRandom::new(),
            credentials: Mutex::new(Vec::new()),
        }
    }

    fn rp_id_hash(&self) -> Vec<u8> {
        digest::digest(&digest::SHA256, self.rp_id.as_bytes())
            .as_ref()
            .to_vec()
    }

    /// Authenticator data for a freshly created credential: rp-id hash,
    /// UP|UV|AT flags, counter, then the attested credential data (AAGUID,
    /// credential id, COSE public key).
    fn attested_data(&self, credential_id: &[u8], cose_key: &[u8]) -> Vec<u8> {
        let mut data = Vec::with_capacity(37 + AAGUID.len() + 2 + credential_id.len() + cose_key.len());
        data.extend_from_slice(&self.rp_id_hash());
        data.push(flags::UP | flags::UV | flags::AT);
        data.extend_from_slice(&0u32.to_be_bytes());
        data.extend_from_slice(&AAGUID);
        data.extend_from_slice(&(credential_id.len() as u16).to_be_bytes());
        data.extend_from_slice(credential_id);
        data.extend_from_slice(cose_key);
        data
    }
}

#[async_trait::async_trait]
impl AuthenticatorBackend for SoftAuthenticator {
    async fn create(
        &self,
        options: CredentialCreationOptions,
    ) -> Result<CreatedCredential, AuthenticatorError> {
        let pk = &options.public_key;

        {
            let credentials = self.credentials.lock().expect("credential store poisoned");
            let excluded = pk
                .exclude_credentials
                .iter()
                .any(|d| credentials.iter().any(|c| c.id == d.id));
            if excluded {
                return Err(AuthenticatorError::Declined(
                    "A credential for this relying party is already registered".to_string(),
                ));
            }
        }

        let mut credential_id = vec![0u8; 32];
        self.rng.fill(&mut credential_id).map_err(|_| {
            AuthenticatorError::Crypto("Failed to generate credential id".to_string())
        })?;

        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &self.rng)
            .map_err(|_| AuthenticatorError::Crypto("Failed to generate key pair".to_string()))?;
        let key_pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, pkcs8.as_ref(), &self.rng)
                .map_err(|_| AuthenticatorError::Crypto("Failed to load key pair".to_string()))?;

        let cose_key = cose_ec2_key(key_pair.public_key().as_ref())?;
        let auth_data = self.attested_data(&credential_id, &cose_key);
        let attestation_object = none_attestation_object(auth_data)?;
        let client_data_json = client_data_json("webauthn.create", &pk.challenge, &self.origin);

        self.credentials
            .lock()
            .expect("credential store poisoned")
            .push(StoredCredential {
                id: credential_id.clone(),
                pkcs8: pkcs8.as_ref().to_vec(),
                user_handle: pk.user.id.clone(),
                counter: 0,
            });

        tracing::debug!("Created software credential for rp_id {}", self.rp_id);

        Ok(CreatedCredential {
            type_: "public-key".to_string(),
            id: credential_id,
            attestation_object,
            client_data_json,
            transports: Some(vec!["internal".to_string()]),
            client_extension_results: serde_json::json!({}),
        })
    }

    async fn get(
        &self,
        options: CredentialRequestOptions,
    ) -> Result<Assertion, AuthenticatorError> {
        let pk = &options.public_key;
        let mut credentials = self.credentials.lock().expect("credential store poisoned");

        let stored = if pk.allow_credentials.is_empty() {
            // Discoverable-credential request: use the most recent one
            credentials.last_mut()
        } else {
            credentials
                .iter_mut()
                .find(|c| pk.allow_credentials.iter().any(|d| d.id == c.id))
        }
        .ok_or_else(|| {
            AuthenticatorError::NoCredential(
                "No stored credential matches allowCredentials".to_string(),
            )
        })?;

        stored.counter += 1;

        let mut authenticator_data = Vec::with_capacity(37);
        authenticator_data.extend_from_slice(&self.rp_id_hash());
        authenticator_data.push(flags::UP | flags::UV);
        authenticator_data.extend_from_slice(&stored.counter.to_be_bytes());

        let client_data = client_data_json("webauthn.get", &pk.challenge, &self.origin);

        let key_pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &stored.pkcs8, &self.rng)
                .map_err(|_| AuthenticatorError::Crypto("Failed to load key pair".to_string()))?;

        // Signature covers authenticatorData || SHA-256(clientDataJSON)
        let mut message = authenticator_data.clone();
        message.extend_from_slice(digest::digest(&digest::SHA256, &client_data).as_ref());
        let signature = key_pair
            .sign(&self.rng, &message)
            .map_err(|_| AuthenticatorError::Crypto("Signing failed".to_string()))?;

        let user_handle =
            (!stored.user_handle.is_empty()).then(|| stored.user_handle.clone());

        Ok(Assertion {
            type_: "public-key".to_string(),
            id: stored.id.clone(),
            authenticator_data,
            client_data_json: client_data,
            signature: signature.as_ref().to_vec(),
            user_handle,
            client_extension_results: serde_json::json!({}),
        })
    }
}

/// COSE EC2 key (kty EC2, alg ES256, crv P-256) from an uncompressed SEC1
/// point.
fn cose_ec2_key(public_key: &[u8]) -> Result<Vec<u8>, AuthenticatorError> {
    if public_key.len() != 65 || public_key[0] != 0x04 {
        return Err(AuthenticatorError::Crypto(
            "Unexpected public key encoding".to_string(),
        ));
    }

    let map = CborValue::Map(vec![
        (
            CborValue::Integer(Integer::from(1)),
            CborValue::Integer(Integer::from(2)),
        ),
        (
            CborValue::Integer(Integer::from(3)),
            CborValue::Integer(Integer::from(-7)),
        ),
        (
            CborValue::Integer(Integer::from(-1)),
            CborValue::Integer(Integer::from(1)),
        ),
        (
            CborValue::Integer(Integer::from(-2)),
            CborValue::Bytes(public_key[1..33].to_vec()),
        ),
        (
            CborValue::Integer(Integer::from(-3)),
            CborValue::Bytes(public_key[33..65].to_vec()),
        ),
    ]);

    let mut out = Vec::new();
    ciborium::ser::into_writer(&map, &mut out)
        .map_err(|e| AuthenticatorError::Crypto(format!("Failed to encode COSE key: {e}")))?;
    Ok(out)
}

fn none_attestation_object(auth_data: Vec<u8>) -> Result<Vec<u8>, AuthenticatorError> {
    let object = CborValue::Map(vec![
        (
            CborValue::Text("fmt".to_string()),
            CborValue::Text("none".to_string()),
        ),
        (CborValue::Text("attStmt".to_string()), CborValue::Map(Vec::new())),
        (
            CborValue::Text("authData".to_string()),
            CborValue::Bytes(auth_data),
        ),
    ]);

    let mut out = Vec::new();
    ciborium::ser::into_writer(&object, &mut out).map_err(|e| {
        AuthenticatorError::Crypto(format!("Failed to encode attestation object: {e}"))
    })?;
    Ok(out)
}

fn client_data_json(type_: &str, challenge: &[u8], origin: &str) -> Vec<u8> {
    serde_json::json!({
        "type": type_,
        "challenge": base64url_encode(challenge),
        "origin": origin,
        "crossOrigin": false,
    })
    .to_string()
    .into_bytes()
}
