//! Axum-based mock relying party for end-to-end ceremony tests.
//!
//! Serves the four ceremony endpoints on an ephemeral port, records every
//! hit and every submitted form, and can be told to answer an endpoint with
//! an error status to exercise the short-circuit paths.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    Router,
    extract::{Multipart, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::post,
};
use serde_json::json;

/// Base64url of the bytes 0..32; the challenge every mock endpoint issues.
pub const CHALLENGE: &str = "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8";

/// Base64url of [0, 1, 2]; the user handle the mock server assigns.
pub const USER_ID: &str = "AAEC";

#[derive(Clone, Default)]
pub struct ServerState {
    pub register_status: Arc<Mutex<Option<u16>>>,
    pub login_status: Arc<Mutex<Option<u16>>>,
    pub register_hits: Arc<AtomicUsize>,
    pub finish_hits: Arc<AtomicUsize>,
    pub login_hits: Arc<AtomicUsize>,
    pub welcome_hits: Arc<AtomicUsize>,
    pub finish_fields: Arc<Mutex<Option<HashMap<String, String>>>>,
    pub welcome_fields: Arc<Mutex<Option<HashMap<String, String>>>>,
    pub registered_credential_id: Arc<Mutex<Option<String>>>,
}

pub struct MockRelyingParty {
    pub base_url: String,
    pub state: ServerState,
}

impl MockRelyingParty {
    pub async fn spawn() -> Self {
        let state = ServerState::default();
        let app = Router::new()
            .route("/register", post(register))
            .route("/finishauth", post(finishauth))
            .route("/login", post(login))
            .route("/welcome", post(welcome))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock server");
        let addr = listener.local_addr().expect("Failed to read local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock server died");
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn fail_register_with(&self, status: u16) {
        *self.state.register_status.lock().unwrap() = Some(status);
    }

    pub fn fail_login_with(&self, status: u16) {
        *self.state.login_status.lock().unwrap() = Some(status);
    }

    pub fn finish_fields(&self) -> HashMap<String, String> {
        self.state
            .finish_fields
            .lock()
            .unwrap()
            .clone()
            .expect("finishauth was never called")
    }

    pub fn welcome_fields(&self) -> HashMap<String, String> {
        self.state
            .welcome_fields
            .lock()
            .unwrap()
            .clone()
            .expect("welcome was never called")
    }
}

async fn collect_fields(mut multipart: Multipart) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    while let Some(field) = multipart.next_field().await.expect("Bad multipart body") {
        let name = field.name().unwrap_or_default().to_string();
        let value = field.text().await.expect("Bad multipart field");
        fields.insert(name, value);
    }
    fields
}

async fn register(State(state): State<ServerState>, multipart: Multipart) -> Response {
    state.register_hits.fetch_add(1, Ordering::SeqCst);
    let fields = collect_fields(multipart).await;

    if let Some(status) = *state.register_status.lock().unwrap() {
        let status = StatusCode::from_u16(status).expect("Bad override status");
        return (status, "Username already exists. Choose a new name.").into_response();
    }

    let username = fields.get("username").cloned().unwrap_or_default();
    let display = fields.get("display").cloned().unwrap_or_default();

    Json(json!({
        "publicKey": {
            "rp": {"id": "127.0.0.1", "name": "Mock RP"},
            "challenge": CHALLENGE,
            "user": {"id": USER_ID, "name": username, "displayName": display},
            "pubKeyCredParams": [
                {"type": "public-key", "alg": -7},
                {"type": "public-key", "alg": -257}
            ],
            "excludeCredentials": [],
            "timeout": 60000,
            "attestation": "none",
            "extensions": {"credProps": true}
        }
    }))
    .into_response()
}

async fn finishauth(State(state): State<ServerState>, multipart: Multipart) -> Response {
    state.finish_hits.fetch_add(1, Ordering::SeqCst);
    let fields = collect_fields(multipart).await;

    if let Some(credential) = fields.get("credential") {
        let parsed: serde_json::Value =
            serde_json::from_str(credential).expect("credential field is not JSON");
        if let Some(id) = parsed["id"].as_str() {
            *state.registered_credential_id.lock().unwrap() = Some(id.to_string());
        }
    }
    *state.finish_fields.lock().unwrap() = Some(fields);

    (StatusCode::SEE_OTHER, [(header::LOCATION, "/login")], "").into_response()
}

async fn login(State(state): State<ServerState>, multipart: Multipart) -> Response {
    state.login_hits.fetch_add(1, Ordering::SeqCst);
    let _fields = collect_fields(multipart).await;

    if let Some(status) = *state.login_status.lock().unwrap() {
        let status = StatusCode::from_u16(status).expect("Bad override status");
        return (status, "User does not exist. Please register.").into_response();
    }

    let allow = match state.registered_credential_id.lock().unwrap().clone() {
        Some(id) => json!([{"id": id, "type": "public-key"}]),
        None => json!([]),
    };

    Json(json!({
        "publicKey": {
            "challenge": CHALLENGE,
            "rpId": "127.0.0.1",
            "allowCredentials": allow,
            "timeout": 60000,
            "userVerification": "preferred"
        }
    }))
    .into_response()
}

async fn welcome(State(state): State<ServerState>, multipart: Multipart) -> Response {
    state.welcome_hits.fetch_add(1, Ordering::SeqCst);
    let fields = collect_fields(multipart).await;
    *state.welcome_fields.lock().unwrap() = Some(fields);

    // Synthetic redirect instruction in a 2xx body, the way the original
    // relying party's view layer expressed it
    (StatusCode::OK, "redirect:/hello").into_response()
}
