use std::{env, sync::LazyLock};

fn path_from_env(var: &str, default: &str) -> String {
    match env::var(var).ok() {
        None => default.to_string(),
        Some(v) if v.starts_with('/') => v,
        Some(invalid) => {
            tracing::warn!(
                "Invalid {}: {}. Paths must start with '/'. Using default '{}'",
                var,
                invalid,
                default
            );
            default.to_string()
        }
    }
}

pub(super) static REGISTER_PATH: LazyLock<String> =
    LazyLock::new(|| path_from_env("PASSKEY_CLIENT_REGISTER_PATH", "/register"));

pub(super) static FINISH_PATH: LazyLock<String> =
    LazyLock::new(|| path_from_env("PASSKEY_CLIENT_FINISH_PATH", "/finishauth"));

pub(super) static LOGIN_PATH: LazyLock<String> =
    LazyLock::new(|| path_from_env("PASSKEY_CLIENT_LOGIN_PATH", "/login"));

pub(super) static WELCOME_PATH: LazyLock<String> =
    LazyLock::new(|| path_from_env("PASSKEY_CLIENT_WELCOME_PATH", "/welcome"));

/// HTTP timeout in seconds for requests to the relying party. This bounds
/// the network stages only; the authenticator stage waits as long as the
/// backend does.
pub(super) static HTTP_TIMEOUT: LazyLock<u64> = LazyLock::new(|| {
    env::var("PASSKEY_CLIENT_HTTP_TIMEOUT")
        .map(|v| v.parse::<u64>().unwrap_or(30))
        .unwrap_or(30)
});
