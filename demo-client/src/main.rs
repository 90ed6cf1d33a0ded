use async_trait::async_trait;
use tracing_subscriber::EnvFilter;

use passkey_client::{
    AuthenticationCeremony, CeremonyOutcome, Navigation, NavigationError, Navigator,
    FormFields, RegistrationCeremony, RelyingParty, SoftAuthenticator, TracingErrorSink,
};

/// Navigator that behaves like a browser: fetches the redirect target and
/// reports where it landed.
struct FetchNavigator {
    client: reqwest::Client,
}

#[async_trait]
impl Navigator for FetchNavigator {
    async fn follow(&self, navigation: &Navigation) -> Result<(), NavigationError> {
        match navigation {
            Navigation::Redirect(url) => {
                let response = self
                    .client
                    .get(url.clone())
                    .send()
                    .await
                    .map_err(|e| NavigationError(e.to_string()))?;
                println!("Followed redirect to {} ({})", url, response.status());
                Ok(())
            }
            Navigation::Stay => {
                println!("No redirect requested; staying put");
                Ok(())
            }
        }
    }
}

fn usage() -> ! {
    eprintln!("Usage: demo-client <server-url> <username> <display-name>");
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(server), Some(username), Some(display)) = (args.next(), args.next(), args.next())
    else {
        usage()
    };

    let rp = RelyingParty::new(&server)?;
    let authenticator = SoftAuthenticator::new(server.trim_end_matches('/'));
    let navigator = FetchNavigator {
        client: reqwest::Client::new(),
    };
    let errors = TracingErrorSink;

    let mut form = FormFields::new();
    form.append("username", username.clone());
    form.append("display", display);
    form.append("credname", "demo software credential");

    println!("Registering {username} against {server}");
    match RegistrationCeremony::new(form)
        .run(&rp, &authenticator, &navigator, &errors)
        .await
    {
        CeremonyOutcome::Complete(navigation) => {
            println!("Registration complete: {navigation:?}")
        }
        CeremonyOutcome::Failed(err) => {
            eprintln!("Registration failed: {err}");
            std::process::exit(1);
        }
    }

    let mut login_form = FormFields::new();
    login_form.append("username", username.clone());

    println!("Logging in as {username}");
    match AuthenticationCeremony::new(login_form)
        .run(&rp, &authenticator, &navigator, &errors)
        .await
    {
        CeremonyOutcome::Complete(navigation) => println!("Login complete: {navigation:?}"),
        CeremonyOutcome::Failed(err) => {
            eprintln!("Login failed: {err}");
            std::process::exit(1);
        }
    }

    Ok(())
}
