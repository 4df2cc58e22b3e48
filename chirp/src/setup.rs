//! `chirp auth`: interactive credential setup
//!
//! The default path runs the PIN flow (only the app's consumer pair is
//! typed in); `--manual` asks for all four values.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use libchirp::auth::PinFlow;
use libchirp::{
    ApiClient, Config, CredentialStore, Credentials, EncryptedFileStore, Identity, PostingService,
    RateLimiter,
};

const DEVELOPER_PORTAL: &str = "https://developer.x.com/";

pub async fn run_auth(config: &Config, manual: bool) -> Result<()> {
    let limiter = Arc::new(RateLimiter::from_config(&config.limits));
    let client = Arc::new(ApiClient::from_config(config, limiter)?);
    let store: Arc<dyn CredentialStore> = Arc::new(EncryptedFileStore::from_config(&config.storage));

    let credentials = if manual {
        prompt_manual()?
    } else {
        pin_flow(&client).await?
    };

    print!("\nTesting credentials...");
    io::stdout().flush()?;

    let identity = verify_and_store(store, client, credentials).await?;
    println!(" Success!");
    if let Some(username) = identity.username {
        println!("✓ Authenticated as @{}", username);
    }
    println!("You're ready to use chirp!");

    Ok(())
}

async fn pin_flow(client: &ApiClient) -> Result<Credentials> {
    println!("\nPIN-based setup");
    println!("You still need your app's API keys from {}", DEVELOPER_PORTAL);
    println!();

    let api_key = prompt_line("API Key (Consumer Key): ")?;
    let api_secret = prompt_secret("API Secret (Consumer Secret): ")?;

    let flow = PinFlow::new(client, api_key, api_secret);
    let request_token = flow
        .request_token()
        .await
        .context("Failed to get request token")?;
    let url = flow.authorize_url(&request_token);

    println!("\nOpening browser to: {}", url);
    println!("1. Click 'Authorize app'");
    println!("2. You'll see a PIN code");
    println!("3. Enter the PIN below");
    println!();

    if let Err(e) = open::that(&url) {
        tracing::debug!("Failed to open browser: {}", e);
        println!("Couldn't open browser. Please visit: {}", url);
    }

    let pin = prompt_line("Enter PIN: ")?;
    let credentials = flow
        .exchange(&request_token, &pin)
        .await
        .context("Failed to get access token")?;

    Ok(credentials)
}

fn prompt_manual() -> Result<Credentials> {
    println!("\nManual API key setup");
    println!();
    println!("Get all four values from {} ('Keys and Tokens')", DEVELOPER_PORTAL);
    println!();

    let api_key = prompt_line("API Key: ")?;
    let api_secret = prompt_secret("API Secret: ")?;
    let access_token = prompt_line("Access Token: ")?;
    let access_token_secret = prompt_secret("Access Token Secret: ")?;

    Ok(Credentials::new(
        api_key,
        api_secret,
        access_token,
        access_token_secret,
    ))
}

/// Save `credentials`, check them against the identity endpoint, then save
/// again with the identity that came back
pub async fn verify_and_store(
    store: Arc<dyn CredentialStore>,
    client: Arc<ApiClient>,
    credentials: Credentials,
) -> Result<Identity> {
    store.save(&credentials)?;

    let service = PostingService::new(Arc::clone(&store), client);
    let identity = service.verify().await.context("Credential test failed")?;

    let mut credentials = credentials;
    if identity.user_id.is_some() {
        credentials.user_id = identity.user_id.clone();
    }
    if identity.username.is_some() {
        credentials.username = identity.username.clone();
    }
    store.save(&credentials)?;

    Ok(identity)
}

fn prompt_line(label: &str) -> Result<String> {
    loop {
        print!("{}", label);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim();

        if !input.is_empty() {
            return Ok(input.to_string());
        }
        println!("Cannot be empty.");
    }
}

fn prompt_secret(label: &str) -> Result<String> {
    loop {
        let input = rpassword::prompt_password(label)?;
        let input = input.trim();

        if !input.is_empty() {
            return Ok(input.to_string());
        }
        println!("Cannot be empty.");
    }
}
