//! Encrypted credential store integration tests
//!
//! Exercise the on-disk format through the public API: round trips, what
//! actually lands in the file, and how tampering surfaces.

use anyhow::Result;
use libchirp::credentials::{CredentialStore, Credentials, EncryptedFileStore};
use libchirp::error::{ChirpError, CredentialError, PostError};
use libchirp::{ApiClient, MemoryStore, PostingService, RateLimiter};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn store_in(dir: &TempDir) -> EncryptedFileStore {
    EncryptedFileStore::new(
        dir.path().join("credentials.toml"),
        dir.path().join("credentials.key"),
    )
}

fn sample() -> Credentials {
    let mut creds = Credentials::new(
        "consumer-key",
        "consumer-secret",
        "access-token",
        "access-token-secret",
    );
    creds.user_id = Some("12345".to_string());
    creds.username = Some("chirper".to_string());
    creds
}

#[test]
fn test_round_trip_restores_all_fields() -> Result<()> {
    let dir = TempDir::new()?;
    let store = store_in(&dir);

    store.save(&sample())?;
    let loaded = store.load()?;

    assert_eq!(loaded, sample());
    Ok(())
}

#[test]
fn test_secrets_never_written_in_plaintext() -> Result<()> {
    let dir = TempDir::new()?;
    let store = store_in(&dir);
    store.save(&sample())?;

    let content = fs::read_to_string(dir.path().join("credentials.toml"))?;
    assert!(content.contains("consumer-key"));
    assert!(content.contains("access-token"));
    assert!(!content.contains("consumer-secret"));
    assert!(!content.contains("access-token-secret"));
    Ok(())
}

#[test]
fn test_second_store_shares_key_file() -> Result<()> {
    let dir = TempDir::new()?;
    store_in(&dir).save(&sample())?;

    let reopened = store_in(&dir);
    assert_eq!(reopened.load()?, sample());
    Ok(())
}

#[test]
fn test_missing_file_loads_empty_credentials() -> Result<()> {
    let dir = TempDir::new()?;
    let loaded = store_in(&dir).load()?;

    assert_eq!(loaded, Credentials::default());
    assert!(!loaded.has_access_token());
    Ok(())
}

#[test]
fn test_tampered_secret_is_corrupt_config() -> Result<()> {
    let dir = TempDir::new()?;
    let store = store_in(&dir);
    store.save(&sample())?;

    let path = dir.path().join("credentials.toml");
    let mut doc: toml::Table = fs::read_to_string(&path)?.parse()?;
    let sealed = doc["access_token_secret"].as_str().unwrap_or_default().to_string();

    // Flip one character inside the ciphertext
    let mut chars: Vec<char> = sealed.chars().collect();
    let idx = chars.len() / 2;
    chars[idx] = if chars[idx] == 'A' { 'B' } else { 'A' };
    doc.insert(
        "access_token_secret".to_string(),
        toml::Value::String(chars.into_iter().collect()),
    );
    fs::write(&path, toml::to_string(&doc)?)?;

    let err = store.load().unwrap_err();
    assert!(
        matches!(err, ChirpError::Credential(CredentialError::CorruptConfig(_))),
        "unexpected error: {:?}",
        err
    );
    assert_eq!(err.exit_code(), 2);
    Ok(())
}

#[test]
fn test_replaced_key_file_is_corrupt_config() -> Result<()> {
    let dir = TempDir::new()?;
    let store = store_in(&dir);
    store.save(&sample())?;

    fs::write(dir.path().join("credentials.key"), [7u8; 32])?;

    let err = store.load().unwrap_err();
    assert!(matches!(
        err,
        ChirpError::Credential(CredentialError::CorruptConfig(_))
    ));
    Ok(())
}

#[test]
fn test_empty_secrets_round_trip_without_ciphertext() -> Result<()> {
    let dir = TempDir::new()?;
    let store = store_in(&dir);
    let creds = Credentials::new("consumer-key", "consumer-secret", "", "");
    store.save(&creds)?;

    let content = fs::read_to_string(dir.path().join("credentials.toml"))?;
    assert!(content.contains("access_token_secret = \"\""));
    assert_eq!(store.load()?, creds);
    Ok(())
}

#[tokio::test]
async fn test_corrupt_store_surfaces_through_service() -> Result<()> {
    let dir = TempDir::new()?;
    let store = store_in(&dir);
    store.save(&sample())?;
    fs::write(dir.path().join("credentials.key"), [9u8; 32])?;

    let client = ApiClient::new(
        Arc::new(libchirp::transport::mock::MockTransport::new()),
        Arc::new(RateLimiter::unlimited()),
        Default::default(),
        Duration::from_secs(30),
    );
    let service = PostingService::new(Arc::new(store), Arc::new(client));

    let err = service
        .submit("hello", None, &libchirp::CancelSignal::never())
        .await
        .unwrap_err();
    assert!(matches!(err, PostError::CorruptConfig(_)));
    assert!(err.is_authentication());
    Ok(())
}

#[test]
fn test_memory_store_backend_name() {
    let store = MemoryStore::new(sample());
    assert_eq!(store.backend_name(), "memory");
}
