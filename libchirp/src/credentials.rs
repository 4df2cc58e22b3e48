//! Credential storage for chirp
//!
//! Credentials are the four OAuth1 values issued for one account plus the
//! identity fields learned from the identity endpoint. They are persisted by a
//! [`CredentialStore`]:
//!
//! - `EncryptedFileStore`: TOML document on disk; the two secret fields are
//!   sealed with XChaCha20-Poly1305 under a locally generated key
//! - `MemoryStore`: in-process store for tests and embedding
//!
//! # Example
//!
//! ```no_run
//! use libchirp::credentials::{CredentialStore, Credentials, EncryptedFileStore};
//!
//! # fn example() -> libchirp::Result<()> {
//! let store = EncryptedFileStore::new(
//!     "/home/me/.config/chirp/credentials.toml".into(),
//!     "/home/me/.config/chirp/credentials.key".into(),
//! );
//!
//! let mut credentials = store.load()?;
//! if !credentials.has_access_token() {
//!     credentials.access_token = "token".to_string();
//!     store.save(&credentials)?;
//! }
//! # Ok(())
//! # }
//! ```

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CredentialError, Result};

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 24;

/// OAuth1 credentials for a single account
///
/// Secret values are wiped from memory when the value is dropped.
#[derive(Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
    pub user_id: Option<String>,
    pub username: Option<String>,
}

impl Credentials {
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        access_token: impl Into<String>,
        access_token_secret: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            access_token: access_token.into(),
            access_token_secret: access_token_secret.into(),
            user_id: None,
            username: None,
        }
    }

    pub fn has_access_token(&self) -> bool {
        !self.access_token.is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn redact(value: &str) -> &'static str {
            if value.is_empty() {
                "<empty>"
            } else {
                "<redacted>"
            }
        }

        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &redact(&self.api_secret))
            .field("access_token", &redact(&self.access_token))
            .field("access_token_secret", &redact(&self.access_token_secret))
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .finish()
    }
}

/// Storage backend for [`Credentials`]
pub trait CredentialStore: Send + Sync {
    /// Load the saved credentials
    ///
    /// Returns an all-empty value when nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// `CredentialError::CorruptConfig` if stored ciphertext cannot be
    /// decrypted; I/O and parse errors otherwise.
    fn load(&self) -> Result<Credentials>;

    /// Replace the saved credentials
    fn save(&self, credentials: &Credentials) -> Result<()>;

    /// Get the backend name
    fn backend_name(&self) -> &str;
}

/// On-disk layout of the credential file
#[derive(Debug, Serialize, Deserialize)]
struct CredentialFile {
    #[serde(default)]
    api_key: String,
    #[serde(default)]
    api_secret: String,
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    access_token_secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    username: Option<String>,
}

impl Drop for CredentialFile {
    fn drop(&mut self) {
        self.api_secret.zeroize();
        self.access_token_secret.zeroize();
    }
}

/// Symmetric key used to seal secret fields
#[derive(Zeroize, ZeroizeOnDrop)]
struct SealingKey([u8; KEY_LEN]);

impl SealingKey {
    fn seal(&self, plaintext: &str) -> std::result::Result<String, CredentialError> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let cipher = XChaCha20Poly1305::new(Key::from_slice(&self.0));
        let ciphertext = cipher
            .encrypt(XNonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|e| CredentialError::Encryption(e.to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(sealed))
    }

    fn open(&self, field: &str, encoded: &str) -> std::result::Result<String, CredentialError> {
        if encoded.is_empty() {
            return Ok(String::new());
        }

        let sealed = BASE64
            .decode(encoded)
            .map_err(|e| CredentialError::CorruptConfig(format!("{}: {}", field, e)))?;
        if sealed.len() < NONCE_LEN {
            return Err(CredentialError::CorruptConfig(format!(
                "{}: ciphertext too short",
                field
            )));
        }

        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let cipher = XChaCha20Poly1305::new(Key::from_slice(&self.0));
        let plaintext = cipher
            .decrypt(XNonce::from_slice(nonce), ciphertext)
            .map_err(|_| CredentialError::CorruptConfig(format!("{}: authentication failed", field)))?;

        String::from_utf8(plaintext)
            .map_err(|_| CredentialError::CorruptConfig(format!("{}: invalid UTF-8", field)))
    }
}

/// Encrypted file credential storage
///
/// Plaintext fields (api key, access token, user id, username) are written
/// as-is; `api_secret` and `access_token_secret` are stored as
/// base64(nonce || ciphertext). The key file is generated on first use.
pub struct EncryptedFileStore {
    credentials_path: PathBuf,
    key_path: PathBuf,
}

impl EncryptedFileStore {
    pub fn new(credentials_path: PathBuf, key_path: PathBuf) -> Self {
        Self {
            credentials_path,
            key_path,
        }
    }

    /// Build the store from the `[storage]` section of the configuration
    pub fn from_config(config: &crate::config::StorageConfig) -> Self {
        Self::new(config.credentials_path(), config.key_path())
    }

    pub fn credentials_path(&self) -> &Path {
        &self.credentials_path
    }

    /// Read the existing key file
    fn read_key(&self) -> std::result::Result<SealingKey, CredentialError> {
        let mut bytes = std::fs::read(&self.key_path)?;
        if bytes.len() != KEY_LEN {
            let len = bytes.len();
            bytes.zeroize();
            return Err(CredentialError::InvalidKey(format!(
                "{} holds {} bytes, expected {}",
                self.key_path.display(),
                len,
                KEY_LEN
            )));
        }
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&bytes);
        bytes.zeroize();
        Ok(SealingKey(key))
    }

    /// Read the key file, generating it if there is none yet
    fn read_or_create_key(&self) -> std::result::Result<SealingKey, CredentialError> {
        if self.key_path.exists() {
            return self.read_key();
        }

        let mut key = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut key);
        write_private(&self.key_path, &key)?;
        tracing::info!("Generated credential key at {}", self.key_path.display());
        Ok(SealingKey(key))
    }
}

impl CredentialStore for EncryptedFileStore {
    fn load(&self) -> Result<Credentials> {
        if !self.credentials_path.exists() {
            tracing::debug!(
                "No credential file at {}",
                self.credentials_path.display()
            );
            return Ok(Credentials::default());
        }

        let content =
            std::fs::read_to_string(&self.credentials_path).map_err(CredentialError::Io)?;
        let file: CredentialFile = toml::from_str(&content).map_err(CredentialError::Parse)?;

        let needs_key = !file.api_secret.is_empty() || !file.access_token_secret.is_empty();
        let (api_secret, access_token_secret) = if needs_key {
            if !self.key_path.exists() {
                return Err(CredentialError::CorruptConfig(format!(
                    "secrets are sealed but {} is missing",
                    self.key_path.display()
                ))
                .into());
            }
            let key = self.read_key()?;
            (
                key.open("api_secret", &file.api_secret)?,
                key.open("access_token_secret", &file.access_token_secret)?,
            )
        } else {
            (String::new(), String::new())
        };

        Ok(Credentials {
            api_key: file.api_key.clone(),
            api_secret,
            access_token: file.access_token.clone(),
            access_token_secret,
            user_id: file.user_id.clone(),
            username: file.username.clone(),
        })
    }

    fn save(&self, credentials: &Credentials) -> Result<()> {
        let key = self.read_or_create_key()?;

        let file = CredentialFile {
            api_key: credentials.api_key.clone(),
            api_secret: key.seal(&credentials.api_secret)?,
            access_token: credentials.access_token.clone(),
            access_token_secret: key.seal(&credentials.access_token_secret)?,
            user_id: credentials.user_id.clone(),
            username: credentials.username.clone(),
        };

        let content = toml::to_string_pretty(&file).map_err(CredentialError::Serialize)?;
        write_private(&self.credentials_path, content.as_bytes())?;
        tracing::debug!(
            "Saved credentials to {}",
            self.credentials_path.display()
        );
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "encrypted_file"
    }
}

/// Write `bytes` to `path` readable only by the owner
fn write_private(path: &Path, bytes: &[u8]) -> std::result::Result<(), CredentialError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(())
}

/// In-memory credential storage
#[derive(Default)]
pub struct MemoryStore {
    credentials: Mutex<Credentials>,
}

impl MemoryStore {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials: Mutex::new(credentials),
        }
    }
}

impl CredentialStore for MemoryStore {
    fn load(&self) -> Result<Credentials> {
        let guard = self
            .credentials
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(guard.clone())
    }

    fn save(&self, credentials: &Credentials) -> Result<()> {
        let mut guard = self
            .credentials
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = credentials.clone();
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}
