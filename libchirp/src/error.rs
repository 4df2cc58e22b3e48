//! Error types for chirp

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChirpError>;

#[derive(Error, Debug)]
pub enum ChirpError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Post error: {0}")]
    Post(#[from] PostError),
}

impl ChirpError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            ChirpError::Credential(CredentialError::CorruptConfig(_)) => 2,
            ChirpError::Post(post) if post.is_authentication() => 2,
            ChirpError::Post(_) => 1,
            ChirpError::Credential(_) => 1,
            ChirpError::Config(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    WriteError(#[from] toml::ser::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Error, Debug)]
pub enum CredentialError {
    /// Stored ciphertext could not be decoded or failed authentication
    #[error("Credential file is corrupt: {0}")]
    CorruptConfig(String),

    #[error("Invalid encryption key: {0}")]
    InvalidKey(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Failed to parse credential file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize credentials: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Credential storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Classified failure of a submission or identity check.
///
/// Cloneable so it can ride inside UI actions across the event channel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PostError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Media upload failed: {0}")]
    MediaUploadFailed(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Rate limit wait cancelled")]
    RateLimitCancelled,

    #[error("Credential file is corrupt: {0}")]
    CorruptConfig(String),

    #[error("No credentials configured")]
    MissingCredentials,

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(String),
}

impl PostError {
    /// Text shown to the user in the composer's error screen
    pub fn user_message(&self) -> String {
        match self {
            PostError::MissingCredentials => {
                "No credentials found. Run `chirp auth` first.".to_string()
            }
            PostError::CorruptConfig(_) => {
                "Stored credentials could not be decrypted. Run `chirp auth` to set them up again."
                    .to_string()
            }
            other => other.to_string(),
        }
    }

    /// Whether the failure means the stored credentials are unusable
    pub fn is_authentication(&self) -> bool {
        match self {
            PostError::MissingCredentials | PostError::CorruptConfig(_) => true,
            PostError::Api { status, .. } => *status == 401 || *status == 403,
            _ => false,
        }
    }
}

impl From<CredentialError> for PostError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::CorruptConfig(reason) => PostError::CorruptConfig(reason),
            other => PostError::CorruptConfig(other.to_string()),
        }
    }
}
