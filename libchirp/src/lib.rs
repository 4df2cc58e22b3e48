//! libchirp - core library for chirp
//!
//! Signs and sends short messages (with an optional image) on behalf of one
//! account, keeps that account's OAuth1 credentials encrypted at rest and
//! spaces message creation with a shared token-bucket limiter.

pub mod auth;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod oauth;
pub mod rate_limiter;
pub mod service;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use client::ApiClient;
pub use config::Config;
pub use credentials::{CredentialStore, Credentials, EncryptedFileStore, MemoryStore};
pub use error::{ChirpError, PostError, Result};
pub use rate_limiter::{cancellation, CancelSignal, CancelTrigger, RateLimiter};
pub use service::PostingService;
pub use types::{Identity, Media, PostOutcome, PostReceipt, MAX_MESSAGE_CHARS};
