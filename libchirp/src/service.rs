//! Posting service facade
//!
//! Ties the credential store to the executor. The composer and any other
//! front end submit through [`PostingService`] and never touch credentials
//! or HTTP directly.

use std::sync::Arc;

use crate::client::ApiClient;
use crate::credentials::{CredentialStore, Credentials};
use crate::error::{ChirpError, PostError};
use crate::rate_limiter::CancelSignal;
use crate::types::{validate_message, Identity, Media, PostOutcome};

#[derive(Clone)]
pub struct PostingService {
    store: Arc<dyn CredentialStore>,
    client: Arc<ApiClient>,
}

impl PostingService {
    pub fn new(store: Arc<dyn CredentialStore>, client: Arc<ApiClient>) -> Self {
        Self { store, client }
    }

    /// Validate and publish one message
    pub async fn submit(&self, text: &str, media: Option<Media>, cancel: &CancelSignal) -> PostOutcome {
        validate_message(text)?;
        let credentials = self.credentials()?;

        self.client
            .post_message(&credentials, text, media.as_ref(), cancel)
            .await
    }

    /// Check the stored credentials against the identity endpoint
    pub async fn verify(&self) -> Result<Identity, PostError> {
        let credentials = self.credentials()?;
        self.client.verify_credentials(&credentials).await
    }

    fn credentials(&self) -> Result<Credentials, PostError> {
        let credentials = self.store.load().map_err(|e| match e {
            ChirpError::Credential(err) => PostError::from(err),
            ChirpError::Post(err) => err,
            other => PostError::CorruptConfig(other.to_string()),
        })?;

        if !credentials.has_access_token() {
            tracing::debug!("No access token in {} store", self.store.backend_name());
            return Err(PostError::MissingCredentials);
        }

        Ok(credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::credentials::MemoryStore;
    use crate::rate_limiter::RateLimiter;
    use crate::transport::mock::MockTransport;
    use std::time::Duration;

    fn service(mock: &MockTransport, credentials: Credentials) -> PostingService {
        let client = ApiClient::new(
            Arc::new(mock.clone()),
            Arc::new(RateLimiter::unlimited()),
            ApiConfig::default(),
            Duration::from_secs(30),
        );
        PostingService::new(Arc::new(MemoryStore::new(credentials)), Arc::new(client))
    }

    #[tokio::test]
    async fn test_missing_credentials_short_circuit() {
        let mock = MockTransport::new();
        let service = service(&mock, Credentials::default());

        let err = service.submit("hello", None, &CancelSignal::never()).await.unwrap_err();
        assert_eq!(err, PostError::MissingCredentials);
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_text_never_sent() {
        let mock = MockTransport::new();
        let service = service(&mock, Credentials::new("ck", "cs", "at", "ats"));

        let err = service.submit("", None, &CancelSignal::never()).await.unwrap_err();
        assert!(matches!(err, PostError::Validation(_)));

        let too_long = "x".repeat(281);
        let err = service.submit(&too_long, None, &CancelSignal::never()).await.unwrap_err();
        assert!(matches!(err, PostError::Validation(_)));

        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_verify_uses_stored_credentials() {
        let mock = MockTransport::new();
        let api = ApiConfig::default();
        mock.respond(&api.identity_url, 200, r#"{"data":{"id":"9","username":"bird"}}"#);
        let service = service(&mock, Credentials::new("ck", "cs", "at", "ats"));

        let identity = service.verify().await.unwrap();
        assert_eq!(identity.username.as_deref(), Some("bird"));
        assert_eq!(identity.user_id.as_deref(), Some("9"));
    }
}
