//! Signed request executor
//!
//! Turns a message (and optional image) into OAuth1-signed calls against the
//! media upload and message creation endpoints and classifies every outcome
//! into a [`PostError`].

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::config::{ApiConfig, Config};
use crate::credentials::Credentials;
use crate::error::PostError;
use crate::oauth::OAuthSigner;
use crate::rate_limiter::{CancelSignal, RateLimiter};
use crate::transport::{
    HttpRequest, HttpResponse, Method, RequestBody, ReqwestTransport, Transport, TransportError,
};
use crate::types::{Identity, Media, PostOutcome, PostReceipt};

const MEDIA_FIELD: &str = "media";

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct CreatedMessage {
    #[serde(default)]
    id: String,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct UserData {
    id: Option<String>,
    username: Option<String>,
}

#[derive(Deserialize)]
struct MediaUploadResponse {
    media_id_string: String,
}

/// Executes signed requests for one process
///
/// Cheap to share behind an `Arc`; the rate limiter inside is the single
/// process-wide limiter for message creation.
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    limiter: Arc<RateLimiter>,
    api: ApiConfig,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        limiter: Arc<RateLimiter>,
        api: ApiConfig,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            limiter,
            api,
            timeout,
        }
    }

    /// Client backed by reqwest, configured from `config`
    pub fn from_config(config: &Config, limiter: Arc<RateLimiter>) -> Result<Self, PostError> {
        let timeout = config.limits.request_timeout();
        let transport = ReqwestTransport::new(timeout).map_err(|e| PostError::Network(e.to_string()))?;

        Ok(Self::new(Arc::new(transport), limiter, config.api.clone(), timeout))
    }

    pub fn api(&self) -> &ApiConfig {
        &self.api
    }

    /// Publish one message, uploading `media` first when present
    ///
    /// Order: upload the image, wait for a rate-limit permit, create the
    /// message. A failed upload never reaches the message endpoint.
    pub async fn post_message(
        &self,
        credentials: &Credentials,
        text: &str,
        media: Option<&Media>,
        cancel: &CancelSignal,
    ) -> PostOutcome {
        let signer = OAuthSigner::from_credentials(credentials);

        let media_id = match media {
            Some(media) => Some(self.upload_media(&signer, media).await?),
            None => None,
        };

        self.limiter.acquire(cancel).await?;

        let mut body = json!({ "text": text });
        if let Some(id) = &media_id {
            body["media"] = json!({ "media_ids": [id] });
        }

        tracing::info!(
            "Posting message ({} chars, media: {})",
            text.chars().count(),
            media_id.is_some()
        );

        let request = HttpRequest {
            method: Method::Post,
            url: self.api.messages_url.clone(),
            authorization: signer.authorization_header("POST", &self.api.messages_url, &[]),
            body: RequestBody::Json(body),
        };

        let response = self.send(request).await.map_err(|e| self.classify(e))?;

        if response.status != 201 {
            tracing::warn!("Message endpoint returned {}", response.status);
            return Err(PostError::Api {
                status: response.status,
                body: response.body,
            });
        }

        let receipt = match serde_json::from_str::<DataEnvelope<CreatedMessage>>(&response.body) {
            Ok(envelope) => PostReceipt {
                id: envelope.data.id,
                text: envelope.data.text,
            },
            Err(e) => {
                tracing::debug!("Unrecognised success body: {}", e);
                PostReceipt::default()
            }
        };

        tracing::info!("Message posted (id: {})", receipt.id);
        Ok(receipt)
    }

    /// Upload an image and return its media id
    pub async fn upload_media(&self, signer: &OAuthSigner, media: &Media) -> Result<String, PostError> {
        tracing::debug!("Uploading media ({} bytes)", media.len());

        let request = HttpRequest {
            method: Method::Post,
            url: self.api.media_upload_url.clone(),
            authorization: signer.authorization_header("POST", &self.api.media_upload_url, &[]),
            body: RequestBody::Multipart {
                field: MEDIA_FIELD.to_string(),
                file_name: media.file_name().to_string(),
                mime_type: media.mime_type.clone(),
                bytes: media.bytes.clone(),
            },
        };

        let response = self
            .send(request)
            .await
            .map_err(|e| PostError::MediaUploadFailed(e.to_string()))?;

        if !response.is_success() {
            return Err(PostError::MediaUploadFailed(format!(
                "status {}: {}",
                response.status, response.body
            )));
        }

        let parsed: MediaUploadResponse = serde_json::from_str(&response.body)
            .map_err(|e| PostError::MediaUploadFailed(format!("unexpected response: {}", e)))?;

        tracing::debug!("Media uploaded as {}", parsed.media_id_string);
        Ok(parsed.media_id_string)
    }

    /// Check the credentials against the identity endpoint
    ///
    /// Not rate limited.
    pub async fn verify_credentials(&self, credentials: &Credentials) -> Result<Identity, PostError> {
        let signer = OAuthSigner::from_credentials(credentials);

        let request = HttpRequest {
            method: Method::Get,
            url: self.api.identity_url.clone(),
            authorization: signer.authorization_header("GET", &self.api.identity_url, &[]),
            body: RequestBody::Empty,
        };

        let response = self.send(request).await.map_err(|e| self.classify(e))?;

        if response.status != 200 {
            return Err(PostError::Api {
                status: response.status,
                body: response.body,
            });
        }

        let identity = match serde_json::from_str::<DataEnvelope<UserData>>(&response.body) {
            Ok(envelope) => Identity {
                user_id: envelope.data.id,
                username: envelope.data.username,
            },
            Err(_) => Identity::default(),
        };

        Ok(identity)
    }

    /// Send a request under the client's timeout
    pub(crate) async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        match tokio::time::timeout(self.timeout, self.transport.send(request)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout),
        }
    }

    pub(crate) fn classify(&self, err: TransportError) -> PostError {
        match err {
            TransportError::Timeout => PostError::Timeout(self.timeout.as_secs()),
            other => PostError::Network(other.to_string()),
        }
    }
}
