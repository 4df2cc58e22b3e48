//! Three-legged OAuth1 PIN flow
//!
//! 1. [`PinFlow::request_token`] obtains a temporary token with `oauth_callback=oob`
//! 2. the user opens [`PinFlow::authorize_url`] and reads back a PIN
//! 3. [`PinFlow::exchange`] trades token and PIN for account credentials

use crate::client::ApiClient;
use crate::credentials::Credentials;
use crate::error::PostError;
use crate::oauth::{parse_form, percent_encode, OAuthSigner};
use crate::transport::{HttpRequest, Method, RequestBody};

/// Temporary token issued by the request-token endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestToken {
    pub token: String,
    pub secret: String,
}

pub struct PinFlow<'a> {
    client: &'a ApiClient,
    consumer_key: String,
    consumer_secret: String,
}

impl<'a> PinFlow<'a> {
    pub fn new(
        client: &'a ApiClient,
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
    ) -> Self {
        Self {
            client,
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
        }
    }

    pub async fn request_token(&self) -> Result<RequestToken, PostError> {
        let url = &self.client.api().request_token_url;
        let signer = OAuthSigner::consumer_only(&self.consumer_key, &self.consumer_secret);

        let request = HttpRequest {
            method: Method::Post,
            url: url.clone(),
            authorization: signer.authorization_header("POST", url, &[("oauth_callback", "oob")]),
            body: RequestBody::Empty,
        };

        let fields = self.form_response(request).await?;
        let token = field(&fields, "oauth_token")?;
        let secret = field(&fields, "oauth_token_secret")?;

        tracing::debug!("Obtained request token");
        Ok(RequestToken { token, secret })
    }

    /// Page where the user approves access and is shown a PIN
    pub fn authorize_url(&self, request_token: &RequestToken) -> String {
        format!(
            "{}?oauth_token={}",
            self.client.api().authorize_url,
            percent_encode(&request_token.token)
        )
    }

    /// Trade the request token and PIN for complete account credentials
    pub async fn exchange(&self, request_token: &RequestToken, pin: &str) -> Result<Credentials, PostError> {
        let url = &self.client.api().access_token_url;
        let signer = OAuthSigner::with_token(
            &self.consumer_key,
            &self.consumer_secret,
            &request_token.token,
            &request_token.secret,
        );
        let pin = pin.trim();

        let request = HttpRequest {
            method: Method::Post,
            url: url.clone(),
            authorization: signer.authorization_header("POST", url, &[("oauth_verifier", pin)]),
            body: RequestBody::Empty,
        };

        let fields = self.form_response(request).await?;

        let mut credentials = Credentials::new(
            self.consumer_key.clone(),
            self.consumer_secret.clone(),
            field(&fields, "oauth_token")?,
            field(&fields, "oauth_token_secret")?,
        );
        credentials.user_id = optional(&fields, "user_id");
        credentials.username = optional(&fields, "screen_name");

        tracing::info!("Access token issued");
        Ok(credentials)
    }

    async fn form_response(&self, request: HttpRequest) -> Result<Vec<(String, String)>, PostError> {
        let response = self
            .client
            .send(request)
            .await
            .map_err(|e| self.client.classify(e))?;

        if response.status != 200 {
            return Err(PostError::Api {
                status: response.status,
                body: response.body,
            });
        }

        Ok(parse_form(&response.body))
    }
}

fn optional(fields: &[(String, String)], name: &str) -> Option<String> {
    fields
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.clone())
        .filter(|v| !v.is_empty())
}

fn field(fields: &[(String, String)], name: &str) -> Result<String, PostError> {
    optional(fields, name).ok_or_else(|| PostError::Api {
        status: 200,
        body: format!("response is missing {}", name),
    })
}
