//! OAuth 1.0a request signing (HMAC-SHA1)
//!
//! Builds the `Authorization` header for a request from the consumer pair,
//! an optional token pair, the method, the URL and any parameters that take
//! part in the signature. JSON and multipart bodies never contribute
//! parameters; query-string parameters always do.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha1::Sha1;

use crate::credentials::Credentials;

type HmacSha1 = Hmac<Sha1>;

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const VERSION: &str = "1.0";
const NONCE_LEN: usize = 32;

/// Signs requests on behalf of one consumer and (optionally) one token
#[derive(Clone)]
pub struct OAuthSigner {
    consumer_key: String,
    consumer_secret: String,
    token: Option<(String, String)>,
}

/// Per-request values that are random or time-dependent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestNonce {
    pub nonce: String,
    pub timestamp: i64,
}

impl RequestNonce {
    /// Fresh random nonce stamped with the current time
    pub fn generate() -> Self {
        let nonce = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(NONCE_LEN)
            .map(char::from)
            .collect();

        Self {
            nonce,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

impl OAuthSigner {
    /// Signer without a token (request-token step of the PIN flow)
    pub fn consumer_only(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            token: None,
        }
    }

    pub fn with_token(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        token: impl Into<String>,
        token_secret: impl Into<String>,
    ) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            token: Some((token.into(), token_secret.into())),
        }
    }

    /// Signer for the account described by `credentials`
    pub fn from_credentials(credentials: &Credentials) -> Self {
        Self::with_token(
            credentials.api_key.clone(),
            credentials.api_secret.clone(),
            credentials.access_token.clone(),
            credentials.access_token_secret.clone(),
        )
    }

    /// `Authorization` header value with a fresh nonce and timestamp
    ///
    /// `extra` holds parameters that take part in the signature: form-encoded
    /// body fields and protocol parameters such as `oauth_callback` or
    /// `oauth_verifier`. Entries whose key starts with `oauth_` are also
    /// emitted in the header.
    pub fn authorization_header(&self, method: &str, url: &str, extra: &[(&str, &str)]) -> String {
        self.authorization_header_with(method, url, extra, &RequestNonce::generate())
    }

    /// Deterministic variant of [`authorization_header`](Self::authorization_header)
    pub fn authorization_header_with(
        &self,
        method: &str,
        url: &str,
        extra: &[(&str, &str)],
        nonce: &RequestNonce,
    ) -> String {
        let mut protocol = self.protocol_params(nonce);
        protocol.extend(
            extra
                .iter()
                .filter(|(k, _)| k.starts_with("oauth_"))
                .map(|(k, v)| (k.to_string(), v.to_string())),
        );

        let signature = self.signature(method, url, extra, nonce);
        protocol.push(("oauth_signature".to_string(), signature));
        protocol.sort();

        let fields: Vec<String> = protocol
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
            .collect();

        format!("OAuth {}", fields.join(", "))
    }

    /// Base64 HMAC-SHA1 signature for the request
    pub fn signature(&self, method: &str, url: &str, extra: &[(&str, &str)], nonce: &RequestNonce) -> String {
        let base = self.signature_base_string(method, url, extra, nonce);

        let token_secret = self.token.as_ref().map(|(_, s)| s.as_str()).unwrap_or("");
        let signing_key = format!(
            "{}&{}",
            percent_encode(&self.consumer_secret),
            percent_encode(token_secret)
        );

        let Ok(mut mac) = HmacSha1::new_from_slice(signing_key.as_bytes()) else {
            unreachable!("HMAC-SHA1 accepts keys of any length");
        };
        mac.update(base.as_bytes());
        BASE64.encode(mac.finalize().into_bytes())
    }

    /// `METHOD&enc(base-url)&enc(normalized-parameters)`
    pub fn signature_base_string(
        &self,
        method: &str,
        url: &str,
        extra: &[(&str, &str)],
        nonce: &RequestNonce,
    ) -> String {
        let (base_url, query) = match url.split_once('?') {
            Some((base, query)) => (base, Some(query)),
            None => (url, None),
        };

        let mut params: Vec<(String, String)> = self
            .protocol_params(nonce)
            .into_iter()
            .map(|(k, v)| (percent_encode(&k), percent_encode(&v)))
            .collect();

        params.extend(
            extra
                .iter()
                .map(|(k, v)| (percent_encode(k), percent_encode(v))),
        );

        if let Some(query) = query {
            params.extend(query.split('&').filter(|pair| !pair.is_empty()).map(|pair| {
                let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
                (
                    percent_encode(&decode_component(k)),
                    percent_encode(&decode_component(v)),
                )
            }));
        }

        params.sort();

        let normalized: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();

        format!(
            "{}&{}&{}",
            method.to_uppercase(),
            percent_encode(base_url),
            percent_encode(&normalized.join("&"))
        )
    }

    fn protocol_params(&self, nonce: &RequestNonce) -> Vec<(String, String)> {
        let mut params = vec![
            ("oauth_consumer_key".to_string(), self.consumer_key.clone()),
            ("oauth_nonce".to_string(), nonce.nonce.clone()),
            ("oauth_signature_method".to_string(), SIGNATURE_METHOD.to_string()),
            ("oauth_timestamp".to_string(), nonce.timestamp.to_string()),
            ("oauth_version".to_string(), VERSION.to_string()),
        ];
        if let Some((token, _)) = &self.token {
            params.push(("oauth_token".to_string(), token.clone()));
        }
        params
    }
}

/// RFC 3986 percent-encoding: everything but `A-Z a-z 0-9 - . _ ~`
pub fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

fn decode_component(value: &str) -> String {
    let value = value.replace('+', " ");
    urlencoding::decode(&value)
        .map(|decoded| decoded.into_owned())
        .unwrap_or(value)
}

/// Parse an `application/x-www-form-urlencoded` body into pairs
pub fn parse_form(body: &str) -> Vec<(String, String)> {
    body.trim()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(k), decode_component(v))
        })
        .collect()
}
