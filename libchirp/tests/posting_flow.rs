//! End-to-end posting through the service, executor and a scripted transport

use libchirp::config::ApiConfig;
use libchirp::transport::mock::MockTransport;
use libchirp::transport::{Method, RequestBody};
use libchirp::{
    cancellation, ApiClient, CancelSignal, Credentials, Media, MemoryStore, PostError,
    PostReceipt, PostingService, RateLimiter,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

const TIMEOUT: Duration = Duration::from_secs(30);

fn api() -> ApiConfig {
    ApiConfig::default()
}

fn service_with(mock: &MockTransport, limiter: RateLimiter) -> PostingService {
    let client = ApiClient::new(Arc::new(mock.clone()), Arc::new(limiter), api(), TIMEOUT);
    let store = MemoryStore::new(Credentials::new("ck", "cs", "at", "ats"));
    PostingService::new(Arc::new(store), Arc::new(client))
}

fn service(mock: &MockTransport) -> PostingService {
    service_with(mock, RateLimiter::unlimited())
}

fn json_body(body: &RequestBody) -> serde_json::Value {
    match body {
        RequestBody::Json(value) => value.clone(),
        other => panic!("expected JSON body, got {:?}", other),
    }
}

#[tokio::test]
async fn test_text_only_post() {
    let mock = MockTransport::new();
    mock.respond(
        &api().messages_url,
        201,
        r#"{"data":{"id":"1790","text":"Hello 世界"}}"#,
    );

    let receipt = service(&mock)
        .submit("Hello 世界", None, &CancelSignal::never())
        .await
        .unwrap();

    assert_eq!(
        receipt,
        PostReceipt {
            id: "1790".to_string(),
            text: "Hello 世界".to_string()
        }
    );

    let sent = mock.requests_to(&api().messages_url);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].request.method, Method::Post);
    assert_eq!(json_body(&sent[0].request.body), json!({ "text": "Hello 世界" }));
    assert_eq!(mock.call_count(&api().media_upload_url), 0);
}

#[tokio::test]
async fn test_image_is_uploaded_then_referenced() {
    let mock = MockTransport::new();
    mock.respond(&api().media_upload_url, 200, r#"{"media_id":1,"media_id_string":"m-77"}"#);
    mock.respond(&api().messages_url, 201, r#"{"data":{"id":"2","text":"look"}}"#);

    let png = vec![0x89, b'P', b'N', b'G', 1, 2, 3];
    service(&mock)
        .submit("look", Some(Media::png(png.clone())), &CancelSignal::never())
        .await
        .unwrap();

    let requests = mock.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].request.url, api().media_upload_url);
    assert_eq!(requests[1].request.url, api().messages_url);

    match &requests[0].request.body {
        RequestBody::Multipart {
            field,
            file_name,
            mime_type,
            bytes,
        } => {
            assert_eq!(field, "media");
            assert_eq!(file_name, "image.png");
            assert_eq!(mime_type, "image/png");
            assert_eq!(bytes, &png);
        }
        other => panic!("expected multipart upload, got {:?}", other),
    }

    assert_eq!(
        json_body(&requests[1].request.body),
        json!({ "text": "look", "media": { "media_ids": ["m-77"] } })
    );
}

#[tokio::test]
async fn test_failed_upload_skips_message_endpoint() {
    let mock = MockTransport::new();
    mock.respond(&api().media_upload_url, 500, "internal error");

    let err = service(&mock)
        .submit("look", Some(Media::png(vec![1, 2, 3])), &CancelSignal::never())
        .await
        .unwrap_err();

    assert!(matches!(err, PostError::MediaUploadFailed(_)), "got {:?}", err);
    assert_eq!(mock.call_count(&api().media_upload_url), 1);
    assert_eq!(mock.call_count(&api().messages_url), 0);
}

#[tokio::test]
async fn test_rejected_post_keeps_status_and_body() {
    let mock = MockTransport::new();
    mock.respond(&api().messages_url, 403, r#"{"detail":"duplicate content"}"#);

    let err = service(&mock)
        .submit("again", None, &CancelSignal::never())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        PostError::Api {
            status: 403,
            body: r#"{"detail":"duplicate content"}"#.to_string()
        }
    );
}

#[tokio::test]
async fn test_verify_with_revoked_token() {
    let mock = MockTransport::new();
    mock.respond(&api().identity_url, 401, "Unauthorized");

    let err = service(&mock).verify().await.unwrap_err();
    assert_eq!(
        err,
        PostError::Api {
            status: 401,
            body: "Unauthorized".to_string()
        }
    );
    assert!(err.is_authentication());
}

#[tokio::test(start_paused = true)]
async fn test_slow_server_times_out() {
    let mock = MockTransport::new().with_delay(Duration::from_secs(90));
    mock.respond(&api().messages_url, 201, "{}");

    let err = service(&mock)
        .submit("hello", None, &CancelSignal::never())
        .await
        .unwrap_err();

    assert_eq!(err, PostError::Timeout(30));
}

#[tokio::test(start_paused = true)]
async fn test_submissions_are_spaced_by_rate_limit() {
    let mock = MockTransport::new();
    mock.respond(&api().messages_url, 201, "{}");
    let service = service_with(&mock, RateLimiter::new(1, Duration::from_secs(15)));

    let first = {
        let service = service.clone();
        tokio::spawn(async move { service.submit("one", None, &CancelSignal::never()).await })
    };
    sleep(Duration::from_secs(1)).await;
    let second = {
        let service = service.clone();
        tokio::spawn(async move { service.submit("two", None, &CancelSignal::never()).await })
    };

    assert!(first.await.unwrap().is_ok());
    assert!(second.await.unwrap().is_ok());

    let sent = mock.requests_to(&api().messages_url);
    assert_eq!(sent.len(), 2);
    let gap = sent[1].at.duration_since(sent[0].at);
    assert!(gap >= Duration::from_secs(14), "second request after {:?}", gap);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_wait_never_reaches_server() {
    let mock = MockTransport::new();
    mock.respond(&api().messages_url, 201, "{}");
    let service = service_with(&mock, RateLimiter::new(1, Duration::from_secs(15)));

    service
        .submit("one", None, &CancelSignal::never())
        .await
        .unwrap();

    let (trigger, signal) = cancellation();
    let waiting = {
        let service = service.clone();
        tokio::spawn(async move { service.submit("two", None, &signal).await })
    };

    let start = Instant::now();
    sleep(Duration::from_secs(2)).await;
    trigger.cancel();

    assert_eq!(waiting.await.unwrap(), Err(PostError::RateLimitCancelled));
    assert!(start.elapsed() < Duration::from_secs(15));
    assert_eq!(mock.call_count(&api().messages_url), 1);
}
