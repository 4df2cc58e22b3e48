//! Mock transport for testing
//!
//! Responses are scripted per URL. Each URL holds a queue of replies; the
//! last reply in a queue repeats once the others are used up. Every request
//! is recorded together with the (tokio) time it arrived so tests can assert
//! on call counts, bodies and spacing.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, Instant};

use super::{HttpRequest, HttpResponse, Transport, TransportError};

/// One scripted reply
#[derive(Debug, Clone)]
pub enum MockReply {
    Respond(HttpResponse),
    Fail(TransportError),
}

/// A request the mock received
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub request: HttpRequest,
    pub at: Instant,
}

#[derive(Default)]
struct MockState {
    routes: HashMap<String, VecDeque<MockReply>>,
    requests: Vec<RecordedRequest>,
}

/// Scriptable [`Transport`] for tests
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    delay: Duration,
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every reply (simulates network latency)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queue a response for `url`
    pub fn respond(&self, url: &str, status: u16, body: impl Into<String>) -> &Self {
        self.push(url, MockReply::Respond(HttpResponse::new(status, body)))
    }

    /// Queue a transport failure for `url`
    pub fn fail(&self, url: &str, error: TransportError) -> &Self {
        self.push(url, MockReply::Fail(error))
    }

    fn push(&self, url: &str, reply: MockReply) -> &Self {
        lock(&self.state)
            .routes
            .entry(url.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    /// Number of requests sent to `url`
    pub fn call_count(&self, url: &str) -> usize {
        lock(&self.state)
            .requests
            .iter()
            .filter(|r| r.request.url == url)
            .count()
    }

    /// All requests in arrival order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state).requests.clone()
    }

    /// Requests sent to `url` in arrival order
    pub fn requests_to(&self, url: &str) -> Vec<RecordedRequest> {
        lock(&self.state)
            .requests
            .iter()
            .filter(|r| r.request.url == url)
            .cloned()
            .collect()
    }

    fn next_reply(&self, request: HttpRequest) -> MockReply {
        let mut state = lock(&self.state);
        let url = request.url.clone();
        state.requests.push(RecordedRequest {
            request,
            at: Instant::now(),
        });

        match state.routes.get_mut(&url) {
            Some(queue) if queue.len() > 1 => queue
                .pop_front()
                .unwrap_or_else(|| MockReply::Respond(HttpResponse::new(404, "no mock route"))),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| MockReply::Respond(HttpResponse::new(404, "no mock route"))),
            None => MockReply::Respond(HttpResponse::new(404, "no mock route")),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let reply = self.next_reply(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match reply {
            MockReply::Respond(response) => Ok(response),
            MockReply::Fail(error) => Err(error),
        }
    }
}
