#![allow(dead_code)]

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD as B64URL};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use suno_api::clock::Clock;
use suno_api::transport::{HttpRequest, HttpResponse, Method, Transport};
use suno_api::{ClientConfig, SessionManager, SunoClient, SunoError};

pub const COOKIE: &str = "__client=test-client-cookie; __client_uat=1700000000";
pub const SESSION_ID: &str = "sess_1";

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// Scripted reply.
#[derive(Clone)]
pub enum Reply {
    Json(u16, Value),
    Text(u16, String),
    Fail(String),
}

type Handler = Arc<dyn Fn(&HttpRequest) -> Reply + Send + Sync>;

/// Transport that answers from per-route scripts and records every call.
pub struct MockTransport {
    routes: Mutex<Vec<(Method, String, Handler)>>,
    calls: Mutex<Vec<HttpRequest>>,
    delay: Duration,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    /// Every response is delayed, so concurrent callers overlap.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            routes: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            delay,
        }
    }

    /// Answer `path` with `replies` in order; the last one repeats.
    pub fn on(&self, method: Method, path: &str, replies: Vec<Reply>) {
        let queue = Mutex::new(VecDeque::from(replies));
        self.on_fn(method, path, move |_| {
            let mut q = queue.lock().unwrap();
            if q.len() > 1 {
                q.pop_front().unwrap()
            } else {
                q.front().cloned().unwrap()
            }
        });
    }

    pub fn on_fn(
        &self,
        method: Method,
        path: &str,
        handler: impl Fn(&HttpRequest) -> Reply + Send + Sync + 'static,
    ) {
        let handler: Handler = Arc::new(handler);
        let mut routes = self.routes.lock().unwrap();
        routes.retain(|(m, p, _)| !(*m == method && p == path));
        routes.push((method, path.to_owned(), handler));
    }

    pub fn calls_to(&self, method: Method, path: &str) -> usize {
        self.requests_to(method, path).len()
    }

    pub fn requests_to(&self, method: Method, path: &str) -> Vec<HttpRequest> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && path_of(&r.url) == path)
            .cloned()
            .collect()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> suno_api::Result<HttpResponse> {
        self.calls.lock().unwrap().push(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let path = path_of(&request.url).to_owned();
        let handler = self
            .routes
            .lock()
            .unwrap()
            .iter()
            .find(|(m, p, _)| *m == request.method && *p == path)
            .map(|(_, _, h)| Arc::clone(h));

        let reply = match handler {
            Some(h) => h(&request),
            None => Reply::Json(404, json!({ "detail": "Not Found" })),
        };
        match reply {
            Reply::Json(status, body) => Ok(HttpResponse {
                status,
                body: body.to_string(),
            }),
            Reply::Text(status, body) => Ok(HttpResponse { status, body }),
            Reply::Fail(msg) => Err(SunoError::Transient(msg)),
        }
    }
}

/// Path component of `url`, without scheme, host or query.
pub fn path_of(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, r)| r);
    let path = rest.find('/').map_or("/", |i| &rest[i..]);
    path.split('?').next().unwrap_or(path)
}

pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(Mutex::new(at))
    }

    pub fn advance(&self, by: chrono::Duration) {
        *self.0.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// Unsigned JWT carrying `exp` (if any) and a distinguishing `n`.
pub fn jwt(exp: Option<i64>, n: usize) -> String {
    let claims = match exp {
        Some(exp) => json!({ "exp": exp, "n": n }),
        None => json!({ "n": n }),
    };
    format!(
        "{}.{}.sig",
        B64URL.encode(br#"{"alg":"RS256","typ":"JWT"}"#),
        B64URL.encode(claims.to_string())
    )
}

pub const CLIENT_PATH: &str = "/v1/client";

pub fn token_path() -> String {
    format!("/v1/client/sessions/{SESSION_ID}/tokens")
}

/// Clerk answering with a fresh token per call; token `n` expires
/// `n * ttl` seconds after `start()` (or never, if `ttl` is `None`).
pub fn script_clerk(mock: &MockTransport, ttl: Option<i64>) {
    mock.on(
        Method::Get,
        CLIENT_PATH,
        vec![Reply::Json(
            200,
            json!({ "response": { "last_active_session_id": SESSION_ID } }),
        )],
    );
    let issued = AtomicUsize::new(0);
    mock.on_fn(Method::Post, &token_path(), move |_| {
        let n = issued.fetch_add(1, Ordering::SeqCst) + 1;
        let exp = ttl.map(|t| start().timestamp() + t * i64::try_from(n).unwrap());
        Reply::Json(200, json!({ "object": "token", "jwt": jwt(exp, n) }))
    });
}

pub fn config() -> ClientConfig {
    ClientConfig {
        cookie: None,
        base_url: "https://studio.test".into(),
        clerk_url: "https://clerk.test".into(),
        poll_interval: Duration::from_millis(10),
        wait_timeout: Duration::from_millis(500),
        timeout: Duration::from_secs(5),
        ..ClientConfig::default()
    }
}

pub struct Harness {
    pub mock: Arc<MockTransport>,
    pub clock: Arc<ManualClock>,
    pub sessions: Arc<SessionManager>,
}

impl Harness {
    pub fn new(mock: MockTransport) -> Self {
        let mock = Arc::new(mock);
        let clock = Arc::new(ManualClock::new(start()));
        let sessions = Arc::new(SessionManager::with_clock(
            mock.clone(),
            clock.clone(),
            &config(),
        ));
        Self {
            mock,
            clock,
            sessions,
        }
    }

    pub fn client(&self) -> SunoClient {
        SunoClient::new(COOKIE, Arc::clone(&self.sessions), config()).unwrap()
    }

    pub fn token_calls(&self) -> usize {
        self.mock.calls_to(Method::Post, &token_path())
    }

    pub fn client_calls(&self) -> usize {
        self.mock.calls_to(Method::Get, CLIENT_PATH)
    }
}

pub fn clip(id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "title": format!("Song {id}"),
        "status": status,
        "model_name": "chirp-v3",
        "created_at": "2024-06-01T11:59:00.000Z",
        "metadata": { "tags": "pop upbeat" }
    })
}
