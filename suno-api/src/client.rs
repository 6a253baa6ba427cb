//! Request executor for the Suno studio API.
//!
//! Every call follows the same path:
//!
//! 1. Obtain a valid [`Session`] from the shared [`SessionManager`]
//! 2. Send the request with `Authorization: Bearer <jwt>`
//! 3. On 401/403, have the session manager replace the session and send
//!    the request once more; a second rejection is returned as
//!    [`SunoError::Authentication`]
//!
//! Responses are plain JSON without an envelope. Status mapping:
//!
//! | Upstream                | Result                              |
//! |-------------------------|-------------------------------------|
//! | 2xx, JSON (or empty)    | `Ok(Value)`                         |
//! | 2xx, not JSON           | [`SunoError::Upstream`]             |
//! | 401 / 403               | one refresh + retry, then `Authentication` |
//! | any other status        | [`SunoError::Upstream`] with body snippet |
//! | no response             | [`SunoError::Transient`], never retried |

use crate::auth::{Cookie, Session};
use crate::config::ClientConfig;
use crate::error::{Result, SunoError};
use crate::session::SessionManager;
use crate::transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

const SNIPPET_LEN: usize = 200;

/// A request relative to the configured base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path plus query, e.g. `/api/feed/v2?page=1`.
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: Some(body),
        }
    }
}

enum Attempt {
    Done(Value),
    Rejected(HttpResponse),
}

/// Async client for the Suno API, bound to one cookie.
///
/// Cheap to construct: sessions live in the [`SessionManager`], so many
/// short-lived clients (one per inbound request, say) can share them.
/// API methods are implemented in separate modules (`songs`, `billing`,
/// `generate`, `lyrics`) as `impl SunoClient` blocks.
pub struct SunoClient {
    cookie: Cookie,
    sessions: Arc<SessionManager>,
    config: ClientConfig,
}

impl SunoClient {
    /// Create a client for `cookie` backed by an existing session manager.
    ///
    /// # Errors
    ///
    /// [`SunoError::NotConfigured`] if `cookie` is blank.
    pub fn new(cookie: &str, sessions: Arc<SessionManager>, config: ClientConfig) -> Result<Self> {
        let cookie = Cookie::parse(cookie)?;
        Ok(Self {
            cookie,
            sessions,
            config,
        })
    }

    /// Create a standalone client using the cookie in `config` and a
    /// private session manager over the real network.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let cookie = config.cookie.clone().ok_or(SunoError::NotConfigured)?;
        let transport = Arc::new(ReqwestTransport::new()?);
        let sessions = Arc::new(SessionManager::new(transport, &config));
        Self::new(&cookie, sessions, config)
    }

    pub fn cookie(&self) -> &Cookie {
        &self.cookie
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send `request` with the current bearer token.
    ///
    /// Returns the decoded JSON body (`Value::Null` for an empty body).
    pub async fn execute(&self, request: &ApiRequest) -> Result<Value> {
        let session = self.sessions.ensure_session(&self.cookie).await?;
        let first = match self.attempt(&session, request).await? {
            Attempt::Done(json) => return Ok(json),
            Attempt::Rejected(resp) => resp,
        };

        debug!(
            status = first.status,
            path = %request.path,
            "request rejected, retrying once with a fresh session"
        );
        let fresh = self
            .sessions
            .refresh_after_rejection(&self.cookie, &session)
            .await?;

        match self.attempt(&fresh, request).await? {
            Attempt::Done(json) => Ok(json),
            Attempt::Rejected(resp) => {
                warn!(status = resp.status, path = %request.path, "rejected again after refresh");
                Err(SunoError::auth(format!(
                    "upstream rejected {} after session refresh (HTTP {}): {}",
                    request.path,
                    resp.status,
                    resp.snippet(SNIPPET_LEN)
                )))
            }
        }
    }

    async fn attempt(&self, session: &Session, request: &ApiRequest) -> Result<Attempt> {
        let url = format!("{}{}", self.config.base_url, request.path);
        let mut req = HttpRequest::new(request.method, url, self.config.timeout)
            .header("Authorization", session.authorization());
        if let Some(body) = &request.body {
            req = req.json(body.clone());
        }

        let resp = self.sessions.transport().send(req).await?;

        if resp.is_auth_rejection() {
            return Ok(Attempt::Rejected(resp));
        }
        if !resp.is_success() {
            return Err(SunoError::Upstream {
                status: resp.status,
                message: format!("{}: {}", request.path, resp.snippet(SNIPPET_LEN)),
            });
        }
        if resp.body.trim().is_empty() {
            return Ok(Attempt::Done(Value::Null));
        }
        serde_json::from_str(&resp.body)
            .map(Attempt::Done)
            .map_err(|e| SunoError::Upstream {
                status: resp.status,
                message: format!(
                    "{}: malformed response ({e}): {}",
                    request.path,
                    resp.snippet(SNIPPET_LEN)
                ),
            })
    }
}
