//! Session manager: exchanges a cookie for a bearer token and keeps it.
//!
//! Acquisition talks to Clerk, the identity provider behind suno.com:
//!
//! ## Session id: `GET {clerk}/v1/client?_clerk_js_version=5.15.0`
//!
//! Sent with the raw browser cookie. Response:
//! ```json
//! { "response": { "last_active_session_id": "sess_2abc..." } }
//! ```
//! `response` is `null` when the cookie is not logged in.
//!
//! ## Token: `POST {clerk}/v1/client/sessions/{sid}/tokens?_clerk_js_version=5.15.0`
//!
//! Response:
//! ```json
//! { "object": "token", "jwt": "eyJhbGciOi..." }
//! ```
//!
//! # Caching and concurrency
//!
//! One slot per cookie fingerprint. A slot holds the current [`Session`]
//! behind a short-lived read lock and a refresh gate (an async mutex).
//! Reads of a valid session never touch the gate. Whoever finds the
//! session missing or expired takes the gate, re-checks, and acquires;
//! everyone queued behind the gate then finds the fresh session and
//! returns it, so at most one acquisition per fingerprint is in flight.

use crate::auth::{Cookie, Session};
use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::error::{Result, SunoError};
use crate::transport::{HttpRequest, HttpResponse, Method, Transport};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, info, warn};

const SESSION_ID_HINT: &str = "Failed to get session id, you may need to update the SUNO_COOKIE";

#[derive(Default)]
struct Slot {
    current: RwLock<Option<Arc<Session>>>,
    refresh: tokio::sync::Mutex<()>,
}

impl Slot {
    fn get(&self) -> Option<Arc<Session>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, session: Option<Arc<Session>>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = session;
    }

    fn valid(&self, now: chrono::DateTime<chrono::Utc>) -> Option<Arc<Session>> {
        self.get().filter(|s| !s.is_expired(now))
    }
}

/// Owns every cached [`Session`], keyed by cookie fingerprint.
///
/// Share one instance (behind an `Arc`) between all clients that should
/// reuse sessions.
pub struct SessionManager {
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    clerk_url: String,
    clerk_js_version: String,
    timeout: Duration,
    slots: Mutex<HashMap<String, Arc<Slot>>>,
    acquisitions: AtomicU64,
}

impl SessionManager {
    pub fn new(transport: Arc<dyn Transport>, config: &ClientConfig) -> Self {
        Self::with_clock(transport, Arc::new(SystemClock), config)
    }

    pub fn with_clock(
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            transport,
            clock,
            clerk_url: config.clerk_url.clone(),
            clerk_js_version: config.clerk_js_version.clone(),
            timeout: config.timeout,
            slots: Mutex::new(HashMap::new()),
            acquisitions: AtomicU64::new(0),
        }
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Number of acquisitions (full or token-only) issued so far.
    pub fn acquisitions(&self) -> u64 {
        self.acquisitions.load(Ordering::Relaxed)
    }

    /// The cached session for `cookie`, valid or not.
    pub fn cached(&self, cookie: &Cookie) -> Option<Arc<Session>> {
        self.lock_slots().get(cookie.fingerprint())?.get()
    }

    /// Number of cookies with a cache slot.
    pub fn tracked(&self) -> usize {
        self.lock_slots().len()
    }

    /// Return a non-expired session for `cookie`, acquiring one if needed.
    ///
    /// # Errors
    ///
    /// [`SunoError::Authentication`] if upstream refuses the cookie or the
    /// acquisition request itself fails.
    pub async fn ensure_session(&self, cookie: &Cookie) -> Result<Arc<Session>> {
        let slot = self.slot(cookie);
        if let Some(session) = slot.valid(self.clock.now()) {
            return Ok(session);
        }

        let _gate = slot.refresh.lock().await;
        if let Some(session) = slot.valid(self.clock.now()) {
            return Ok(session);
        }

        let prior = slot.get();
        let acquired = self.acquire(cookie, prior.as_deref()).await;
        self.store(cookie, &slot, acquired)
    }

    /// Replace `stale` after upstream rejected it.
    ///
    /// If another caller already replaced it, the replacement is returned
    /// and no acquisition is made.
    pub async fn refresh_after_rejection(
        &self,
        cookie: &Cookie,
        stale: &Session,
    ) -> Result<Arc<Session>> {
        let slot = self.slot(cookie);
        let _gate = slot.refresh.lock().await;
        let replaced = slot
            .valid(self.clock.now())
            .filter(|current| current.bearer_token != stale.bearer_token);
        if let Some(current) = replaced {
            debug!(fingerprint = cookie.fingerprint(), "session already refreshed");
            return Ok(current);
        }

        warn!(
            fingerprint = cookie.fingerprint(),
            "bearer token rejected upstream, refreshing session"
        );
        let acquired = self.acquire(cookie, Some(stale)).await;
        self.store(cookie, &slot, acquired)
    }

    /// Discard the cached session for `cookie`.
    ///
    /// The slot itself is dropped unless a refresh for it is in flight.
    pub fn invalidate(&self, cookie: &Cookie) {
        let slot = self.lock_slots().get(cookie.fingerprint()).cloned();
        if let Some(slot) = slot {
            slot.set(None);
            self.release_if_idle(cookie, &slot);
        }
    }

    fn lock_slots(&self) -> MutexGuard<'_, HashMap<String, Arc<Slot>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self, cookie: &Cookie) -> Arc<Slot> {
        Arc::clone(
            self.lock_slots()
                .entry(cookie.fingerprint().to_owned())
                .or_default(),
        )
    }

    /// Publish an acquisition result to `slot`. A failure empties the slot
    /// and releases it so rejected cookies leave nothing behind.
    fn store(
        &self,
        cookie: &Cookie,
        slot: &Arc<Slot>,
        acquired: Result<Session>,
    ) -> Result<Arc<Session>> {
        match acquired {
            Ok(fresh) => {
                let fresh = Arc::new(fresh);
                slot.set(Some(Arc::clone(&fresh)));
                Ok(fresh)
            }
            Err(e) => {
                slot.set(None);
                self.release_if_idle(cookie, slot);
                Err(e)
            }
        }
    }

    /// Remove an empty slot from the map when the caller holds the only
    /// reference outside it. New references are only handed out under the
    /// map lock, so the count cannot grow while it is held.
    fn release_if_idle(&self, cookie: &Cookie, slot: &Arc<Slot>) {
        let mut slots = self.lock_slots();
        let idle = slots
            .get(cookie.fingerprint())
            .is_some_and(|held| Arc::ptr_eq(held, slot))
            && Arc::strong_count(slot) == 2
            && slot.get().is_none();
        if idle {
            slots.remove(cookie.fingerprint());
        }
    }

    /// Renew the token for a known session id, falling back to a full
    /// acquisition if that fails.
    async fn acquire(&self, cookie: &Cookie, prior: Option<&Session>) -> Result<Session> {
        self.acquisitions.fetch_add(1, Ordering::Relaxed);

        if let Some(prior) = prior {
            match self.fetch_token(cookie, &prior.session_id).await {
                Ok(session) => {
                    info!(fingerprint = cookie.fingerprint(), "renewed session token");
                    return Ok(session);
                }
                Err(e) => debug!(
                    fingerprint = cookie.fingerprint(),
                    "token renewal failed, re-acquiring session: {e}"
                ),
            }
        }

        let session_id = self.fetch_session_id(cookie).await?;
        let session = self.fetch_token(cookie, &session_id).await?;
        info!(
            fingerprint = cookie.fingerprint(),
            expires_at = ?session.expires_at,
            "acquired upstream session"
        );
        Ok(session)
    }

    async fn fetch_session_id(&self, cookie: &Cookie) -> Result<String> {
        let url = format!(
            "{}/v1/client?_clerk_js_version={}",
            self.clerk_url, self.clerk_js_version
        );
        let req = HttpRequest::new(Method::Get, url, self.timeout);
        let json = self.clerk_call(cookie, req).await?;
        json["response"]["last_active_session_id"]
            .as_str()
            .filter(|sid| !sid.is_empty())
            .map(String::from)
            .ok_or_else(|| SunoError::auth(SESSION_ID_HINT))
    }

    async fn fetch_token(&self, cookie: &Cookie, session_id: &str) -> Result<Session> {
        let url = format!(
            "{}/v1/client/sessions/{}/tokens?_clerk_js_version={}",
            self.clerk_url,
            urlencoding::encode(session_id),
            self.clerk_js_version
        );
        let req = HttpRequest::new(Method::Post, url, self.timeout);
        let json = self.clerk_call(cookie, req).await?;
        let jwt = json["jwt"]
            .as_str()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SunoError::auth("token response did not contain a jwt"))?;
        Ok(Session::new(
            cookie,
            session_id.to_owned(),
            jwt.to_owned(),
            self.clock.now(),
        ))
    }

    /// Send a Clerk request; every failure becomes an authentication error.
    async fn clerk_call(&self, cookie: &Cookie, req: HttpRequest) -> Result<Value> {
        let req = req.header("Cookie", cookie.as_header());
        let resp: HttpResponse = self
            .transport
            .send(req)
            .await
            .map_err(|e| SunoError::auth(format!("session request failed: {e}")))?;

        if !resp.is_success() {
            return Err(SunoError::auth(format!(
                "session request returned HTTP {}: {}",
                resp.status,
                resp.snippet(200)
            )));
        }
        serde_json::from_str(&resp.body)
            .map_err(|e| SunoError::auth(format!("unreadable session response: {e}")))
    }
}
