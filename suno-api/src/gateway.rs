//! Boundary adapter for user-facing endpoints.
//!
//! Inside the crate every failure is a typed [`SunoError`]. Pages and API
//! routes must never crash on those, so the [`Gateway`] applies one policy
//! at the edge:
//!
//! | Operation                      | On error                                 |
//! |--------------------------------|------------------------------------------|
//! | `songs`                        | `[]`                                     |
//! | `credits`                      | [`CreditInfo::fallback`]                 |
//! | `generate`, `custom_generate`, `extend_audio`, `generate_lyrics` | [`ErrorBody`] with a status code |
//!
//! Every swallowed error is logged at `warn`.

use crate::client::SunoClient;
use crate::config::ClientConfig;
use crate::error::{ErrorKind, Result, SunoError};
use crate::session::SessionManager;
use crate::types::{
    AudioInfo, CreditInfo, CustomGenerateRequest, ExtendRequest, GenerateRequest, Lyrics,
    SongQuery,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// JSON error payload for endpoints that do report failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    /// HTTP status to answer with; not part of the JSON body.
    #[serde(skip)]
    pub status: u16,
}

impl From<&SunoError> for ErrorBody {
    fn from(e: &SunoError) -> Self {
        let status = match e.kind() {
            ErrorKind::InvalidRequest => 400,
            ErrorKind::Authentication => 401,
            ErrorKind::Upstream => 502,
            ErrorKind::Configuration => 503,
            ErrorKind::Transient => 504,
        };
        Self {
            error: e.to_string(),
            status,
        }
    }
}

/// Map a song-list result to its fail-open value.
pub fn songs_or_empty(result: Result<Vec<AudioInfo>>) -> Vec<AudioInfo> {
    result.unwrap_or_else(|e| {
        warn!(kind = ?e.kind(), "returning empty song list: {e}");
        Vec::new()
    })
}

/// Map a credit result to its fail-open value.
pub fn credits_or_fallback(result: Result<CreditInfo>) -> CreditInfo {
    result.unwrap_or_else(|e| {
        warn!(kind = ?e.kind(), "returning fallback credits: {e}");
        CreditInfo::fallback()
    })
}

fn or_error_body<T>(result: Result<T>) -> std::result::Result<T, ErrorBody> {
    result.map_err(|e| {
        warn!(kind = ?e.kind(), "request failed: {e}");
        ErrorBody::from(&e)
    })
}

/// Entry point for UI and route handlers.
///
/// Each call takes the inbound request's cookie header, if any; a blank
/// or missing one falls back to the configured `SUNO_COOKIE`.
pub struct Gateway {
    sessions: Arc<SessionManager>,
    config: ClientConfig,
}

impl Gateway {
    pub fn new(sessions: Arc<SessionManager>, config: ClientConfig) -> Self {
        Self { sessions, config }
    }

    /// Build a client for one inbound request.
    pub fn client(&self, cookie: Option<&str>) -> Result<SunoClient> {
        let cookie = cookie
            .filter(|c| !c.trim().is_empty())
            .or(self.config.cookie.as_deref())
            .ok_or(SunoError::NotConfigured)?;
        SunoClient::new(cookie, Arc::clone(&self.sessions), self.config.clone())
    }

    async fn with_client<T>(
        &self,
        cookie: Option<&str>,
        call: impl AsyncFnOnce(SunoClient) -> Result<T>,
    ) -> Result<T> {
        call(self.client(cookie)?).await
    }

    pub async fn songs(&self, cookie: Option<&str>, query: &SongQuery) -> Vec<AudioInfo> {
        let result = self
            .with_client(cookie, async move |client| client.songs(query).await)
            .await;
        songs_or_empty(result)
    }

    pub async fn credits(&self, cookie: Option<&str>) -> CreditInfo {
        let result = self
            .with_client(cookie, async move |client| client.credits().await)
            .await;
        credits_or_fallback(result)
    }

    pub async fn generate(
        &self,
        cookie: Option<&str>,
        req: &GenerateRequest,
    ) -> std::result::Result<Vec<AudioInfo>, ErrorBody> {
        let result = self
            .with_client(cookie, async move |client| client.generate(req).await)
            .await;
        or_error_body(result)
    }

    pub async fn custom_generate(
        &self,
        cookie: Option<&str>,
        req: &CustomGenerateRequest,
    ) -> std::result::Result<Vec<AudioInfo>, ErrorBody> {
        let result = self
            .with_client(cookie, async move |client| client.custom_generate(req).await)
            .await;
        or_error_body(result)
    }

    pub async fn extend_audio(
        &self,
        cookie: Option<&str>,
        req: &ExtendRequest,
    ) -> std::result::Result<Vec<AudioInfo>, ErrorBody> {
        let result = self
            .with_client(cookie, async move |client| client.extend_audio(req).await)
            .await;
        or_error_body(result)
    }

    pub async fn generate_lyrics(
        &self,
        cookie: Option<&str>,
        prompt: &str,
    ) -> std::result::Result<Lyrics, ErrorBody> {
        let result = self
            .with_client(cookie, async move |client| client.generate_lyrics(prompt).await)
            .await;
        or_error_body(result)
    }
}
