//! Credentials: the raw browser cookie, the session derived from it, and
//! the on-disk cookie store used by the CLI.
//!
//! The cookie is the whole `Cookie` header a logged-in browser sends to
//! `suno.com` (it must include the `__client` cookie issued by Clerk). It
//! can be copied from browser developer tools → Network → any request to
//! `clerk.suno.com`. The library never modifies it.
//!
//! The store file lives at `~/.config/suno-api/session.json`:
//!
//! ```json
//! { "SUNO_COOKIE": "__client=eyJ...; __client_uat=..." }
//! ```

use crate::error::{Result, SunoError};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD as B64URL};
use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// A validated, non-empty raw cookie string.
#[derive(Clone, PartialEq, Eq)]
pub struct Cookie {
    raw: String,
    fingerprint: String,
}

impl Cookie {
    /// Validate a raw cookie string.
    ///
    /// # Errors
    ///
    /// [`SunoError::NotConfigured`] if `raw` is empty or only whitespace.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(SunoError::NotConfigured);
        }
        let fingerprint = format!("{:x}", Md5::digest(raw.as_bytes()));
        Ok(Self {
            raw: raw.to_owned(),
            fingerprint,
        })
    }

    /// The header value to send upstream.
    pub fn as_header(&self) -> &str {
        &self.raw
    }

    /// Stable cache key for this cookie. Safe to log.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

impl fmt::Debug for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cookie")
            .field("fingerprint", &self.fingerprint)
            .finish_non_exhaustive()
    }
}

/// An authenticated upstream session.
///
/// Replaced wholesale on refresh, never mutated in place.
#[derive(Clone)]
pub struct Session {
    pub cookie_fingerprint: String,
    /// Clerk session id, reused when only the token needs renewing.
    pub session_id: String,
    pub bearer_token: String,
    pub obtained_at: DateTime<Utc>,
    /// `exp` claim of the bearer token, when it is a readable JWT.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(
        cookie: &Cookie,
        session_id: String,
        bearer_token: String,
        obtained_at: DateTime<Utc>,
    ) -> Self {
        let expires_at = jwt_expiry(&bearer_token);
        Self {
            cookie_fingerprint: cookie.fingerprint().to_owned(),
            session_id,
            bearer_token,
            obtained_at,
            expires_at,
        }
    }

    /// Whether `now` is at or past the known expiry. Sessions with an
    /// unknown expiry never expire here; they are refreshed on rejection.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }

    /// `Authorization` header value.
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.bearer_token)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("cookie_fingerprint", &self.cookie_fingerprint)
            .field("session_id", &self.session_id)
            .field("obtained_at", &self.obtained_at)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Read the `exp` claim from a JWT without verifying it.
fn jwt_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let bytes = B64URL.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;
    let exp = claims["exp"].as_i64()?;
    DateTime::from_timestamp(exp, 0)
}

/// Cookie saved by `suno login`, kept in a JSON file on disk.
///
/// Only values that pass [`Cookie::parse`] are ever written, trimmed. On
/// Unix the file is created owner-readable only.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct CookieStore {
    #[serde(rename = "SUNO_COOKIE", default, skip_serializing_if = "Option::is_none")]
    pub cookie: Option<String>,
}

impl CookieStore {
    /// A store holding `raw`, validated and trimmed.
    pub fn new(raw: &str) -> Result<Self> {
        let cookie = Cookie::parse(raw)?;
        Ok(Self {
            cookie: Some(cookie.as_header().to_owned()),
        })
    }

    /// Load from the default location. A missing file is an empty store.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let mut store: Self = serde_json::from_str(&fs::read_to_string(path)?)?;
        store.cookie = store.cookie().map(|c| c.as_header().to_owned());
        Ok(store)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Write to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// [`SunoError::NotConfigured`] if the store holds a blank cookie.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(raw) = &self.cookie {
            Cookie::parse(raw)?;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        restrict_permissions(path)?;
        Ok(())
    }

    /// Delete the default store file. Returns whether one existed.
    pub fn clear() -> Result<bool> {
        Self::clear_at(&Self::path()?)
    }

    pub fn clear_at(path: &Path) -> Result<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// The stored cookie, if it passes [`Cookie::parse`].
    pub fn cookie(&self) -> Option<Cookie> {
        self.cookie.as_deref().and_then(|c| Cookie::parse(c).ok())
    }

    /// `~/.config/suno-api/session.json` (platform config dir).
    pub fn path() -> Result<PathBuf> {
        let config = dirs::config_dir()
            .ok_or_else(|| SunoError::Other("cannot determine config directory".into()))?;
        Ok(config.join("suno-api").join("session.json"))
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
