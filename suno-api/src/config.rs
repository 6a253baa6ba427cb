//! Client configuration.
//!
//! Everything has a working default; [`ClientConfig::from_env`] overrides
//! individual values from the process environment:
//!
//! | Variable                | Field              | Default                              |
//! |-------------------------|--------------------|--------------------------------------|
//! | `SUNO_COOKIE`           | `cookie`           | unset                                |
//! | `SUNO_BASE_URL`         | `base_url`         | `https://studio-api.prod.suno.com`   |
//! | `SUNO_CLERK_URL`        | `clerk_url`        | `https://clerk.suno.com`             |
//! | `SUNO_CLERK_JS_VERSION` | `clerk_js_version` | `5.15.0`                             |
//! | `SUNO_MODEL`            | `model`            | `chirp-v3-5`                         |
//! | `SUNO_TIMEOUT_SECS`     | `timeout`          | 30                                   |

use crate::error::{Result, SunoError};
use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://studio-api.prod.suno.com";
pub const DEFAULT_CLERK_URL: &str = "https://clerk.suno.com";
pub const DEFAULT_CLERK_JS_VERSION: &str = "5.15.0";
pub const DEFAULT_MODEL: &str = "chirp-v3-5";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Raw cookie from the environment. Callers may also supply one per
    /// request, in which case this is only the fallback.
    pub cookie: Option<String>,
    pub base_url: String,
    pub clerk_url: String,
    pub clerk_js_version: String,
    /// Model id sent as `mv` on generation requests.
    pub model: String,
    /// Bound for each individual network call.
    pub timeout: Duration,
    /// Delay between status polls while waiting for audio or lyrics.
    pub poll_interval: Duration,
    /// Give up waiting for audio after this long and return what is known.
    pub wait_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            cookie: None,
            base_url: DEFAULT_BASE_URL.to_owned(),
            clerk_url: DEFAULT_CLERK_URL.to_owned(),
            clerk_js_version: DEFAULT_CLERK_JS_VERSION.to_owned(),
            model: DEFAULT_MODEL.to_owned(),
            timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(5),
            wait_timeout: Duration::from_secs(100),
        }
    }
}

impl ClientConfig {
    /// Build a config from `SUNO_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self {
            cookie: env::var("SUNO_COOKIE").ok().filter(|c| !c.trim().is_empty()),
            ..Self::default()
        };
        if let Ok(url) = env::var("SUNO_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_owned();
        }
        if let Ok(url) = env::var("SUNO_CLERK_URL") {
            config.clerk_url = url.trim_end_matches('/').to_owned();
        }
        if let Ok(v) = env::var("SUNO_CLERK_JS_VERSION") {
            config.clerk_js_version = v;
        }
        if let Ok(model) = env::var("SUNO_MODEL") {
            config.model = model;
        }
        if let Ok(secs) = env::var("SUNO_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|_| SunoError::Other(format!("invalid SUNO_TIMEOUT_SECS: {secs}")))?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }
}
