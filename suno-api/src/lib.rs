//! Suno music generation API client library.
//!
//! Provides cookie-authenticated access to the (unofficial) Suno studio API:
//! library listing, credits, song and lyrics generation.
//!
//! # Authentication
//!
//! Calls are authorized with a short-lived bearer token obtained from Clerk
//! using the raw `Cookie` header of a logged-in browser session. The
//! [`SessionManager`] caches one session per cookie, refreshes it when it
//! expires or upstream rejects it, and never runs two acquisitions for the
//! same cookie at once.
//!
//! ```no_run
//! use suno_api::{ClientConfig, SunoClient, SongQuery};
//!
//! # async fn run() -> suno_api::Result<()> {
//! let config = ClientConfig {
//!     cookie: Some("__client=eyJ...; __client_uat=...".into()),
//!     ..ClientConfig::default()
//! };
//! let client = SunoClient::from_config(config)?;
//! let songs = client.songs(&SongQuery::default()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! User-facing callers should go through [`Gateway`], which turns every
//! failure into an empty list, a fallback credit snapshot, or an
//! [`ErrorBody`](gateway::ErrorBody).
//!
//! # API endpoint mapping
//!
//! | Method                              | Endpoint                      | Description            |
//! |-------------------------------------|-------------------------------|------------------------|
//! | [`SunoClient::songs`]               | `GET /api/feed/v2`            | Songs by id / library  |
//! | [`SunoClient::clip`]                | `GET /api/clip/{id}`          | One clip               |
//! | [`SunoClient::credits`]             | `GET /api/billing/info/`      | Credit balance         |
//! | [`SunoClient::generate`]            | `POST /api/generate/v2/`      | Description mode       |
//! | [`SunoClient::custom_generate`]     | `POST /api/generate/v2/`      | Lyrics + tags + title  |
//! | [`SunoClient::extend_audio`]        | `POST /api/generate/v2/`      | Continue a clip        |
//! | [`SunoClient::generate_lyrics`]     | `POST /api/generate/lyrics/`  | Lyrics only            |

pub mod auth;
mod billing;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod gateway;
mod generate;
mod lyrics;
pub mod normalize;
pub mod session;
mod songs;
pub mod transport;
pub mod types;

pub use client::{ApiRequest, SunoClient};
pub use config::ClientConfig;
pub use error::{ErrorKind, Result, SunoError};
pub use gateway::Gateway;
pub use session::SessionManager;
pub use types::{
    AudioInfo, CreditInfo, CustomGenerateRequest, ExtendRequest, GenerateRequest, Lyrics,
    SongQuery, SongStatus,
};
