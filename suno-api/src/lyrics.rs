//! Lyrics generation API.
//!
//! ## Submit: `POST /api/generate/lyrics/`
//!
//! Request: `{ "prompt": "a song about the sea" }`. Response: `{ "id": "..." }`.
//!
//! ## Poll: `GET /api/generate/lyrics/{id}`
//!
//! ```json
//! { "text": "[Verse]\n...", "title": "Salt", "status": "complete" }
//! ```
//!
//! `status` stays `running` until the text is final.

use crate::client::{ApiRequest, SunoClient};
use crate::error::{Result, SunoError};
use crate::normalize::to_lyrics;
use crate::types::Lyrics;
use serde_json::json;
use tokio::time::{Instant, sleep};
use tracing::warn;

impl SunoClient {
    /// Generate lyrics from a prompt, waiting until they are complete.
    ///
    /// Returns the last polled state if `wait_timeout` elapses first.
    pub async fn generate_lyrics(&self, prompt: &str) -> Result<Lyrics> {
        if prompt.trim().is_empty() {
            return Err(SunoError::InvalidRequest("prompt is required".into()));
        }
        let body = json!({ "prompt": prompt });
        let resp = self
            .execute(&ApiRequest::post("/api/generate/lyrics/", body))
            .await?;
        let id = resp["id"].as_str().ok_or_else(|| SunoError::Upstream {
            status: 200,
            message: "lyrics response has no id".into(),
        })?;

        let path = format!("/api/generate/lyrics/{}", urlencoding::encode(id));
        let poll = self.config().poll_interval;
        let deadline = Instant::now() + self.config().wait_timeout;
        loop {
            let lyrics = to_lyrics(&self.execute(&ApiRequest::get(path.as_str())).await?);
            if lyrics.status == "complete" {
                return Ok(lyrics);
            }
            if Instant::now() + poll > deadline {
                warn!(id, status = %lyrics.status, "lyrics not complete before wait timeout");
                return Ok(lyrics);
            }
            sleep(poll).await;
        }
    }
}
