//! Song generation APIs.
//!
//! All three operations post to `POST /api/generate/v2/` and differ only in
//! the body:
//!
//! | Operation         | Body fields                                              |
//! |-------------------|----------------------------------------------------------|
//! | `generate`        | `gpt_description_prompt`, `make_instrumental`, `mv`      |
//! | `custom_generate` | `prompt` (lyrics), `tags`, `title`, `make_instrumental`, `mv` |
//! | `extend_audio`    | `continue_clip_id`, `continue_at`, `task: "extend"`, ... |
//!
//! Response:
//! ```json
//! { "id": "batch-id", "clips": [ { "id": "...", "status": "submitted", ... }, ... ] }
//! ```
//!
//! Generation spends credits, so these requests are sent at most twice
//! (the single auth retry) and never on network failure.

use crate::client::{ApiRequest, SunoClient};
use crate::error::{Result, SunoError};
use crate::normalize::to_audio_list;
use crate::types::{
    AudioInfo, CustomGenerateRequest, ExtendRequest, GenerateRequest, SongQuery, SongStatus,
};
use serde_json::{Value, json};
use tokio::time::{Instant, sleep};
use tracing::{info, warn};

const GENERATE_PATH: &str = "/api/generate/v2/";

impl SunoClient {
    /// Generate songs from a free-form description.
    pub async fn generate(&self, req: &GenerateRequest) -> Result<Vec<AudioInfo>> {
        require("prompt", &req.prompt)?;
        let body = json!({
            "gpt_description_prompt": req.prompt,
            "prompt": "",
            "make_instrumental": req.make_instrumental,
            "mv": self.config().model,
        });
        let clips = self.submit(body).await?;
        self.finish(clips, req.wait_audio).await
    }

    /// Generate songs from explicit lyrics, style tags and title.
    pub async fn custom_generate(&self, req: &CustomGenerateRequest) -> Result<Vec<AudioInfo>> {
        require("prompt", &req.prompt)?;
        require("tags", &req.tags)?;
        require("title", &req.title)?;
        let body = json!({
            "prompt": req.prompt,
            "tags": req.tags,
            "title": req.title,
            "make_instrumental": req.make_instrumental,
            "mv": self.config().model,
        });
        let clips = self.submit(body).await?;
        self.finish(clips, req.wait_audio).await
    }

    /// Continue an existing clip from `continue_at` seconds.
    pub async fn extend_audio(&self, req: &ExtendRequest) -> Result<Vec<AudioInfo>> {
        require("clip_id", &req.clip_id)?;
        if req.continue_at.is_some_and(|at| !at.is_finite() || at < 0.0) {
            return Err(SunoError::InvalidRequest(
                "continue_at must be a non-negative number of seconds".into(),
            ));
        }
        let body = json!({
            "continue_clip_id": req.clip_id,
            "continue_at": req.continue_at,
            "prompt": req.prompt,
            "tags": req.tags,
            "title": req.title,
            "task": "extend",
            "mv": self.config().model,
        });
        self.submit(body).await
    }

    async fn submit(&self, body: Value) -> Result<Vec<AudioInfo>> {
        let resp = self.execute(&ApiRequest::post(GENERATE_PATH, body)).await?;
        let clips = to_audio_list(&resp);
        if clips.is_empty() {
            return Err(SunoError::Upstream {
                status: 200,
                message: "generation response contained no clips".into(),
            });
        }
        let ids: Vec<&str> = clips.iter().map(|c| c.id.as_str()).collect();
        info!(clips = ?ids, "generation submitted");
        Ok(clips)
    }

    async fn finish(&self, clips: Vec<AudioInfo>, wait_audio: bool) -> Result<Vec<AudioInfo>> {
        if wait_audio {
            self.wait_for_audio(clips).await
        } else {
            Ok(clips)
        }
    }

    /// Poll until every clip is playable or any has failed.
    ///
    /// Gives up after `wait_timeout`, or on the first failed poll, and
    /// returns the last observed state.
    pub async fn wait_for_audio(&self, clips: Vec<AudioInfo>) -> Result<Vec<AudioInfo>> {
        let query = SongQuery {
            ids: clips.iter().map(|c| c.id.clone()).collect(),
            page: None,
        };
        let poll = self.config().poll_interval;
        let deadline = Instant::now() + self.config().wait_timeout;
        let mut latest = clips;

        loop {
            if is_settled(&latest) {
                return Ok(latest);
            }
            if Instant::now() + poll > deadline {
                warn!(ids = ?query.ids, "audio not ready before wait timeout");
                return Ok(latest);
            }
            sleep(poll).await;
            match self.songs(&query).await {
                Ok(polled) if !polled.is_empty() => latest = polled,
                Ok(_) => {}
                Err(e) => {
                    // The clips exist and are billed; hand back their ids.
                    warn!(ids = ?query.ids, "polling failed, returning last known state: {e}");
                    return Ok(latest);
                }
            }
        }
    }
}

fn is_settled(clips: &[AudioInfo]) -> bool {
    clips.iter().any(|c| c.status == SongStatus::Error)
        || (!clips.is_empty() && clips.iter().all(|c| c.status.is_playable()))
}

fn require(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SunoError::InvalidRequest(format!("{name} is required")));
    }
    Ok(())
}
