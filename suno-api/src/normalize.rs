//! Response normalizer: upstream JSON → stable caller shapes.
//!
//! Upstream clip objects carry most descriptive fields under `metadata`,
//! and omit or blank them while generation is still running:
//!
//! ```json
//! {
//!   "id": "3f1c...", "title": "Night Drive", "status": "streaming",
//!   "audio_url": "https://cdn1.suno.ai/3f1c....mp3", "video_url": "",
//!   "image_url": "https://cdn2.suno.ai/image_3f1c....png",
//!   "model_name": "chirp-v3", "created_at": "2024-05-01T12:00:00.000Z",
//!   "metadata": {
//!     "tags": "synthwave retro", "prompt": "[Verse]\n...",
//!     "gpt_description_prompt": null, "duration": 121.5,
//!     "error_message": null
//!   }
//! }
//! ```
//!
//! Nothing here fails: malformed input degrades to an empty list or the
//! fallback credit snapshot.

use crate::types::{AudioInfo, CreditInfo, Lyrics, SongStatus};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Normalize a song list.
///
/// Accepts a bare array or a `{ "clips": [...] }` envelope and keeps
/// upstream order. Anything else yields an empty list; entries without a
/// string `id` are dropped.
pub fn to_audio_list(raw: &Value) -> Vec<AudioInfo> {
    let items = raw.as_array().or_else(|| raw["clips"].as_array());
    let Some(items) = items else { return vec![] };
    items.iter().filter_map(to_audio_info).collect()
}

/// Normalize a single clip. `None` if it has no usable `id`.
pub fn to_audio_info(v: &Value) -> Option<AudioInfo> {
    let id = v["id"].as_str().filter(|id| !id.is_empty())?;
    let meta = &v["metadata"];

    Some(AudioInfo {
        id: id.to_owned(),
        title: v["title"].as_str().unwrap_or("").to_owned(),
        status: v["status"]
            .as_str()
            .map_or(SongStatus::Unknown, SongStatus::parse),
        tags: field(v, meta, "tags").unwrap_or_default(),
        audio_url: non_empty(&v["audio_url"]),
        video_url: non_empty(&v["video_url"]),
        image_url: non_empty(&v["image_url"]),
        lyric: non_empty(&meta["prompt"]).or_else(|| non_empty(&v["lyric"])),
        gpt_description_prompt: field(v, meta, "gpt_description_prompt"),
        model_name: v["model_name"].as_str().unwrap_or("").to_owned(),
        created_at: v["created_at"].as_str().and_then(parse_timestamp),
        duration: meta["duration"].as_f64().or_else(|| v["duration"].as_f64()),
        error_message: field(v, meta, "error_message"),
    })
}

/// Normalize a billing snapshot.
///
/// Upstream names the balance `total_credits_left`; an already-normalized
/// payload uses `credits_left`. Without either, returns
/// [`CreditInfo::fallback`].
pub fn to_credit(raw: &Value) -> CreditInfo {
    let credits_left = raw["credits_left"]
        .as_i64()
        .or_else(|| raw["total_credits_left"].as_i64());
    let Some(credits_left) = credits_left else {
        return CreditInfo::fallback();
    };

    CreditInfo {
        credits_left,
        period: raw["period"].as_str().unwrap_or("day").to_owned(),
        monthly_limit: raw["monthly_limit"].as_i64().unwrap_or(0),
        monthly_usage: raw["monthly_usage"].as_i64().unwrap_or(0),
        error: None,
    }
}

/// Normalize a lyrics poll response (`{ "text", "title", "status" }`).
pub fn to_lyrics(raw: &Value) -> Lyrics {
    Lyrics {
        title: raw["title"].as_str().unwrap_or("").to_owned(),
        text: raw["text"].as_str().unwrap_or("").to_owned(),
        status: raw["status"].as_str().unwrap_or("").to_owned(),
    }
}

/// Top-level field, else the same key under `metadata`.
fn field(v: &Value, meta: &Value, key: &str) -> Option<String> {
    non_empty(&v[key]).or_else(|| non_empty(&meta[key]))
}

fn non_empty(v: &Value) -> Option<String> {
    v.as_str().filter(|s| !s.is_empty()).map(String::from)
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
