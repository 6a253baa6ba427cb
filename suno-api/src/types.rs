//! Data types shared by the client, the normalizer and callers.
//!
//! These are the stable shapes handed to callers, not mirrors of the raw
//! upstream JSON; see [`normalize`](crate::normalize) for the mapping.
//! They serialize with the snake_case field names UI code expects, and
//! absent optional fields are omitted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Generation status of a song.
///
/// Observed, not driven, by the client:
/// `submitted → queued → streaming → complete`, or `error` from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SongStatus {
    Submitted,
    Queued,
    Streaming,
    Complete,
    Error,
    /// Any status string this client does not know about.
    #[serde(other)]
    Unknown,
}

impl SongStatus {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "submitted" => Self::Submitted,
            "queued" => Self::Queued,
            "streaming" => Self::Streaming,
            "complete" => Self::Complete,
            "error" => Self::Error,
            _ => Self::Unknown,
        }
    }

    /// Audio can be played (possibly still growing).
    pub fn is_playable(self) -> bool {
        matches!(self, Self::Streaming | Self::Complete)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Queued => "queued",
            Self::Streaming => "streaming",
            Self::Complete => "complete",
            Self::Error => "error",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SongStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A generated song (Suno calls it a clip).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioInfo {
    pub id: String,
    pub title: String,
    pub status: SongStatus,
    /// Space-separated style tags.
    pub tags: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Lyrics the song was generated from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lyric: Option<String>,
    /// Free-form description used in non-custom generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpt_description_prompt: Option<String>,
    pub model_name: String,
    /// Absent if upstream omitted it or sent an unparseable value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Length in seconds, once known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AudioInfo {
    pub fn tag_list(&self) -> impl Iterator<Item = &str> {
        self.tags.split_whitespace()
    }
}

/// Account credit snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditInfo {
    pub credits_left: i64,
    /// Billing period, e.g. `day` or `month`.
    pub period: String,
    pub monthly_limit: i64,
    pub monthly_usage: i64,
    /// Set only on the fallback snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CreditInfo {
    /// Stand-in returned when the real snapshot cannot be obtained, so the
    /// caller can render a "setup required" state.
    pub fn fallback() -> Self {
        Self {
            credits_left: 0,
            period: "day".to_owned(),
            monthly_limit: 50,
            monthly_usage: 0,
            error: Some(crate::error::NOT_CONFIGURED.to_owned()),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.error.is_some()
    }
}

/// Generated lyrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lyrics {
    pub title: String,
    pub text: String,
    pub status: String,
}

/// Parameters for description-mode generation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// What the song should be about; upstream writes the lyrics.
    pub prompt: String,
    #[serde(default)]
    pub make_instrumental: bool,
    /// Block until audio is playable (bounded by the configured wait).
    #[serde(default)]
    pub wait_audio: bool,
}

/// Parameters for custom-mode generation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomGenerateRequest {
    /// Full lyrics.
    pub prompt: String,
    /// Style tags, e.g. `"lofi chill piano"`.
    pub tags: String,
    pub title: String,
    #[serde(default)]
    pub make_instrumental: bool,
    #[serde(default)]
    pub wait_audio: bool,
}

/// Parameters for continuing an existing clip.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtendRequest {
    pub clip_id: String,
    /// Position in seconds to continue from; `None` continues at the end.
    #[serde(default)]
    pub continue_at: Option<f64>,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub title: String,
}

/// Library page query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SongQuery {
    /// Restrict to these clip ids; empty means the whole library.
    #[serde(default)]
    pub ids: Vec<String>,
    #[serde(default)]
    pub page: Option<String>,
}

impl SongQuery {
    /// Build from the comma-separated `ids` form used by HTTP callers.
    pub fn from_params(ids: Option<&str>, page: Option<&str>) -> Self {
        let ids = ids
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        Self {
            ids,
            page: page.map(str::trim).filter(|p| !p.is_empty()).map(String::from),
        }
    }
}
