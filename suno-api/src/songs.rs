//! Library and clip APIs.
//!
//! # Endpoints
//!
//! ## `songs`: `GET /api/feed/v2?ids=a,b&page=0`
//!
//! Both query parameters are optional; without `ids` the whole library is
//! paged, newest first. Response:
//! ```json
//! { "clips": [ { "id": "...", "status": "complete", ... } ], "num_total_results": 42 }
//! ```
//!
//! ## `clip`: `GET /api/clip/{id}`
//!
//! Returns a single clip object in the same shape.

use crate::client::{ApiRequest, SunoClient};
use crate::error::{Result, SunoError};
use crate::normalize::{to_audio_info, to_audio_list};
use crate::types::{AudioInfo, SongQuery};

impl SunoClient {
    /// Fetch songs by id, or a page of the library if `query.ids` is empty.
    ///
    /// Upstream order is preserved. A payload that is not a clip list
    /// yields an empty list.
    pub async fn songs(&self, query: &SongQuery) -> Result<Vec<AudioInfo>> {
        let resp = self.execute(&ApiRequest::get(feed_path(query))).await?;
        Ok(to_audio_list(&resp))
    }

    /// Fetch full details of one clip.
    pub async fn clip(&self, id: &str) -> Result<AudioInfo> {
        let id = id.trim();
        if id.is_empty() {
            return Err(SunoError::InvalidRequest("clip id is required".into()));
        }
        let path = format!("/api/clip/{}", urlencoding::encode(id));
        let resp = self.execute(&ApiRequest::get(path)).await?;
        to_audio_info(&resp).ok_or_else(|| SunoError::Upstream {
            status: 200,
            message: format!("clip response for {id} has no id"),
        })
    }
}

fn feed_path(query: &SongQuery) -> String {
    let mut params = Vec::new();
    if !query.ids.is_empty() {
        params.push(format!("ids={}", urlencoding::encode(&query.ids.join(","))));
    }
    if let Some(page) = &query.page {
        params.push(format!("page={}", urlencoding::encode(page)));
    }
    if params.is_empty() {
        "/api/feed/v2".to_owned()
    } else {
        format!("/api/feed/v2?{}", params.join("&"))
    }
}
