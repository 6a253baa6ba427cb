mod common;

use common::{Harness, MockTransport, Reply, clip, jwt, script_clerk};
use futures::future::join_all;
use serde_json::json;
use std::time::Duration;
use suno_api::transport::Method;
use suno_api::{
    CustomGenerateRequest, ExtendRequest, GenerateRequest, SongQuery, SongStatus, SunoError,
};

const FEED: &str = "/api/feed/v2";
const GENERATE: &str = "/api/generate/v2/";

#[tokio::test]
async fn complete_song_is_returned_with_absent_fields_marked() {
    let mock = MockTransport::new();
    script_clerk(&mock, None);
    mock.on(
        Method::Get,
        FEED,
        vec![Reply::Json(
            200,
            json!([{
                "id": "abc",
                "title": "Sunrise",
                "status": "complete",
                "audio_url": "https://cdn1.suno.ai/abc.mp3",
                "model_name": "chirp-v3"
            }]),
        )],
    );
    let h = Harness::new(mock);

    let songs = h.client().songs(&SongQuery::default()).await.unwrap();

    assert_eq!(songs.len(), 1);
    assert_eq!(songs[0].status, SongStatus::Complete);
    assert_eq!(songs[0].audio_url.as_deref(), Some("https://cdn1.suno.ai/abc.mp3"));
    assert_eq!(songs[0].error_message, None);
    assert_eq!(songs[0].video_url, None);
}

#[tokio::test]
async fn request_carries_bearer_token_and_query() {
    let mock = MockTransport::new();
    script_clerk(&mock, None);
    mock.on(Method::Get, FEED, vec![Reply::Json(200, json!({ "clips": [] }))]);
    let h = Harness::new(mock);

    let query = SongQuery::from_params(Some("a,b"), Some("3"));
    h.client().songs(&query).await.unwrap();

    let req = &h.mock.requests_to(Method::Get, FEED)[0];
    assert_eq!(req.url, "https://studio.test/api/feed/v2?ids=a%2Cb&page=3");
    assert_eq!(req.header_value("authorization"), Some(format!("Bearer {}", jwt(None, 1)).as_str()));
}

#[tokio::test]
async fn expired_mid_session_recovers_with_one_refresh_and_one_retry() {
    let mock = MockTransport::new();
    script_clerk(&mock, None);
    mock.on(
        Method::Get,
        FEED,
        vec![
            Reply::Json(200, json!([clip("a", "complete")])),
            Reply::Json(401, json!({ "detail": "Unauthorized" })),
            Reply::Json(200, json!([clip("a", "complete"), clip("b", "streaming")])),
        ],
    );
    let h = Harness::new(mock);
    let client = h.client();

    client.songs(&SongQuery::default()).await.unwrap();
    let feed_before = h.mock.calls_to(Method::Get, FEED);
    let tokens_before = h.token_calls();

    let songs = client.songs(&SongQuery::default()).await.unwrap();

    assert_eq!(songs.len(), 2);
    assert_eq!(h.mock.calls_to(Method::Get, FEED) - feed_before, 2, "failed + retried");
    assert_eq!(h.token_calls() - tokens_before, 1, "one refresh");
    assert_eq!(h.client_calls(), 1);

    let feed = h.mock.requests_to(Method::Get, FEED);
    assert_ne!(
        feed[1].header_value("Authorization"),
        feed[2].header_value("Authorization"),
        "retry uses the refreshed token"
    );
}

#[tokio::test]
async fn second_rejection_is_surfaced_not_retried() {
    let mock = MockTransport::new();
    script_clerk(&mock, None);
    mock.on(Method::Get, FEED, vec![Reply::Json(401, json!({ "detail": "Unauthorized" }))]);
    let h = Harness::new(mock);

    let err = h.client().songs(&SongQuery::default()).await.unwrap_err();

    assert!(matches!(err, SunoError::Authentication { .. }), "{err:?}");
    assert_eq!(h.mock.calls_to(Method::Get, FEED), 2);
    assert_eq!(h.token_calls(), 2);
}

#[tokio::test]
async fn forbidden_is_treated_like_unauthorized() {
    let mock = MockTransport::new();
    script_clerk(&mock, None);
    mock.on(
        Method::Get,
        "/api/billing/info/",
        vec![
            Reply::Json(403, json!({ "detail": "Forbidden" })),
            Reply::Json(200, json!({ "total_credits_left": 7, "period": "day", "monthly_limit": 50, "monthly_usage": 43 })),
        ],
    );
    let h = Harness::new(mock);

    let credits = h.client().credits().await.unwrap();

    assert_eq!(credits.credits_left, 7);
    assert_eq!(credits.monthly_usage, 43);
    assert_eq!(h.token_calls(), 2);
}

#[tokio::test]
async fn concurrent_rejections_share_one_refresh() {
    let mock = MockTransport::with_delay(Duration::from_millis(20));
    script_clerk(&mock, None);
    let first_token = format!("Bearer {}", jwt(None, 1));
    mock.on_fn(Method::Get, FEED, move |req| {
        if req.header_value("Authorization") == Some(first_token.as_str()) {
            Reply::Json(401, json!({ "detail": "Unauthorized" }))
        } else {
            Reply::Json(200, json!([clip("a", "complete")]))
        }
    });
    let h = Harness::new(mock);

    let query = SongQuery::default();
    let clients: Vec<_> = (0..5).map(|_| h.client()).collect();
    let results = join_all(clients.iter().map(|c| c.songs(&query))).await;

    assert!(results.iter().all(|r| r.as_ref().is_ok_and(|s| s.len() == 1)));
    assert_eq!(h.token_calls(), 2, "initial token plus one shared refresh");
    assert_eq!(h.mock.calls_to(Method::Get, FEED), 10);
}

#[tokio::test]
async fn server_error_is_upstream_error_with_snippet() {
    let mock = MockTransport::new();
    script_clerk(&mock, None);
    mock.on(
        Method::Get,
        FEED,
        vec![Reply::Text(502, "<html>bad gateway</html>".into())],
    );
    let h = Harness::new(mock);

    let err = h.client().songs(&SongQuery::default()).await.unwrap_err();

    match err {
        SunoError::Upstream { status, message } => {
            assert_eq!(status, 502);
            assert!(message.contains("bad gateway"), "{message}");
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
    assert_eq!(h.mock.calls_to(Method::Get, FEED), 1);
    assert_eq!(h.token_calls(), 1);
}

#[tokio::test]
async fn network_failure_is_transient_and_not_retried() {
    let mock = MockTransport::new();
    script_clerk(&mock, None);
    mock.on(Method::Post, GENERATE, vec![Reply::Fail("operation timed out".into())]);
    let h = Harness::new(mock);

    let req = GenerateRequest {
        prompt: "a calm piano piece".into(),
        ..GenerateRequest::default()
    };
    let err = h.client().generate(&req).await.unwrap_err();

    assert!(matches!(err, SunoError::Transient(_)), "{err:?}");
    assert_eq!(h.mock.calls_to(Method::Post, GENERATE), 1);
}

#[tokio::test]
async fn malformed_success_body_is_upstream_error() {
    let mock = MockTransport::new();
    script_clerk(&mock, None);
    mock.on(Method::Get, FEED, vec![Reply::Text(200, "<!doctype html>".into())]);
    let h = Harness::new(mock);

    let err = h.client().songs(&SongQuery::default()).await.unwrap_err();
    assert!(matches!(err, SunoError::Upstream { status: 200, .. }), "{err:?}");
}

#[tokio::test]
async fn unexpected_shape_yields_empty_list() {
    let mock = MockTransport::new();
    script_clerk(&mock, None);
    mock.on(Method::Get, FEED, vec![Reply::Json(200, json!({ "detail": "nothing here" }))]);
    let h = Harness::new(mock);

    assert!(h.client().songs(&SongQuery::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn generate_sends_description_and_returns_submitted_clips() {
    let mock = MockTransport::new();
    script_clerk(&mock, None);
    mock.on(
        Method::Post,
        GENERATE,
        vec![Reply::Json(
            200,
            json!({ "id": "batch", "clips": [clip("x", "submitted"), clip("y", "submitted")] }),
        )],
    );
    let h = Harness::new(mock);

    let req = GenerateRequest {
        prompt: "a song about rain".into(),
        make_instrumental: true,
        wait_audio: false,
    };
    let songs = h.client().generate(&req).await.unwrap();

    assert_eq!(songs.len(), 2);
    assert!(songs.iter().all(|s| s.status == SongStatus::Submitted));
    let body = h.mock.requests_to(Method::Post, GENERATE)[0].body.clone().unwrap();
    assert_eq!(body["gpt_description_prompt"], "a song about rain");
    assert_eq!(body["make_instrumental"], true);
    assert_eq!(body["mv"], "chirp-v3-5");
    assert_eq!(h.mock.calls_to(Method::Get, FEED), 0, "no polling without wait_audio");
}

#[tokio::test]
async fn wait_audio_polls_until_streaming() {
    let mock = MockTransport::new();
    script_clerk(&mock, None);
    mock.on(
        Method::Post,
        GENERATE,
        vec![Reply::Json(200, json!({ "clips": [clip("x", "submitted"), clip("y", "submitted")] }))],
    );
    mock.on(
        Method::Get,
        FEED,
        vec![
            Reply::Json(200, json!([clip("x", "queued"), clip("y", "queued")])),
            Reply::Json(200, json!([clip("x", "streaming"), clip("y", "queued")])),
            Reply::Json(200, json!([clip("x", "complete"), clip("y", "streaming")])),
        ],
    );
    let h = Harness::new(mock);

    let req = CustomGenerateRequest {
        prompt: "[Verse]\nla la".into(),
        tags: "pop".into(),
        title: "La".into(),
        make_instrumental: false,
        wait_audio: true,
    };
    let songs = h.client().custom_generate(&req).await.unwrap();

    assert_eq!(songs[0].status, SongStatus::Complete);
    assert_eq!(songs[1].status, SongStatus::Streaming);
    assert_eq!(h.mock.calls_to(Method::Get, FEED), 3);
    let poll = &h.mock.requests_to(Method::Get, FEED)[0];
    assert!(poll.url.ends_with("?ids=x%2Cy"), "{}", poll.url);
    let body = h.mock.requests_to(Method::Post, GENERATE)[0].body.clone().unwrap();
    assert_eq!(body["title"], "La");
    assert_eq!(body["tags"], "pop");
}

#[tokio::test]
async fn wait_audio_stops_on_error_status() {
    let mock = MockTransport::new();
    script_clerk(&mock, None);
    mock.on(Method::Post, GENERATE, vec![Reply::Json(200, json!({ "clips": [clip("x", "submitted")] }))]);
    mock.on(Method::Get, FEED, vec![Reply::Json(200, json!([clip("x", "error")]))]);
    let h = Harness::new(mock);

    let req = GenerateRequest {
        prompt: "anything".into(),
        make_instrumental: false,
        wait_audio: true,
    };
    let songs = h.client().generate(&req).await.unwrap();

    assert_eq!(songs[0].status, SongStatus::Error);
    assert_eq!(h.mock.calls_to(Method::Get, FEED), 1);
}

#[tokio::test]
async fn wait_audio_gives_up_with_last_state() {
    let mock = MockTransport::new();
    script_clerk(&mock, None);
    mock.on(Method::Post, GENERATE, vec![Reply::Json(200, json!({ "clips": [clip("x", "submitted")] }))]);
    mock.on(Method::Get, FEED, vec![Reply::Json(200, json!([clip("x", "queued")]))]);
    let h = Harness::new(mock);

    let req = GenerateRequest {
        prompt: "anything".into(),
        make_instrumental: false,
        wait_audio: true,
    };
    let songs = h.client().generate(&req).await.unwrap();

    assert_eq!(songs[0].status, SongStatus::Queued);
    assert!(h.mock.calls_to(Method::Get, FEED) >= 1);
}

#[tokio::test]
async fn failed_poll_returns_submitted_clips() {
    let mock = MockTransport::new();
    script_clerk(&mock, None);
    mock.on(
        Method::Post,
        GENERATE,
        vec![Reply::Json(200, json!({ "clips": [clip("x", "submitted"), clip("y", "submitted")] }))],
    );
    mock.on(Method::Get, FEED, vec![Reply::Fail("connection reset".into())]);
    let h = Harness::new(mock);

    let req = GenerateRequest {
        prompt: "anything".into(),
        make_instrumental: false,
        wait_audio: true,
    };
    let songs = h.client().generate(&req).await.unwrap();

    let ids: Vec<_> = songs.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["x", "y"]);
    assert_eq!(songs[0].status, SongStatus::Submitted);
    assert_eq!(h.mock.calls_to(Method::Post, GENERATE), 1);
    assert_eq!(h.mock.calls_to(Method::Get, FEED), 1);
}

#[tokio::test]
async fn custom_generate_validates_before_sending() {
    let h = Harness::new(MockTransport::new());

    let req = CustomGenerateRequest {
        prompt: "lyrics".into(),
        tags: "rock".into(),
        title: "   ".into(),
        ..CustomGenerateRequest::default()
    };
    let err = h.client().custom_generate(&req).await.unwrap_err();

    assert!(matches!(err, SunoError::InvalidRequest(ref m) if m.contains("title")));
    assert_eq!(h.mock.total_calls(), 0);
}

#[tokio::test]
async fn extend_audio_posts_continuation() {
    let mock = MockTransport::new();
    script_clerk(&mock, None);
    mock.on(Method::Post, GENERATE, vec![Reply::Json(200, json!({ "clips": [clip("ext", "submitted")] }))]);
    let h = Harness::new(mock);

    let req = ExtendRequest {
        clip_id: "abc".into(),
        continue_at: Some(42.5),
        ..ExtendRequest::default()
    };
    let songs = h.client().extend_audio(&req).await.unwrap();

    assert_eq!(songs[0].id, "ext");
    let body = h.mock.requests_to(Method::Post, GENERATE)[0].body.clone().unwrap();
    assert_eq!(body["continue_clip_id"], "abc");
    assert_eq!(body["continue_at"], 42.5);
    assert_eq!(body["task"], "extend");
}

#[tokio::test]
async fn clip_fetches_single_clip() {
    let mock = MockTransport::new();
    script_clerk(&mock, None);
    mock.on(Method::Get, "/api/clip/abc", vec![Reply::Json(200, clip("abc", "streaming"))]);
    let h = Harness::new(mock);

    let song = h.client().clip("abc").await.unwrap();
    assert_eq!(song.title, "Song abc");
    assert_eq!(song.tags, "pop upbeat");
}

#[tokio::test]
async fn billing_without_balance_is_upstream_error() {
    let mock = MockTransport::new();
    script_clerk(&mock, None);
    mock.on(Method::Get, "/api/billing/info/", vec![Reply::Json(200, json!({ "period": "day" }))]);
    let h = Harness::new(mock);

    let err = h.client().credits().await.unwrap_err();
    assert!(matches!(err, SunoError::Upstream { .. }), "{err:?}");
}

#[tokio::test]
async fn lyrics_are_polled_until_complete() {
    let mock = MockTransport::new();
    script_clerk(&mock, None);
    mock.on(Method::Post, "/api/generate/lyrics/", vec![Reply::Json(200, json!({ "id": "lyr1" }))]);
    mock.on(
        Method::Get,
        "/api/generate/lyrics/lyr1",
        vec![
            Reply::Json(200, json!({ "text": "", "title": "", "status": "running" })),
            Reply::Json(200, json!({ "text": "[Verse]\nwaves", "title": "Salt", "status": "complete" })),
        ],
    );
    let h = Harness::new(mock);

    let lyrics = h.client().generate_lyrics("the sea").await.unwrap();

    assert_eq!(lyrics.title, "Salt");
    assert_eq!(lyrics.text, "[Verse]\nwaves");
    assert_eq!(h.mock.calls_to(Method::Get, "/api/generate/lyrics/lyr1"), 2);
}
