//! End-to-end webhook tests through the axum router

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{app_state, config_for, multipart_body, scrobble_payload, sonarr_episode};
use serde_json::{json, Value};
use sweeparr::config::Config;
use sweeparr::server::{router, AppState};
use sweeparr::sonarr::fake::FakeLibraryManager;
use sweeparr::sonarr::{EpisodeRef, SonarrLibraryManager};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BOUNDARY: &str = "------------------------plexwebhook";

async fn post_multipart(state: &Arc<AppState>, payload: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(BOUNDARY, payload)))
        .unwrap();
    send(state, request).await
}

async fn post_raw(state: &Arc<AppState>, content_type: &str, body: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", content_type)
        .body(Body::from(body.to_string()))
        .unwrap();
    send(state, request).await
}

async fn send(state: &Arc<AppState>, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

fn fake_state(config: Config) -> (Arc<AppState>, Arc<FakeLibraryManager>, tempfile::TempDir) {
    let fake = Arc::new(FakeLibraryManager::new());
    let (state, tmp) = app_state(config, fake.clone());
    (state, fake, tmp)
}

fn grace(days: i64) -> Config {
    Config {
        grace_days: Some(days),
        ..Config::default()
    }
}

#[tokio::test]
async fn test_zero_grace_scrobble_deletes_through_sonarr() {
    let sonarr = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/series"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 7, "title": "Foo"}])))
        .expect(1)
        .mount(&sonarr)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/episode"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([sonarr_episode(11, 1, 2, 99, true)])),
        )
        .expect(1)
        .mount(&sonarr)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v3/episodefile/99"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&sonarr)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v3/episode/11"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&sonarr)
        .await;

    let (state, _tmp) = app_state(
        config_for(&sonarr.uri(), 0, &[]),
        Arc::new(SonarrLibraryManager::new()),
    );

    let payload = scrobble_payload("Foo", 1, 2, "abc").to_string();
    let (status, body) = post_multipart(&state, &payload).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());

    let event = state.store.get("abc").unwrap().unwrap();
    assert_eq!(event.series, "Foo");
    assert_eq!((event.season, event.episode), (1, 2));
    assert_eq!(event.watched_at, 1_700_000_000);
}

#[tokio::test]
async fn test_grace_period_records_without_calling_sonarr() {
    let sonarr = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&sonarr)
        .await;

    let (state, _tmp) = app_state(
        config_for(&sonarr.uri(), 2, &[("Foo", 0)]),
        Arc::new(SonarrLibraryManager::new()),
    );

    let payload = scrobble_payload("Bar", 3, 4, "bar-3-4").to_string();
    let (status, _) = post_multipart(&state, &payload).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(state.store.count().unwrap(), 1);
}

#[tokio::test]
async fn test_repeated_scrobble_is_stored_once() {
    let (state, fake, _tmp) = fake_state(grace(2));
    let payload = scrobble_payload("Foo", 1, 2, "abc").to_string();

    post_multipart(&state, &payload).await;
    let (status, _) = post_multipart(&state, &payload).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(state.store.count().unwrap(), 1);
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn test_case_insensitive_override_triggers_deletion() {
    let mut config = grace(5);
    config.series_settings.insert(
        "the expanse",
        sweeparr::SeriesSettings {
            grace_days: Some(0),
        },
    );
    let (state, fake, _tmp) = fake_state(config);

    let payload = scrobble_payload("The Expanse", 2, 5, "exp").to_string();
    post_multipart(&state, &payload).await;

    assert_eq!(fake.calls(), vec![EpisodeRef::new("The Expanse", 2, 5)]);
}

#[tokio::test]
async fn test_raw_json_body_is_accepted() {
    let (state, fake, _tmp) = fake_state(grace(0));
    let payload = scrobble_payload("Foo", 1, 2, "abc").to_string();

    let (status, _) = post_raw(&state, "application/json", &payload).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(state.store.count().unwrap(), 1);
    assert_eq!(fake.calls().len(), 1);
}

#[tokio::test]
async fn test_reloaded_policy_applies_to_next_event() {
    let (state, fake, _tmp) = fake_state(grace(2));

    post_multipart(&state, &scrobble_payload("Foo", 1, 1, "k1").to_string()).await;
    assert!(fake.calls().is_empty());

    state.config.replace(grace(0));
    post_multipart(&state, &scrobble_payload("Foo", 1, 2, "k2").to_string()).await;
    assert_eq!(fake.calls(), vec![EpisodeRef::new("Foo", 1, 2)]);
}

#[tokio::test]
async fn test_unusable_payloads_still_answer_ok() {
    let (state, fake, _tmp) = fake_state(grace(0));

    let cases: Vec<(&str, String)> = vec![
        ("application/json", String::new()),
        ("application/json", "{}".to_string()),
        ("application/json", "{not json".to_string()),
        ("text/plain", "hello".to_string()),
        ("application/json", "[1, 2]".to_string()),
    ];

    for (content_type, body) in cases {
        let (status, response_body) = post_raw(&state, content_type, &body).await;
        assert_eq!(status, StatusCode::OK, "body: {:?}", body);
        assert!(response_body.is_empty());
    }

    let (status, _) = post_multipart(&state, "not json at all").await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(state.store.count().unwrap(), 0);
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn test_multipart_without_payload_field_is_ignored() {
    let (state, fake, _tmp) = fake_state(grace(0));
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"thumb\"; filename=\"t.jpg\"\r\n\
         Content-Type: image/jpeg\r\n\r\nxyz\r\n--{b}--\r\n",
        b = BOUNDARY
    );
    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, _) = send(&state, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state.store.count().unwrap(), 0);
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn test_non_scrobble_and_non_show_events_are_ignored() {
    let (state, fake, _tmp) = fake_state(grace(0));

    let mut play = scrobble_payload("Foo", 1, 2, "play");
    play["event"] = json!("media.play");
    let mut movie = scrobble_payload("Some Movie", 0, 0, "movie");
    movie["Metadata"]["librarySectionType"] = json!("movie");

    for payload in [play, movie] {
        let (status, _) = post_multipart(&state, &payload.to_string()).await;
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(state.store.count().unwrap(), 0);
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn test_sonarr_failure_still_answers_ok_and_keeps_record() {
    let sonarr = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/series"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&sonarr)
        .await;

    let (state, _tmp) = app_state(
        config_for(&sonarr.uri(), 0, &[]),
        Arc::new(SonarrLibraryManager::new()),
    );

    let (status, _) =
        post_multipart(&state, &scrobble_payload("Foo", 1, 2, "abc").to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert!(state.store.get("abc").unwrap().is_some());
}

#[tokio::test]
async fn test_health_reports_ok() {
    let (state, _fake, _tmp) = fake_state(grace(2));
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&state, request).await;
    assert_eq!(status, StatusCode::OK);

    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_webhook_rejects_get() {
    let (state, _fake, _tmp) = fake_state(grace(2));
    let request = Request::builder()
        .uri("/webhook")
        .body(Body::empty())
        .unwrap();

    let (status, _) = send(&state, request).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
