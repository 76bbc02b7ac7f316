use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};
use sweeparr::config::{Config, SeriesSettings, SonarrConfig};
use sweeparr::reload::ConfigStore;
use sweeparr::server::AppState;
use sweeparr::sonarr::LibraryManager;
use sweeparr::storage::WatchedStore;
use tempfile::TempDir;

#[allow(dead_code)]
pub fn create_temp_store() -> (WatchedStore, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let store = WatchedStore::new(tmp.path().join("watched.db")).expect("failed to create store");
    (store, tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.json");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Config pointing at `sonarr_url` with the given global grace period
#[allow(dead_code)]
pub fn config_for(sonarr_url: &str, grace_days: i64, overrides: &[(&str, i64)]) -> Config {
    let mut config = Config {
        sonarr: Some(SonarrConfig {
            url: sonarr_url.to_string(),
            api_key: "test-key".to_string(),
        }),
        grace_days: Some(grace_days),
        ..Config::default()
    };
    for (series, days) in overrides {
        config.series_settings.insert(
            *series,
            SeriesSettings {
                grace_days: Some(*days),
            },
        );
    }
    config
}

/// App state over a fresh store; the TempDir must outlive the state
#[allow(dead_code)]
pub fn app_state(config: Config, library: Arc<dyn LibraryManager>) -> (Arc<AppState>, TempDir) {
    let (store, tmp) = create_temp_store();
    let config_store = Arc::new(ConfigStore::with_config(
        tmp.path().join("config.json"),
        config,
    ));
    (Arc::new(AppState::new(config_store, store, library)), tmp)
}

/// Plex scrobble payload for an episode
#[allow(dead_code)]
pub fn scrobble_payload(series: &str, season: i64, episode: i64, rating_key: &str) -> Value {
    json!({
        "event": "media.scrobble",
        "Account": {"title": "viewer"},
        "Metadata": {
            "librarySectionType": "show",
            "type": "episode",
            "grandparentTitle": series,
            "parentIndex": season,
            "index": episode,
            "ratingKey": rating_key,
            "lastViewedAt": 1_700_000_000
        }
    })
}

/// Multipart body the way Plex sends it: JSON in `payload`, then a thumbnail
#[allow(dead_code)]
pub fn multipart_body(boundary: &str, payload: &str) -> String {
    format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"payload\"\r\n\
         Content-Type: application/json\r\n\r\n\
         {payload}\r\n\
         --{b}\r\n\
         Content-Disposition: form-data; name=\"thumb\"; filename=\"thumb.jpg\"\r\n\
         Content-Type: image/jpeg\r\n\r\n\
         not-really-a-jpeg\r\n\
         --{b}--\r\n",
        b = boundary,
        payload = payload
    )
}

/// Sonarr episode resource as returned by `GET /api/v3/episode`
#[allow(dead_code)]
pub fn sonarr_episode(id: i64, season: i64, episode: i64, file_id: i64, has_file: bool) -> Value {
    json!({
        "id": id,
        "seriesId": 7,
        "episodeFileId": file_id,
        "seasonNumber": season,
        "episodeNumber": episode,
        "title": "Pilot",
        "hasFile": has_file,
        "monitored": true
    })
}
