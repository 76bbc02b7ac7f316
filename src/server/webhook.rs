//! Plex webhook receiver
//!
//! Processing stops at the first step that does not apply:
//!
//! 1. Decode the payload: the `payload` field of a multipart form, or the raw
//!    body as JSON. An empty payload is logged and ignored.
//! 2. Ignore every event other than `media.scrobble`.
//! 3. Ignore media whose library section is not `show`.
//! 4. Record the watched episode (idempotent on the rating key).
//! 5. Evaluate the grace-period policy and, when it says "now", run the
//!    deletion workflow inline.
//!
//! The media server always gets `200 OK` with an empty body. Failures are
//! logged and never turned into error responses, so Plex does not retry.

use std::sync::Arc;

use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::{header, StatusCode};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::error::{Result, SweeparrError};
use crate::policy::{self, GraceSource, PolicyDecision};
use crate::server::{AppState, MAX_BODY_BYTES};
use crate::sonarr::{DeletionOutcome, EpisodeRef};
use crate::storage::{RecordOutcome, WatchedEvent};

/// The only event type acted upon
pub const SCROBBLE_EVENT: &str = "media.scrobble";

/// The only library section type acted upon
pub const SHOW_SECTION: &str = "show";

/// Name of the multipart field holding the JSON payload
pub const PAYLOAD_FIELD: &str = "payload";

/// Webhook body as sent by Plex (only the fields used here)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlexWebhook {
    #[serde(default)]
    pub event: Option<String>,

    #[serde(rename = "Metadata", default)]
    pub metadata: Option<PlexMetadata>,
}

/// `Metadata` object of a Plex webhook
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlexMetadata {
    #[serde(default)]
    pub library_section_type: Option<String>,

    /// Series title for episodes
    #[serde(default)]
    pub grandparent_title: Option<String>,

    /// Season number for episodes
    #[serde(default)]
    pub parent_index: Option<i64>,

    /// Episode number for episodes
    #[serde(default)]
    pub index: Option<i64>,

    #[serde(default, deserialize_with = "string_or_number")]
    pub rating_key: Option<String>,

    #[serde(default)]
    pub last_viewed_at: Option<i64>,
}

impl PlexMetadata {
    /// Build the event to record, or `None` when the title, season, or
    /// episode is missing. The series title is trimmed; `watched_at` falls
    /// back to `now`.
    pub fn to_watched_event(&self, now: i64) -> Option<WatchedEvent> {
        let series = self.grandparent_title.as_deref()?.trim().to_string();
        Some(WatchedEvent {
            rating_key: self.rating_key.clone(),
            series,
            season: self.parent_index?,
            episode: self.index?,
            watched_at: self.last_viewed_at.unwrap_or(now),
        })
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// What happened to one webhook call
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    /// Missing or empty payload
    EmptyPayload,
    /// Event type other than `media.scrobble`
    IgnoredEvent(Option<String>),
    /// Library section other than `show`
    IgnoredMedia(Option<String>),
    /// Scrobble without series title, season, or episode
    IncompleteMetadata,
    /// Scrobble recorded and the policy evaluated
    Processed {
        event: WatchedEvent,
        record: RecordOutcome,
        decision: PolicyDecision,
        deletion: Option<DeletionOutcome>,
    },
}

/// `POST /webhook`
pub async fn webhook(State(state): State<Arc<AppState>>, request: Request) -> StatusCode {
    let result = async {
        let payload = read_payload(request).await?;
        process_payload(&state, payload).await
    }
    .await;

    match result {
        Ok(outcome) => debug!(?outcome, "Webhook handled"),
        Err(e) => error!("Exception in webhook: {:#}", e),
    }

    StatusCode::OK
}

/// Extract the JSON payload from a multipart form or a raw JSON body
pub async fn read_payload(request: Request) -> Result<Option<Value>> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.contains("multipart/form-data"))
        .unwrap_or(false);

    if is_multipart {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| SweeparrError::Webhook(format!("Invalid multipart body: {}", e)))?;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| SweeparrError::Webhook(format!("Invalid multipart field: {}", e)))?
        {
            if field.name() == Some(PAYLOAD_FIELD) {
                let text = field.text().await.map_err(|e| {
                    SweeparrError::Webhook(format!("Unreadable payload field: {}", e))
                })?;
                return decode_payload(&text);
            }
        }

        Ok(None)
    } else {
        let bytes = axum::body::to_bytes(request.into_body(), MAX_BODY_BYTES)
            .await
            .map_err(|e| SweeparrError::Webhook(format!("Unreadable request body: {}", e)))?;
        let text = std::str::from_utf8(&bytes)
            .map_err(|e| SweeparrError::Webhook(format!("Request body is not UTF-8: {}", e)))?;
        decode_payload(text)
    }
}

/// Parse payload text; blank text and empty JSON values decode to `None`
pub fn decode_payload(text: &str) -> Result<Option<Value>> {
    if text.trim().is_empty() {
        return Ok(None);
    }

    let value: Value = serde_json::from_str(text)
        .map_err(|e| SweeparrError::Webhook(format!("Payload is not valid JSON: {}", e)))?;

    let empty = match &value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    };

    Ok(if empty { None } else { Some(value) })
}

/// Run a decoded payload through filtering, persistence, and policy
pub async fn process_payload(state: &AppState, payload: Option<Value>) -> Result<WebhookOutcome> {
    let Some(payload) = payload else {
        warn!("No payload received");
        return Ok(WebhookOutcome::EmptyPayload);
    };

    let webhook: PlexWebhook = serde_json::from_value(payload)
        .map_err(|e| SweeparrError::Webhook(format!("Unexpected payload shape: {}", e)))?;

    info!(
        "Event received: {}",
        webhook.event.as_deref().unwrap_or("<none>")
    );

    if webhook.event.as_deref() != Some(SCROBBLE_EVENT) {
        return Ok(WebhookOutcome::IgnoredEvent(webhook.event));
    }

    let metadata = webhook.metadata.unwrap_or_default();
    if metadata.library_section_type.as_deref() != Some(SHOW_SECTION) {
        info!("Ignored non-show media item");
        return Ok(WebhookOutcome::IgnoredMedia(metadata.library_section_type));
    }

    let Some(event) = metadata.to_watched_event(chrono::Utc::now().timestamp()) else {
        warn!(
            rating_key = ?metadata.rating_key,
            "Scrobble is missing series, season, or episode; skipping"
        );
        return Ok(WebhookOutcome::IncompleteMetadata);
    };

    info!(
        rating_key = ?event.rating_key,
        "Scrobbled: {} S{}E{}",
        event.series,
        event.season,
        event.episode
    );

    let store = state.store.clone();
    let to_record = event.clone();
    let record = tokio::task::spawn_blocking(move || store.record(&to_record)).await??;
    if record == RecordOutcome::Duplicate {
        debug!(rating_key = ?event.rating_key, "Already recorded; keeping first entry");
    }

    let config = state.config.get();
    let decision = policy::evaluate(&event.series, &config);
    match &decision.source {
        GraceSource::ExactOverride => {
            info!(grace_days = ?decision.grace_days, "Override found for '{}'", event.series)
        }
        GraceSource::CaseInsensitiveOverride(key) => info!(
            grace_days = ?decision.grace_days,
            "Override found for '{}' (matched '{}')",
            event.series,
            key
        ),
        GraceSource::Global => info!(
            grace_days = ?decision.grace_days,
            "No override found for '{}', using global default",
            event.series
        ),
    }

    let deletion = if decision.delete_now() {
        let target = EpisodeRef::new(event.series.clone(), event.season, event.episode);
        let outcome = state.library.delete_episode(&target, &config).await;
        info!(episode = %target, ?outcome, "Deletion workflow finished");
        Some(outcome)
    } else {
        None
    };

    Ok(WebhookOutcome::Processed {
        event,
        record,
        decision,
        deletion,
    })
}
