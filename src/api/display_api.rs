use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{DisplayStatus, MediaType};
use crate::services::resolver;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    #[serde(rename = "displayId")]
    pub display_id: Option<String>,
}

/// Descriptor served to display devices on every poll. Field names follow
/// the device wire protocol (camelCase).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playlist_items: Option<Vec<ResolvedItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub single_media: Option<ResolvedItem>,
    pub server_time: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_name: Option<String>,
    pub display_mode: String,
    pub should_reload: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reload_timestamp: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedItem {
    pub media_id: i32,
    pub url: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub duration_seconds: i32,
    pub file_name: String,
}

/// Polled by every display on a fixed interval. Never fails on valid state;
/// at worst the descriptor degrades to content type "none".
pub async fn resolve_content(
    State(state): State<AppState>,
    Query(query): Query<ResolveQuery>,
) -> Json<ResolveResponse> {
    let now = Utc::now().with_timezone(&state.timezone).naive_local();
    let response =
        resolver::resolve_content(&state.store, query.display_id.as_deref(), now).await;
    Json(response)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatRequest {
    pub display_id: String,
    pub client_time: Option<String>,
    pub current_content: Option<String>,
}

pub async fn heartbeat(
    State(state): State<AppState>,
    Json(req): Json<HeartbeatRequest>,
) -> StatusCode {
    let status = DisplayStatus {
        display_id: req.display_id.clone(),
        status: "online".to_string(),
        last_heartbeat: Utc::now().naive_utc(),
        client_time: req.client_time,
        current_content: req.current_content,
    };

    state
        .store
        .heartbeats
        .write()
        .await
        .insert(req.display_id, status);

    StatusCode::NO_CONTENT
}

#[derive(Debug, Serialize)]
pub struct DisplayInfo {
    #[serde(flatten)]
    pub status: DisplayStatus,
    pub last_acked_reload: Option<NaiveDateTime>,
}

/// Monitoring view of every display that has ever sent a heartbeat.
pub async fn list_displays(State(state): State<AppState>) -> Json<Vec<DisplayInfo>> {
    let last_seen = state.store.display_last_seen.read().await;

    let mut displays: Vec<DisplayInfo> = state
        .store
        .heartbeats
        .read()
        .await
        .values()
        .map(|s| DisplayInfo {
            last_acked_reload: last_seen.get(&s.display_id).copied(),
            status: s.clone(),
        })
        .collect();
    displays.sort_by(|a, b| a.status.display_id.cmp(&b.status.display_id));

    Json(displays)
}
