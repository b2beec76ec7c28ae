use axum::extract::{Path, State};
use axum::Json;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub display_mode: String,
    pub broadcast_stopped: bool,
    pub active_media_id: Option<i32>,
    pub reload_timestamp: Option<NaiveDateTime>,
}

async fn current_settings(state: &AppState) -> SettingsResponse {
    SettingsResponse {
        display_mode: state.store.display_mode.read().await.clone(),
        broadcast_stopped: state.store.is_stopped(),
        active_media_id: *state.store.active_media_id.read().await,
        reload_timestamp: *state.store.reload_timestamp.read().await,
    }
}

pub async fn get_settings(State(state): State<AppState>) -> Json<SettingsResponse> {
    Json(current_settings(&state).await)
}

#[derive(Debug, Deserialize)]
pub struct UpdateDisplayModeRequest {
    pub display_mode: String,
}

pub async fn update_display_mode(
    State(state): State<AppState>,
    Json(req): Json<UpdateDisplayModeRequest>,
) -> Json<SettingsResponse> {
    *state.store.display_mode.write().await = req.display_mode;

    state.snapshots.persist(&state.store).await;

    Json(current_settings(&state).await)
}

/// Direct activation: the media item preempts all scheduling until cleared.
/// Starting an override always resumes broadcasting.
pub async fn activate_media(
    State(state): State<AppState>,
    Path(media_id): Path<i32>,
) -> Result<Json<SettingsResponse>, ApiError> {
    if !state.store.media.read().await.contains_key(&media_id) {
        return Err(ApiError::NotFound("Media"));
    }

    *state.store.active_media_id.write().await = Some(media_id);
    state.store.set_stopped(false);

    state.snapshots.persist(&state.store).await;

    Ok(Json(current_settings(&state).await))
}

pub async fn deactivate_media(State(state): State<AppState>) -> Json<SettingsResponse> {
    *state.store.active_media_id.write().await = None;

    state.snapshots.persist(&state.store).await;

    Json(current_settings(&state).await)
}

/// Stamps a new reload event. Every display observes it exactly once via
/// the per-display acknowledgment in the resolver.
pub async fn trigger_reload(State(state): State<AppState>) -> Json<SettingsResponse> {
    *state.store.reload_timestamp.write().await = Some(Utc::now().naive_utc());

    Json(current_settings(&state).await)
}

pub async fn stop_broadcast(State(state): State<AppState>) -> Json<SettingsResponse> {
    state.store.set_stopped(true);

    state.snapshots.persist(&state.store).await;

    Json(current_settings(&state).await)
}

pub async fn resume_broadcast(State(state): State<AppState>) -> Json<SettingsResponse> {
    state.store.set_stopped(false);

    state.snapshots.persist(&state.store).await;

    Json(current_settings(&state).await)
}
