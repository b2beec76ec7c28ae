use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDateTime, Utc};
use serde::Serialize;

use crate::error::ApiError;
use crate::models::{MediaItem, NewPlaylist, Playlist, PlaylistItem};
use crate::AppState;

/// Playlist with live media metadata attached to each item for caller
/// convenience. Only the media ids are persisted; the attachment is
/// recomputed on every read.
#[derive(Debug, Serialize)]
pub struct PlaylistResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub items: Vec<PlaylistItemResponse>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct PlaylistItemResponse {
    pub media_id: i32,
    pub duration_seconds: i32,
    pub order: i32,
    pub media: Option<MediaItem>,
}

async fn attach_media(state: &AppState, playlist: Playlist) -> PlaylistResponse {
    let media = state.store.media.read().await;

    PlaylistResponse {
        id: playlist.id,
        name: playlist.name,
        description: playlist.description,
        items: playlist
            .items
            .into_iter()
            .map(|item| PlaylistItemResponse {
                media: media.get(&item.media_id).cloned(),
                media_id: item.media_id,
                duration_seconds: item.duration_seconds,
                order: item.order,
            })
            .collect(),
        created_at: playlist.created_at,
        updated_at: playlist.updated_at,
    }
}

fn validate_items(items: &[PlaylistItem]) -> Result<(), ApiError> {
    for item in items {
        if item.duration_seconds <= 0 {
            return Err(ApiError::Validation(
                "Item duration must be greater than zero".to_string(),
            ));
        }
    }
    Ok(())
}

pub async fn list_playlists(State(state): State<AppState>) -> Json<Vec<Playlist>> {
    let mut playlists: Vec<Playlist> = state
        .store
        .playlists
        .read()
        .await
        .values()
        .cloned()
        .collect();
    playlists.sort_by_key(|p| p.id);
    Json(playlists)
}

pub async fn get_playlist(
    State(state): State<AppState>,
    Path(playlist_id): Path<i32>,
) -> Result<Json<PlaylistResponse>, ApiError> {
    let playlist = state
        .store
        .playlists
        .read()
        .await
        .get(&playlist_id)
        .cloned()
        .ok_or(ApiError::NotFound("Playlist"))?;

    Ok(Json(attach_media(&state, playlist).await))
}

pub async fn create_playlist(
    State(state): State<AppState>,
    Json(new_playlist): Json<NewPlaylist>,
) -> Result<Json<PlaylistResponse>, ApiError> {
    if new_playlist.name.trim().is_empty() {
        return Err(ApiError::Validation("Playlist name is required".to_string()));
    }
    validate_items(&new_playlist.items)?;

    let now = Utc::now().naive_utc();
    let playlist = Playlist {
        id: state.store.next_playlist_id(),
        name: new_playlist.name,
        description: new_playlist.description,
        items: new_playlist.items,
        created_at: now,
        updated_at: now,
    };

    state
        .store
        .playlists
        .write()
        .await
        .insert(playlist.id, playlist.clone());

    state.snapshots.persist(&state.store).await;

    Ok(Json(attach_media(&state, playlist).await))
}

pub async fn update_playlist(
    State(state): State<AppState>,
    Path(playlist_id): Path<i32>,
    Json(updates): Json<NewPlaylist>,
) -> Result<Json<PlaylistResponse>, ApiError> {
    if updates.name.trim().is_empty() {
        return Err(ApiError::Validation("Playlist name is required".to_string()));
    }
    validate_items(&updates.items)?;

    let playlist = {
        let mut playlists = state.store.playlists.write().await;
        let playlist = playlists
            .get_mut(&playlist_id)
            .ok_or(ApiError::NotFound("Playlist"))?;

        playlist.name = updates.name;
        playlist.description = updates.description;
        playlist.items = updates.items;
        playlist.updated_at = Utc::now().naive_utc();
        playlist.clone()
    };

    state.snapshots.persist(&state.store).await;

    Ok(Json(attach_media(&state, playlist).await))
}

pub async fn delete_playlist(
    State(state): State<AppState>,
    Path(playlist_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    if state
        .store
        .playlists
        .write()
        .await
        .remove(&playlist_id)
        .is_none()
    {
        return Err(ApiError::NotFound("Playlist"));
    }

    state.snapshots.persist(&state.store).await;

    Ok(StatusCode::NO_CONTENT)
}
