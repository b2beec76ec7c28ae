use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::error::ApiError;
use crate::models::MediaItem;
use crate::AppState;

pub async fn list_media(State(state): State<AppState>) -> Json<Vec<MediaItem>> {
    let mut items: Vec<MediaItem> = state.store.media.read().await.values().cloned().collect();
    items.sort_by_key(|m| m.id);
    Json(items)
}

pub async fn get_media(
    State(state): State<AppState>,
    Path(media_id): Path<i32>,
) -> Result<Json<MediaItem>, ApiError> {
    state
        .store
        .media
        .read()
        .await
        .get(&media_id)
        .cloned()
        .map(Json)
        .ok_or(ApiError::NotFound("Media"))
}

/// Multipart upload: a `file` field plus an optional `description` field.
pub async fn upload_media(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<MediaItem>, ApiError> {
    let mut description: Option<String> = None;
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut original_name = String::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Multipart error: {}", e);
        ApiError::Validation("Malformed multipart payload".to_string())
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        if field_name == "description" {
            let text = field.text().await.map_err(|e| {
                tracing::error!("Failed to read description field: {}", e);
                ApiError::Validation("Failed to read description field".to_string())
            })?;
            if !text.is_empty() {
                description = Some(text);
            }
        } else if field_name == "file" {
            original_name = field.file_name().unwrap_or("upload").to_string();

            let data = field.bytes().await.map_err(|e| {
                tracing::error!("Failed to read file bytes: {}", e);
                ApiError::Validation("Failed to read uploaded file".to_string())
            })?;
            file_bytes = Some(data.to_vec());
        }
    }

    let Some(bytes) = file_bytes else {
        return Err(ApiError::Validation(
            "Missing file field in upload request".to_string(),
        ));
    };

    let item = state
        .media_service
        .save_media(&bytes, &original_name, description)
        .await?;

    state.snapshots.persist(&state.store).await;

    Ok(Json(item))
}

pub async fn delete_media(
    State(state): State<AppState>,
    Path(media_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    if !state.media_service.delete_media(media_id).await {
        return Err(ApiError::NotFound("Media"));
    }

    state.snapshots.persist(&state.store).await;

    Ok(StatusCode::NO_CONTENT)
}
