use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{MediaItem, MediaType};
use crate::store::StateStore;

/// Durable byte storage for uploaded media, addressed by generated file
/// name. Production uses the filesystem implementation; tests substitute an
/// in-memory one.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, file_name: &str, bytes: &[u8]) -> Result<()>;
    async fn delete(&self, file_name: &str) -> Result<()>;
}

pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, file_name: &str, bytes: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(file_name), bytes).await?;
        Ok(())
    }

    async fn delete(&self, file_name: &str) -> Result<()> {
        tokio::fs::remove_file(self.root.join(file_name)).await?;
        Ok(())
    }
}

pub struct MediaService {
    store: Arc<StateStore>,
    blobs: Arc<dyn BlobStore>,
}

impl MediaService {
    pub fn new(store: Arc<StateStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { store, blobs }
    }

    /// Validates the upload, writes the bytes through the blob store under a
    /// collision-free generated name, and records the catalog entry.
    pub async fn save_media(
        &self,
        bytes: &[u8],
        original_name: &str,
        description: Option<String>,
    ) -> Result<MediaItem, ApiError> {
        let extension = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let media_type = MediaType::from_extension(&extension).ok_or_else(|| {
            ApiError::Validation(format!("Unsupported file extension: '{}'", extension))
        })?;

        let size_bytes = bytes.len() as i64;
        if size_bytes > media_type.max_size_bytes() {
            return Err(ApiError::Validation(format!(
                "File exceeds the {} MB limit for {} uploads",
                media_type.max_size_bytes() / (1024 * 1024),
                media_type.as_str()
            )));
        }

        // Cross-check the sniffed content against the extension class.
        // Formats `infer` cannot identify (e.g. SVG) pass on extension alone.
        if let Some(kind) = infer::get(bytes) {
            if !media_type.accepts_mime(kind.mime_type()) {
                return Err(ApiError::Validation(format!(
                    "File content ({}) does not match its {} extension",
                    kind.mime_type(),
                    media_type.as_str()
                )));
            }
        }

        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        self.blobs
            .put(&file_name, bytes)
            .await
            .map_err(ApiError::Internal)?;

        let item = MediaItem {
            id: self.store.next_media_id(),
            file_name,
            original_name: original_name.to_string(),
            media_type,
            size_bytes,
            uploaded_at: Utc::now().naive_utc(),
            description,
        };

        self.store
            .media
            .write()
            .await
            .insert(item.id, item.clone());

        Ok(item)
    }

    /// Removes the catalog entry, the underlying blob, and every playlist
    /// item referencing the media. Remaining item orders are left as-is;
    /// the resolver sorts numerically and does not assume contiguity.
    /// Returns false when the id is unknown.
    pub async fn delete_media(&self, id: i32) -> bool {
        // Hold both locks across the cascade so no request can observe a
        // playlist pointing at a half-deleted media entry.
        let mut media = self.store.media.write().await;
        let Some(item) = media.remove(&id) else {
            return false;
        };

        let mut playlists = self.store.playlists.write().await;
        let now = Utc::now().naive_utc();
        for playlist in playlists.values_mut() {
            let before = playlist.items.len();
            playlist.items.retain(|i| i.media_id != id);
            if playlist.items.len() != before {
                playlist.updated_at = now;
            }
        }
        drop(playlists);
        drop(media);

        // A deleted media item cannot stay active as the override.
        {
            let mut active = self.store.active_media_id.write().await;
            if *active == Some(id) {
                *active = None;
            }
        }

        if let Err(e) = self.blobs.delete(&item.file_name).await {
            tracing::warn!("Failed to delete blob {}: {:#}", item.file_name, e);
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Playlist, PlaylistItem};
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    struct MemoryBlobStore {
        files: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl MemoryBlobStore {
        fn new() -> Self {
            Self {
                files: Mutex::new(HashMap::new()),
            }
        }
    }

    #[async_trait]
    impl BlobStore for MemoryBlobStore {
        async fn put(&self, file_name: &str, bytes: &[u8]) -> Result<()> {
            self.files
                .lock()
                .await
                .insert(file_name.to_string(), bytes.to_vec());
            Ok(())
        }

        async fn delete(&self, file_name: &str) -> Result<()> {
            self.files.lock().await.remove(file_name);
            Ok(())
        }
    }

    fn service() -> MediaService {
        MediaService::new(
            Arc::new(StateStore::new("fullscreen")),
            Arc::new(MemoryBlobStore::new()),
        )
    }

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

    #[tokio::test]
    async fn rejects_unknown_extension() {
        let svc = service();
        let err = svc.save_media(b"hello", "notes.txt", None).await;
        assert!(matches!(err, Err(ApiError::Validation(_))));
        assert!(svc.store.media.read().await.is_empty());
    }

    #[tokio::test]
    async fn rejects_oversize_image() {
        let svc = service();
        let oversize = vec![0u8; (100 * 1024 * 1024 + 1) as usize];
        let err = svc.save_media(&oversize, "huge.png", None).await;
        assert!(matches!(err, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn rejects_content_mismatching_extension() {
        let svc = service();
        // A PDF payload wearing an image extension.
        let err = svc.save_media(b"%PDF-1.4 fake", "sneaky.png", None).await;
        assert!(matches!(err, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn saves_valid_upload_and_stores_blob() {
        let svc = service();
        let item = svc
            .save_media(PNG_MAGIC, "lobby.png", Some("Lobby poster".to_string()))
            .await
            .unwrap();

        assert_eq!(item.media_type, MediaType::Image);
        assert_eq!(item.original_name, "lobby.png");
        assert!(item.file_name.ends_with(".png"));
        assert_ne!(item.file_name, "lobby.png");
        assert_eq!(svc.store.media.read().await.len(), 1);
    }

    #[tokio::test]
    async fn ids_never_reused_after_delete() {
        let svc = service();
        let first = svc.save_media(PNG_MAGIC, "a.png", None).await.unwrap();
        assert!(svc.delete_media(first.id).await);

        let second = svc.save_media(PNG_MAGIC, "b.png", None).await.unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn delete_cascades_into_playlists_and_keeps_order_values() {
        let svc = service();
        let keep = svc.save_media(PNG_MAGIC, "keep.png", None).await.unwrap();
        let gone = svc.save_media(PNG_MAGIC, "gone.png", None).await.unwrap();

        let playlist = Playlist {
            id: svc.store.next_playlist_id(),
            name: "Loop".to_string(),
            description: None,
            items: vec![
                PlaylistItem {
                    media_id: keep.id,
                    duration_seconds: 10,
                    order: 0,
                },
                PlaylistItem {
                    media_id: gone.id,
                    duration_seconds: 10,
                    order: 1,
                },
                PlaylistItem {
                    media_id: keep.id,
                    duration_seconds: 20,
                    order: 2,
                },
            ],
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        };
        let playlist_id = playlist.id;
        svc.store
            .playlists
            .write()
            .await
            .insert(playlist_id, playlist);

        assert!(svc.delete_media(gone.id).await);

        let playlists = svc.store.playlists.read().await;
        let items = &playlists.get(&playlist_id).unwrap().items;
        assert_eq!(items.len(), 2);
        // Orders stay as assigned, non-contiguous after the cascade.
        assert_eq!(items[0].order, 0);
        assert_eq!(items[1].order, 2);
    }

    #[tokio::test]
    async fn delete_clears_matching_override() {
        let svc = service();
        let item = svc.save_media(PNG_MAGIC, "a.png", None).await.unwrap();
        *svc.store.active_media_id.write().await = Some(item.id);

        assert!(svc.delete_media(item.id).await);
        assert_eq!(*svc.store.active_media_id.read().await, None);
    }

    #[tokio::test]
    async fn delete_unknown_id_is_not_found() {
        let svc = service();
        assert!(!svc.delete_media(999).await);
    }
}
