use std::path::PathBuf;

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::models::{MediaItem, Playlist, Schedule};
use crate::store::StateStore;

/// Small metadata document persisted alongside the catalog lists.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsDoc {
    #[serde(default)]
    active_media_id: Option<i32>,
    #[serde(default)]
    display_mode: Option<String>,
    #[serde(default)]
    broadcast_stopped: bool,
}

/// Full-state snapshots: media, playlists (item lists only), schedules and
/// the signal settings, each rewritten wholesale as its own JSON document
/// after every mutation.
pub struct SnapshotService {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl SnapshotService {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Post-commit hook invoked after every mutating operation. A failed
    /// write is logged and swallowed; the in-memory effect of the mutation
    /// stands either way.
    pub async fn persist(&self, store: &StateStore) {
        if let Err(e) = self.save(store).await {
            tracing::error!("Snapshot write failed: {:#}", e);
        }
    }

    /// Serialized by a single mutex so concurrent mutations cannot
    /// interleave a partial write.
    pub async fn save(&self, store: &StateStore) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut media: Vec<MediaItem> = store.media.read().await.values().cloned().collect();
        media.sort_by_key(|m| m.id);

        let mut playlists: Vec<Playlist> =
            store.playlists.read().await.values().cloned().collect();
        playlists.sort_by_key(|p| p.id);

        let mut schedules: Vec<Schedule> =
            store.schedules.read().await.values().cloned().collect();
        schedules.sort_by_key(|s| s.id);

        let settings = SettingsDoc {
            active_media_id: *store.active_media_id.read().await,
            display_mode: Some(store.display_mode.read().await.clone()),
            broadcast_stopped: store.is_stopped(),
        };

        std::fs::create_dir_all(&self.dir)?;
        self.write_doc("media.json", &media)?;
        self.write_doc("playlists.json", &playlists)?;
        self.write_doc("schedules.json", &schedules)?;
        self.write_doc("settings.json", &settings)?;

        Ok(())
    }

    /// Populates the store from the snapshot documents and advances the id
    /// counters past the maxima seen. Called once from `main` before the
    /// listener starts; missing documents are treated as empty state.
    pub async fn load(&self, store: &StateStore) -> Result<()> {
        if let Some(media) = self.read_doc::<Vec<MediaItem>>("media.json")? {
            let mut map = store.media.write().await;
            for item in media {
                store.bump_media_id_past(item.id);
                map.insert(item.id, item);
            }
        }

        if let Some(playlists) = self.read_doc::<Vec<Playlist>>("playlists.json")? {
            let mut map = store.playlists.write().await;
            for playlist in playlists {
                store.bump_playlist_id_past(playlist.id);
                map.insert(playlist.id, playlist);
            }
        }

        if let Some(schedules) = self.read_doc::<Vec<Schedule>>("schedules.json")? {
            let mut map = store.schedules.write().await;
            for schedule in schedules {
                store.bump_schedule_id_past(schedule.id);
                map.insert(schedule.id, schedule);
            }
        }

        if let Some(settings) = self.read_doc::<SettingsDoc>("settings.json")? {
            *store.active_media_id.write().await = settings.active_media_id;
            store.set_stopped(settings.broadcast_stopped);
            if let Some(mode) = settings.display_mode {
                *store.display_mode.write().await = mode;
            }
        }

        Ok(())
    }

    fn write_doc<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        std::fs::write(self.dir.join(name), json)?;
        Ok(())
    }

    fn read_doc<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.dir.join(name);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MediaType, PlaylistItem, ScheduleContentType};
    use chrono::{NaiveDate, NaiveTime};

    fn sample_now() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 3)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    async fn populated_store() -> StateStore {
        let store = StateStore::new("fullscreen");

        let media = MediaItem {
            id: store.next_media_id(),
            file_name: "abc123.png".to_string(),
            original_name: "lobby.png".to_string(),
            media_type: MediaType::Image,
            size_bytes: 1024,
            uploaded_at: sample_now(),
            description: Some("Lobby poster".to_string()),
        };
        let media_id = media.id;
        store.media.write().await.insert(media.id, media);

        let playlist = Playlist {
            id: store.next_playlist_id(),
            name: "Morning Loop".to_string(),
            description: None,
            items: vec![PlaylistItem {
                media_id,
                duration_seconds: 15,
                order: 0,
            }],
            created_at: sample_now(),
            updated_at: sample_now(),
        };
        let playlist_id = playlist.id;
        store.playlists.write().await.insert(playlist.id, playlist);

        let schedule = Schedule {
            id: store.next_schedule_id(),
            name: "Weekday Mornings".to_string(),
            content_type: ScheduleContentType::Playlist,
            playlist_id: Some(playlist_id),
            media_id: None,
            start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            day_of_week: Some(0),
            is_active: true,
            priority: 5,
            created_at: sample_now(),
            updated_at: sample_now(),
        };
        store.schedules.write().await.insert(schedule.id, schedule);

        *store.active_media_id.write().await = Some(media_id);
        *store.display_mode.write().await = "kiosk".to_string();
        store.set_stopped(true);

        store
    }

    #[tokio::test]
    async fn round_trip_restores_full_state() {
        let dir = tempfile::tempdir().unwrap();
        let snapshots = SnapshotService::new(dir.path());

        let original = populated_store().await;
        snapshots.save(&original).await.unwrap();

        let restored = StateStore::new("fullscreen");
        snapshots.load(&restored).await.unwrap();

        assert_eq!(restored.media.read().await.len(), 1);
        assert_eq!(restored.playlists.read().await.len(), 1);
        assert_eq!(restored.schedules.read().await.len(), 1);
        assert_eq!(*restored.active_media_id.read().await, Some(1));
        assert_eq!(*restored.display_mode.read().await, "kiosk");
        assert!(restored.is_stopped());

        let playlist = restored.playlists.read().await.get(&1).cloned().unwrap();
        assert_eq!(playlist.items.len(), 1);
        assert_eq!(playlist.items[0].duration_seconds, 15);
    }

    #[tokio::test]
    async fn load_advances_id_counters_past_restored_maxima() {
        let dir = tempfile::tempdir().unwrap();
        let snapshots = SnapshotService::new(dir.path());

        let original = populated_store().await;
        snapshots.save(&original).await.unwrap();

        let restored = StateStore::new("fullscreen");
        snapshots.load(&restored).await.unwrap();

        assert_eq!(restored.next_media_id(), 2);
        assert_eq!(restored.next_playlist_id(), 2);
        assert_eq!(restored.next_schedule_id(), 2);
    }

    #[tokio::test]
    async fn restored_state_resolves_identically() {
        let dir = tempfile::tempdir().unwrap();
        let snapshots = SnapshotService::new(dir.path());

        let original = populated_store().await;
        // Resolution should compare on content, not on the stop flag.
        original.set_stopped(false);
        *original.active_media_id.write().await = None;
        snapshots.save(&original).await.unwrap();

        let restored = StateStore::new("fullscreen");
        snapshots.load(&restored).await.unwrap();

        // 2025-03-03 is a Monday, inside the schedule window.
        let now = NaiveDate::from_ymd_opt(2025, 3, 3)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();

        let before = crate::services::resolver::resolve_content(&original, None, now).await;
        let after = crate::services::resolver::resolve_content(&restored, None, now).await;

        assert_eq!(before.content_type, after.content_type);
        assert_eq!(before.schedule_name, after.schedule_name);
        let before_items = before.playlist_items.unwrap();
        let after_items = after.playlist_items.unwrap();
        assert_eq!(before_items.len(), after_items.len());
        assert_eq!(before_items[0].media_id, after_items[0].media_id);
        assert_eq!(before_items[0].url, after_items[0].url);
    }

    #[tokio::test]
    async fn load_with_no_documents_is_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let snapshots = SnapshotService::new(dir.path());

        let store = StateStore::new("fullscreen");
        snapshots.load(&store).await.unwrap();

        assert!(store.media.read().await.is_empty());
        assert!(!store.is_stopped());
        assert_eq!(store.next_media_id(), 1);
    }
}
