use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use chrono::NaiveDateTime;
use tokio::sync::RwLock;

use crate::models::{DisplayStatus, MediaItem, Playlist, Schedule};

/// Process-wide state shared by every request: the three catalog maps, the
/// broadcast signal fields, and the id counters. Constructed once in `main`
/// and handed to the API and service layers by `Arc`.
///
/// Each map is individually consistent under its own lock; the media cascade
/// delete is the only operation that holds two locks at once (media first,
/// then playlists).
pub struct StateStore {
    pub media: RwLock<HashMap<i32, MediaItem>>,
    pub playlists: RwLock<HashMap<i32, Playlist>>,
    pub schedules: RwLock<HashMap<i32, Schedule>>,

    /// Direct-activation override; bypasses the schedule table while set.
    pub active_media_id: RwLock<Option<i32>>,
    /// Presentation hint passed through to displays unchanged.
    pub display_mode: RwLock<String>,
    /// Instant of the last "reload all" command.
    pub reload_timestamp: RwLock<Option<NaiveDateTime>>,
    /// Reload timestamp each display has already acknowledged.
    pub display_last_seen: RwLock<HashMap<String, NaiveDateTime>>,
    /// Last-seen heartbeat per display. Monitoring only, never read by the
    /// resolver.
    pub heartbeats: RwLock<HashMap<String, DisplayStatus>>,

    broadcast_stopped: AtomicBool,
    next_media_id: AtomicI32,
    next_playlist_id: AtomicI32,
    next_schedule_id: AtomicI32,
}

impl StateStore {
    pub fn new(default_display_mode: &str) -> Self {
        Self {
            media: RwLock::new(HashMap::new()),
            playlists: RwLock::new(HashMap::new()),
            schedules: RwLock::new(HashMap::new()),
            active_media_id: RwLock::new(None),
            display_mode: RwLock::new(default_display_mode.to_string()),
            reload_timestamp: RwLock::new(None),
            display_last_seen: RwLock::new(HashMap::new()),
            heartbeats: RwLock::new(HashMap::new()),
            broadcast_stopped: AtomicBool::new(false),
            next_media_id: AtomicI32::new(1),
            next_playlist_id: AtomicI32::new(1),
            next_schedule_id: AtomicI32::new(1),
        }
    }

    // Ids are strictly increasing for the life of the process and never
    // reused after a delete.
    pub fn next_media_id(&self) -> i32 {
        self.next_media_id.fetch_add(1, Ordering::SeqCst)
    }

    pub fn next_playlist_id(&self) -> i32 {
        self.next_playlist_id.fetch_add(1, Ordering::SeqCst)
    }

    pub fn next_schedule_id(&self) -> i32 {
        self.next_schedule_id.fetch_add(1, Ordering::SeqCst)
    }

    // Called after a snapshot load so restored entries cannot collide with
    // freshly assigned ids.
    pub fn bump_media_id_past(&self, max_id: i32) {
        self.next_media_id.fetch_max(max_id + 1, Ordering::SeqCst);
    }

    pub fn bump_playlist_id_past(&self, max_id: i32) {
        self.next_playlist_id.fetch_max(max_id + 1, Ordering::SeqCst);
    }

    pub fn bump_schedule_id_past(&self, max_id: i32) {
        self.next_schedule_id.fetch_max(max_id + 1, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.broadcast_stopped.load(Ordering::SeqCst)
    }

    pub fn set_stopped(&self, stopped: bool) {
        self.broadcast_stopped.store(stopped, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_strictly_increasing() {
        let store = StateStore::new("fullscreen");
        let a = store.next_media_id();
        let b = store.next_media_id();
        assert!(b > a);
    }

    #[test]
    fn bump_skips_restored_ids() {
        let store = StateStore::new("fullscreen");
        store.bump_media_id_past(41);
        assert_eq!(store.next_media_id(), 42);

        // Bumping below the current counter must not rewind it.
        store.bump_media_id_past(5);
        assert_eq!(store.next_media_id(), 43);
    }
}
