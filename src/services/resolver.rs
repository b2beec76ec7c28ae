use std::collections::HashMap;

use chrono::{Datelike, NaiveDateTime, NaiveTime};

use crate::api::display_api::{ResolveResponse, ResolvedItem};
use crate::models::{MediaItem, Playlist, PlaylistItem, Schedule, ScheduleContentType};
use crate::store::StateStore;

/// Computes what a display should show for the given local `now`, in strict
/// priority order: broadcast stop, then direct activation, then the
/// highest-priority matching schedule, then the fallbacks. The reload flag
/// is computed (and acknowledged) on every call regardless of which branch
/// produced the content.
pub async fn resolve_content(
    store: &StateStore,
    display_id: Option<&str>,
    now: NaiveDateTime,
) -> ResolveResponse {
    let display_mode = store.display_mode.read().await.clone();
    let (should_reload, reload_timestamp) = acknowledge_reload(store, display_id).await;

    let mut response = ResolveResponse {
        content_type: "none".to_string(),
        playlist_items: None,
        single_media: None,
        server_time: now,
        schedule_name: None,
        display_mode,
        should_reload,
        reload_timestamp,
    };

    // 1. The global kill-switch wins over overrides and schedules alike.
    if store.is_stopped() {
        response.content_type = "stopped".to_string();
        return response;
    }

    let media = store.media.read().await;

    // 2. Direct activation bypasses the schedule table entirely. A stale
    //    override id (media deleted since activation) falls through.
    if let Some(active_id) = *store.active_media_id.read().await {
        if let Some(item) = media.get(&active_id) {
            response.content_type = item.media_type.as_str().to_string();
            response.single_media = Some(resolved_item(item, 0));
            response.schedule_name = Some("Direct Activation".to_string());
            return response;
        }
    }

    // 3. Highest-priority active schedule whose window covers `now` today.
    //    Equal priorities break deterministically toward the lowest id.
    let today = now.weekday().num_days_from_monday() as u8;
    let time = now.time();

    let schedules = store.schedules.read().await;
    let mut matching: Vec<&Schedule> = schedules
        .values()
        .filter(|s| s.is_active)
        .filter(|s| s.day_of_week.map_or(true, |d| d == today))
        .filter(|s| window_contains(s.start_time, s.end_time, time))
        .collect();
    matching.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.id.cmp(&b.id)));

    let playlists = store.playlists.read().await;

    if let Some(schedule) = matching.first() {
        match schedule.content_type {
            ScheduleContentType::Playlist => {
                if let Some(playlist) = schedule.playlist_id.and_then(|id| playlists.get(&id)) {
                    let items = render_items(&playlist.items, &media);
                    if !items.is_empty() {
                        response.content_type = "playlist".to_string();
                        response.playlist_items = Some(items);
                        response.schedule_name = Some(schedule.name.clone());
                        return response;
                    }
                }
            }
            ScheduleContentType::SingleImage => {
                if let Some(item) = schedule.media_id.and_then(|id| media.get(&id)) {
                    response.content_type = item.media_type.as_str().to_string();
                    response.single_media = Some(resolved_item(item, 0));
                    response.schedule_name = Some(schedule.name.clone());
                    return response;
                }
            }
        }
    }

    // 4. Fallbacks keep unattended displays rendering something: the first
    //    playlist with a renderable item in catalog (id) order, then the
    //    first media item, then "none".
    let mut all_playlists: Vec<&Playlist> = playlists.values().collect();
    all_playlists.sort_by_key(|p| p.id);
    for playlist in all_playlists {
        let items = render_items(&playlist.items, &media);
        if !items.is_empty() {
            response.content_type = "playlist".to_string();
            response.playlist_items = Some(items);
            return response;
        }
    }

    let mut all_media: Vec<&MediaItem> = media.values().collect();
    all_media.sort_by_key(|m| m.id);
    if let Some(item) = all_media.first() {
        response.content_type = item.media_type.as_str().to_string();
        response.single_media = Some(resolved_item(item, 0));
        return response;
    }

    response
}

/// Inclusive `[start, end]` time-of-day window; `start > end` means the
/// window wraps past midnight.
pub fn window_contains(start: NaiveTime, end: NaiveTime, now: NaiveTime) -> bool {
    if start <= end {
        start <= now && now <= end
    } else {
        now >= start || now <= end
    }
}

/// Computes the reload flag for this poll and, when it fires, records the
/// acknowledgment in the same call so the next poll from the same display
/// does not reload again for the same event. Anonymous polls cannot be
/// tracked and never signal a reload.
async fn acknowledge_reload(
    store: &StateStore,
    display_id: Option<&str>,
) -> (bool, Option<NaiveDateTime>) {
    let Some(reload_ts) = *store.reload_timestamp.read().await else {
        return (false, None);
    };
    let Some(display_id) = display_id else {
        return (false, Some(reload_ts));
    };

    let mut seen = store.display_last_seen.write().await;
    let should_reload = seen.get(display_id).map_or(true, |acked| reload_ts > *acked);
    if should_reload {
        seen.insert(display_id.to_string(), reload_ts);
    }

    (should_reload, Some(reload_ts))
}

fn render_items(items: &[PlaylistItem], media: &HashMap<i32, MediaItem>) -> Vec<ResolvedItem> {
    let mut ordered: Vec<&PlaylistItem> = items.iter().collect();
    ordered.sort_by_key(|i| i.order);

    // References orphaned by a media delete are skipped, never served.
    ordered
        .into_iter()
        .filter_map(|i| {
            media
                .get(&i.media_id)
                .map(|m| resolved_item(m, i.duration_seconds))
        })
        .collect()
}

fn resolved_item(item: &MediaItem, duration_seconds: i32) -> ResolvedItem {
    ResolvedItem {
        media_id: item.id,
        url: format!("/media/{}", item.file_name),
        media_type: item.media_type,
        duration_seconds,
        file_name: item.original_name.clone(),
    }
}
