use crate::store::StateStore;
use crate::AppState;
use chrono::Utc;
use std::time::Duration;
use tokio::time::interval;

pub async fn run(state: AppState) {
    let offline_after_secs = state.config.display.offline_after_secs;
    let mut tick = interval(Duration::from_secs(30));

    loop {
        tick.tick().await;
        mark_stale_displays(&state.store, offline_after_secs).await;
    }
}

/// Flips displays to offline when their last heartbeat is older than the
/// threshold. Monitoring only; the resolver never reads this map.
async fn mark_stale_displays(store: &StateStore, offline_after_secs: u64) {
    let threshold = Utc::now().naive_utc() - chrono::Duration::seconds(offline_after_secs as i64);

    let mut heartbeats = store.heartbeats.write().await;
    let mut offline_count = 0;
    for status in heartbeats.values_mut() {
        if status.status == "online" && status.last_heartbeat < threshold {
            status.status = "offline".to_string();
            offline_count += 1;
        }
    }

    if offline_count > 0 {
        tracing::warn!("Marked {} unresponsive displays as offline", offline_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DisplayStatus;

    fn heartbeat(display_id: &str, age_secs: i64) -> DisplayStatus {
        DisplayStatus {
            display_id: display_id.to_string(),
            status: "online".to_string(),
            last_heartbeat: Utc::now().naive_utc() - chrono::Duration::seconds(age_secs),
            client_time: None,
            current_content: None,
        }
    }

    #[tokio::test]
    async fn stale_display_goes_offline_fresh_one_stays() {
        let store = StateStore::new("fullscreen");
        {
            let mut map = store.heartbeats.write().await;
            map.insert("tv-1".to_string(), heartbeat("tv-1", 300));
            map.insert("tv-2".to_string(), heartbeat("tv-2", 5));
        }

        mark_stale_displays(&store, 60).await;

        let heartbeats = store.heartbeats.read().await;
        assert_eq!(heartbeats.get("tv-1").unwrap().status, "offline");
        assert_eq!(heartbeats.get("tv-2").unwrap().status, "online");
    }
}
