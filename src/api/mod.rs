pub mod display_api;
pub mod media_api;
pub mod playlists_api;
pub mod schedules_api;
pub mod settings_api;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;

use crate::AppState;

// Video and PDF uploads run up to 5 GB; leave headroom for multipart
// framing.
const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024 * 1024 + 16 * 1024 * 1024;

pub fn routes() -> Router<AppState> {
    Router::new()
        // Media catalog
        .route(
            "/media",
            get(media_api::list_media).post(media_api::upload_media),
        )
        .route(
            "/media/:id",
            get(media_api::get_media).delete(media_api::delete_media),
        )
        // Playlists
        .route(
            "/playlists",
            get(playlists_api::list_playlists).post(playlists_api::create_playlist),
        )
        .route(
            "/playlists/:id",
            get(playlists_api::get_playlist)
                .put(playlists_api::update_playlist)
                .delete(playlists_api::delete_playlist),
        )
        // Schedules
        .route(
            "/schedules",
            get(schedules_api::list_schedules).post(schedules_api::create_schedule),
        )
        .route(
            "/schedules/:id",
            get(schedules_api::get_schedule)
                .put(schedules_api::update_schedule)
                .delete(schedules_api::delete_schedule),
        )
        .route(
            "/schedules/:id/active",
            put(schedules_api::toggle_schedule_active),
        )
        // Display polling surface
        .route("/display/content", get(display_api::resolve_content))
        .route("/display/heartbeat", post(display_api::heartbeat))
        .route("/displays", get(display_api::list_displays))
        // Settings and broadcast signals
        .route("/settings", get(settings_api::get_settings))
        .route(
            "/settings/display-mode",
            put(settings_api::update_display_mode),
        )
        .route(
            "/settings/activate/:media_id",
            post(settings_api::activate_media),
        )
        .route("/settings/deactivate", post(settings_api::deactivate_media))
        .route("/settings/reload", post(settings_api::trigger_reload))
        .route("/settings/broadcast/stop", post(settings_api::stop_broadcast))
        .route(
            "/settings/broadcast/resume",
            post(settings_api::resume_broadcast),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
