use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

// Media models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    Pdf,
}

impl MediaType {
    pub fn from_extension(ext: &str) -> Option<Self> {
        let image_extensions = ["jpg", "jpeg", "png", "gif", "bmp", "webp", "svg"];
        let video_extensions = ["mp4", "webm", "mov", "avi", "mkv"];

        let ext = ext.to_lowercase();
        if image_extensions.contains(&ext.as_str()) {
            Some(MediaType::Image)
        } else if video_extensions.contains(&ext.as_str()) {
            Some(MediaType::Video)
        } else if ext == "pdf" {
            Some(MediaType::Pdf)
        } else {
            None
        }
    }

    /// Upload ceiling per type: 100 MB for images, 5 GB for video and PDF.
    pub fn max_size_bytes(&self) -> i64 {
        match self {
            MediaType::Image => 100 * 1024 * 1024,
            MediaType::Video | MediaType::Pdf => 5 * 1024 * 1024 * 1024,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
            MediaType::Pdf => "pdf",
        }
    }

    /// Whether a sniffed MIME type belongs to this media class.
    pub fn accepts_mime(&self, mime: &str) -> bool {
        match self {
            MediaType::Image => mime.starts_with("image/"),
            MediaType::Video => mime.starts_with("video/"),
            MediaType::Pdf => mime == "application/pdf",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: i32,
    pub file_name: String,
    pub original_name: String,
    pub media_type: MediaType,
    pub size_bytes: i64,
    pub uploaded_at: NaiveDateTime,
    pub description: Option<String>,
}

// Playlist models
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistItem {
    pub media_id: i32,
    #[serde(default = "default_item_duration")]
    pub duration_seconds: i32,
    pub order: i32,
}

fn default_item_duration() -> i32 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub items: Vec<PlaylistItem>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct NewPlaylist {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
}

// Schedule models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleContentType {
    Playlist,
    SingleImage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: i32,
    pub name: String,
    pub content_type: ScheduleContentType,
    pub playlist_id: Option<i32>,
    pub media_id: Option<i32>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    // Monday = 0, Sunday = 6; None means every day
    pub day_of_week: Option<u8>,
    pub is_active: bool,
    pub priority: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct NewSchedule {
    pub name: String,
    pub content_type: ScheduleContentType,
    pub playlist_id: Option<i32>,
    pub media_id: Option<i32>,
    pub start_time: String,
    pub end_time: String,
    pub day_of_week: Option<u8>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub priority: i32,
}

fn default_true() -> bool {
    true
}

// Display models
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayStatus {
    pub display_id: String,
    pub status: String,
    pub last_heartbeat: NaiveDateTime,
    pub client_time: Option<String>,
    pub current_content: Option<String>,
}
