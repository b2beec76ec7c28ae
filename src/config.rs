use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub https: Option<HttpsConfig>,
    pub ui_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpsConfig {
    pub enabled: bool,
    pub cert_path: String,
    pub key_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the JSON snapshot documents.
    pub data_dir: String,
    /// Directory holding uploaded media blobs, served under /media.
    pub media_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// IANA timezone name used to evaluate schedule windows.
    pub timezone: String,
    pub default_mode: String,
    /// Seconds without a heartbeat before a display is marked offline.
    pub offline_after_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn timezone(&self) -> Result<chrono_tz::Tz> {
        self.display
            .timezone
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid timezone: {}", self.display.timezone))
    }

    pub fn default_template() -> &'static str {
        r#"[server]
host = "0.0.0.0"
port = 8080

[server.https]
enabled = false
cert_path = "certs/cert.pem"
key_path = "certs/key.pem"

# Optional: Path to custom admin UI directory.
# If unset, server defaults to "./static".
# ui_path = "./static"

[storage]
# Snapshot documents are rewritten here on every mutation.
data_dir = "data"
# Uploaded media files, served to displays under /media.
media_dir = "media"

[display]
# Schedule windows are evaluated against local time in this zone.
timezone = "UTC"
default_mode = "fullscreen"
offline_after_secs = 60

[logging]
level = "info"
"#
    }
}
