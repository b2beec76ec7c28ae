mod api;
mod config;
mod error;
mod models;
mod services;
mod store;

use anyhow::Result;
use axum::Router;

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::services::media_service::{FsBlobStore, MediaService};
use crate::services::snapshot::SnapshotService;
use crate::store::StateStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub timezone: chrono_tz::Tz,
    pub store: Arc<StateStore>,
    pub media_service: Arc<MediaService>,
    pub snapshots: Arc<SnapshotService>,
}

use clap::Parser;

#[derive(Parser)]
#[command(version, author = "SIGNATRON AUTHORS", about = "Signatron Server\nLicensed under AGPLv3\nCreated by SIGNATRON AUTHORS", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Generate a default configuration template to stdout
    #[arg(long)]
    generate_config: bool,
}

fn run_onboarding() -> Result<Config> {
    use dialoguer::{theme::ColorfulTheme, Input};

    println!("Welcome to Signatron Server!");
    println!("It looks like you don't have a configuration file yet.");
    println!("Let's get you set up.\n");

    let host: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Server Host")
        .default("0.0.0.0".to_string())
        .interact_text()?;

    let port: u16 = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Server Port")
        .default(8080)
        .interact_text()?;

    let data_dir: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Snapshot Data Directory")
        .default("data".to_string())
        .interact_text()?;

    let media_dir: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Media Storage Directory")
        .default("media".to_string())
        .interact_text()?;

    let timezone: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Display Timezone (IANA name)")
        .default("UTC".to_string())
        .interact_text()?;

    let config_content = format!(
        r#"[server]
host = "{}"
port = {}

[server.https]
enabled = false
cert_path = "certs/cert.pem"
key_path = "certs/key.pem"

[storage]
data_dir = "{}"
media_dir = "{}"

[display]
timezone = "{}"
default_mode = "fullscreen"
offline_after_secs = 60

[logging]
level = "info"
"#,
        host, port, data_dir, media_dir, timezone
    );

    println!("\nGenerating configuration file: server-config.toml");
    std::fs::write("server-config.toml", &config_content)?;
    println!("Configuration saved successfully!");
    println!("----------------------------------------\n");

    let config: Config = toml::from_str(&config_content)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI args
    let cli = Cli::parse();

    if cli.generate_config {
        println!("{}", Config::default_template());
        return Ok(());
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "signatron_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| "server-config.toml".to_string());

    // First run without a config file: offer onboarding on a TTY.
    if std::fs::metadata(&config_path).is_err()
        && cli.config.is_none()
        && console::user_attended()
    {
        if let Err(e) = run_onboarding() {
            eprintln!("Onboarding failed: {}", e);
            std::process::exit(1);
        }
    }

    let effective_config_path = if std::fs::metadata(&config_path).is_ok() {
        config_path
    } else if std::fs::metadata("server-config.toml").is_ok() {
        "server-config.toml".to_string()
    } else {
        eprintln!("Error: Configuration file '{}' not found.", config_path);
        eprintln!("Run with --generate-config to see a template.");
        std::process::exit(1);
    };

    // Load configuration
    let config = Config::load(&effective_config_path)?;
    tracing::info!("Loaded configuration from {}", effective_config_path);

    let timezone = config.timezone()?;

    std::fs::create_dir_all(&config.storage.data_dir)?;
    std::fs::create_dir_all(&config.storage.media_dir)?;

    // Build shared state and restore the last snapshot
    let store = Arc::new(StateStore::new(&config.display.default_mode));
    let snapshots = Arc::new(SnapshotService::new(&config.storage.data_dir));
    snapshots.load(&store).await?;
    tracing::info!(
        "Restored snapshot: {} media, {} playlists, {} schedules",
        store.media.read().await.len(),
        store.playlists.read().await.len(),
        store.schedules.read().await.len()
    );

    let blobs = Arc::new(FsBlobStore::new(&config.storage.media_dir));
    let media_service = Arc::new(MediaService::new(store.clone(), blobs));

    let state = AppState {
        config: Arc::new(config.clone()),
        timezone,
        store,
        media_service,
        snapshots,
    };

    // Spawn display heartbeat monitor
    tokio::spawn(services::heartbeat_monitor::run(state.clone()));

    // Get address before moving state
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);

    // Determine UI path
    let static_path = if let Some(path) = &state.config.server.ui_path {
        tracing::info!("Using configured UI path: {}", path);
        path.clone()
    } else {
        tracing::info!("Using default static UI path: static");
        "static".to_string()
    };

    // Build router
    let app = Router::new()
        // API routes
        .nest("/api", api::routes())
        // Media blobs served to displays by stored file name
        .nest_service(
            "/media",
            ServeDir::new(&state.config.storage.media_dir),
        )
        // Serve static files (admin UI) with fallback to index.html for SPA routing
        .fallback_service(
            ServeDir::new(&static_path)
                .not_found_service(ServeFile::new(format!("{}/index.html", static_path))),
        )
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start server
    let listener_address: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid host/port: {}", e))?;

    if let Some(https_config) = &config.server.https {
        if https_config.enabled {
            use axum_server::tls_rustls::RustlsConfig;

            tracing::info!("Starting server in HTTPS mode on {}", addr);

            if !std::path::Path::new(&https_config.cert_path).exists() {
                anyhow::bail!("Certificate file not found: {}", https_config.cert_path);
            }
            if !std::path::Path::new(&https_config.key_path).exists() {
                anyhow::bail!("Key file not found: {}", https_config.key_path);
            }

            let tls_config =
                RustlsConfig::from_pem_file(&https_config.cert_path, &https_config.key_path)
                    .await?;

            axum_server::bind_rustls(listener_address, tls_config)
                .serve(app.into_make_service())
                .await?;

            return Ok(());
        }
    }

    // Default HTTP mode
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {} (HTTP)", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
