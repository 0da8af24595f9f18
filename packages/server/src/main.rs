use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use common::storage::filesystem::FilesystemUploadStore;
use hackathon_server::config::AppConfig;
use hackathon_server::database::init_db;
use hackathon_server::schema::ensure_indexes;
use hackathon_server::session::{SessionStore, spawn_cleanup_task};
use hackathon_server::state::AppState;
use tracing::{Level, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load()?;

    let db = init_db(&config.database.url).await?;
    ensure_indexes(&db).await?;

    let uploads = Arc::new(FilesystemUploadStore::new(
        &config.storage.upload_dir,
        &config.storage.public_prefix,
    ));
    info!(upload_dir = %config.storage.upload_dir.display(), "Serving uploads");

    let sessions = SessionStore::new();
    spawn_cleanup_task(
        sessions.clone(),
        Duration::from_secs(config.session.cleanup_interval_secs),
        Duration::from_secs(config.session.max_age_secs),
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let state = AppState {
        db,
        config,
        uploads,
        sessions,
    };
    let app = hackathon_server::build_router(state);

    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
