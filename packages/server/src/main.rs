use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use common::storage::filesystem::FilesystemImageStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use kittygram::config::AppConfig;
use kittygram::database::{ensure_indexes, init_db};
use kittygram::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::load().context("Failed to load config")?;
    if config.server.debug {
        warn!("Debug mode: serving stored images under /media/");
    }

    let db = init_db(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    ensure_indexes(&db).await?;
    info!("Database ready");

    let images = FilesystemImageStore::new(
        config.storage.data_dir.clone(),
        config.storage.max_image_size,
    )
    .await
    .context("Failed to initialize image store")?;
    info!(data_dir = %config.storage.data_dir.display(), "Image store ready");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let state = AppState {
        db,
        config,
        images: Arc::new(images),
    };
    let app = kittygram::build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Kittygram listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
