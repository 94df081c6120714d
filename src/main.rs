//! TreeVault - Hierarchical File Storage Core
//!
//! A multi-tenant storage backend keeping a logical item tree (files
//! and folders) consistent across a relational database and a physical
//! filesystem mirror. The system provides:
//!
//! - Per-user file and folder hierarchies with soft-delete trash
//! - Dual-write mutations with compensation on partial failure
//! - Recursive tree queries in a single database round trip
//! - Streamed ZIP downloads of folders and selections
//! - A periodic sweep enforcing trash retention

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use treevault::common::{config::AppConfig, db::create_database_pool};
use treevault::{
    FilesystemService, ItemPgRepository, PathService, TrashCleanupService, TrashService,
    UserLockRegistry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,sqlx=warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();
    tracing::info!("Storage root: {}", config.storage.root.display());

    tokio::fs::create_dir_all(&config.storage.root).await?;

    let pool = Arc::new(create_database_pool(&config).await?);

    let item_repository = Arc::new(ItemPgRepository::new(pool.clone()));
    let path_service = Arc::new(PathService::new(config.storage.root.clone()));
    let filesystem = Arc::new(FilesystemService::new(path_service));
    let locks = Arc::new(UserLockRegistry::new());

    // The standalone daemon only drives the retention sweep; the use-case
    // services are wired by whatever frontend embeds this crate.
    let trash_service = Arc::new(TrashService::new(
        item_repository,
        filesystem,
        locks,
        config.trash.clone(),
    ));

    let cleanup = Arc::new(TrashCleanupService::new(
        trash_service.clone(),
        config.trash.clone(),
    ));
    let sweep = cleanup.start();

    tracing::info!("Storage core running, press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    sweep.abort();

    Ok(())
}
