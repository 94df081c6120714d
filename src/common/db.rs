use anyhow::Result;
use sqlx::{postgres::PgPoolOptions, Executor, PgPool};
use std::time::Duration;

use crate::common::config::AppConfig;

/// SQL executed on first run to bootstrap the storage schema.
///
/// `items` mirrors a per-user directory tree: `parent_id` is null for
/// root-level entries and cascades on permanent delete so removing a
/// folder row removes its whole subtree.
const BOOTSTRAP_SCHEMA: &str = r#"
    CREATE SCHEMA IF NOT EXISTS storage;

    CREATE TABLE IF NOT EXISTS storage.users (
        id UUID PRIMARY KEY,
        username VARCHAR(32) NOT NULL UNIQUE,
        email VARCHAR(255) NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        subscription_plan VARCHAR(16) NOT NULL DEFAULT 'free',
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    );

    CREATE TABLE IF NOT EXISTS storage.items (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL REFERENCES storage.users(id) ON DELETE CASCADE,
        parent_id UUID REFERENCES storage.items(id) ON DELETE CASCADE,
        name VARCHAR(250) NOT NULL,
        kind VARCHAR(8) NOT NULL,
        file_path TEXT,
        file_size BIGINT,
        mime_type VARCHAR(255),
        is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
        deleted_at TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_items_parent_user ON storage.items(parent_id, user_id);
    CREATE INDEX IF NOT EXISTS idx_items_user_kind ON storage.items(user_id, kind);
    CREATE INDEX IF NOT EXISTS idx_items_name ON storage.items(lower(name));
    CREATE INDEX IF NOT EXISTS idx_items_deleted_at ON storage.items(deleted_at)
        WHERE is_deleted;
"#;

pub async fn create_database_pool(config: &AppConfig) -> Result<PgPool> {
    tracing::info!(
        "Initializing PostgreSQL connection to {}",
        config
            .database
            .connection_string
            .replace("postgres://", "postgres://[user]:[pass]@")
    );

    let mut attempt = 0;
    const MAX_ATTEMPTS: usize = 3;

    while attempt < MAX_ATTEMPTS {
        attempt += 1;
        tracing::info!("PostgreSQL connection attempt #{}", attempt);

        match PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .min_connections(config.database.min_connections)
            .acquire_timeout(Duration::from_secs(config.database.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.database.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.database.max_lifetime_secs))
            .connect(&config.database.connection_string)
            .await
        {
            Ok(pool) => match sqlx::query("SELECT 1").execute(&pool).await {
                Ok(_) => {
                    // The script holds several commands; Postgres accepts
                    // those only over the simple query protocol, which
                    // executing the raw `&str` selects.
                    match pool.execute(BOOTSTRAP_SCHEMA).await {
                        Ok(_) => {
                            tracing::info!("PostgreSQL connection established, schema ready");
                            return Ok(pool);
                        }
                        Err(e) => {
                            tracing::error!("Schema bootstrap failed: {}", e);
                            if attempt >= MAX_ATTEMPTS {
                                return Err(anyhow::anyhow!(
                                    "PostgreSQL schema bootstrap failed: {}",
                                    e
                                ));
                            }
                        }
                    }
                }
                Err(e) => {
                    tracing::error!("Connection probe failed: {}", e);
                    if attempt >= MAX_ATTEMPTS {
                        return Err(anyhow::anyhow!("PostgreSQL connection failed: {}", e));
                    }
                }
            },
            Err(e) => {
                tracing::error!("PostgreSQL connection error: {}", e);
                if attempt >= MAX_ATTEMPTS {
                    return Err(anyhow::anyhow!("PostgreSQL connection failed: {}", e));
                }
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }

    Err(anyhow::anyhow!(
        "Could not establish PostgreSQL connection after {} attempts",
        MAX_ATTEMPTS
    ))
}
