use std::sync::Arc;

use crate::application::ports::trash_ports::TrashUseCase;
use crate::common::config::TrashConfig;

/// Background sweeper that permanently removes trash entries older than
/// the configured retention period.
pub struct TrashCleanupService {
    trash_service: Arc<dyn TrashUseCase>,
    config: TrashConfig,
}

impl TrashCleanupService {
    pub fn new(trash_service: Arc<dyn TrashUseCase>, config: TrashConfig) -> Self {
        Self {
            trash_service,
            config,
        }
    }

    /// Spawns the periodic cleanup task. The first sweep runs
    /// immediately so a restart never extends retention.
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tracing::info!(
            "Starting trash cleanup task (retention: {} days, interval: {} hours)",
            self.config.retention_days,
            self.config.cleanup_interval_hours
        );

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.config.cleanup_interval());
            loop {
                interval.tick().await;
                self.run_sweep().await;
            }
        })
    }

    async fn run_sweep(&self) {
        tracing::debug!("Running trash cleanup sweep");
        match self.trash_service.purge_expired().await {
            Ok(0) => tracing::debug!("Trash cleanup found nothing to remove"),
            Ok(removed) => tracing::info!("Trash cleanup removed {} expired entries", removed),
            // A failed sweep is retried at the next tick
            Err(e) => tracing::error!("Trash cleanup sweep failed: {}", e),
        }
    }
}
