use std::io;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use uuid::Uuid;

use crate::common::errors::Result;

/// Streamed archive bytes
pub type ArchiveStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

/// A ready-to-serve archive: the byte stream plus a suggested filename
pub struct ArchiveDownload {
    pub stream: ArchiveStream,
    pub suggested_name: String,
}

impl std::fmt::Debug for ArchiveDownload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveDownload")
            .field("suggested_name", &self.suggested_name)
            .finish_non_exhaustive()
    }
}

/// Port for ZIP archive use cases. Size and entry-count limits are
/// validated before any archive byte is produced.
#[async_trait]
pub trait ArchiveUseCase: Send + Sync {
    /// Archives one folder, preserving its hierarchy as entry paths
    async fn stream_folder(&self, user_id: Uuid, folder_id: Uuid) -> Result<ArchiveDownload>;

    /// Archives an arbitrary selection; folders are expanded recursively
    /// and loose files land at the archive root
    async fn stream_selection(
        &self,
        user_id: Uuid,
        item_ids: Vec<Uuid>,
    ) -> Result<ArchiveDownload>;
}
