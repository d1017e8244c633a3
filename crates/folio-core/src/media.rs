use crate::FolioResult;
use async_trait::async_trait;
use bytes::Bytes;

/// Capability to fetch the raw bytes of an uploaded image.
///
/// Transport adapters wrap their platform-specific media reference (for
/// Telegram, a `file_id` resolved through `getFile`) in this trait, so the
/// staging layer never learns about any particular chat platform's media
/// types.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Downloads the image content. Called at most once per staged photo,
    /// before the photo is acknowledged as stored.
    async fn fetch_bytes(&self) -> FolioResult<Bytes>;
}

/// A media source backed by an in-memory buffer.
///
/// Used by tests and by transports that already hold the full payload.
#[derive(Debug, Clone)]
pub struct StaticMedia(pub Bytes);

#[async_trait]
impl MediaSource for StaticMedia {
    async fn fetch_bytes(&self) -> FolioResult<Bytes> {
        Ok(self.0.clone())
    }
}
