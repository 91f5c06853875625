use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::error::StorageError;
use super::key::ImageKey;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// An opened image ready to be streamed.
pub struct ImageReader {
    pub reader: BoxReader,
    pub size: u64,
}

/// Content-addressed storage for cat images.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store image bytes and return their key. Storing identical bytes twice
    /// yields the same key and a single copy.
    async fn put(&self, data: &[u8], extension: &str) -> Result<ImageKey, StorageError>;

    /// Open a stored image for streaming.
    async fn open(&self, key: &ImageKey) -> Result<ImageReader, StorageError>;
}
