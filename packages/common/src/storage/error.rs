use thiserror::Error;

/// Errors that can occur while storing or reading cat images.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No image is stored under the requested key.
    #[error("image not found: {0}")]
    NotFound(String),
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The stored path or file name does not describe a valid image key.
    #[error("invalid image key: {0}")]
    InvalidKey(String),
    /// The image exceeds the configured size limit.
    #[error("image exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: u64, limit: u64 },
}
