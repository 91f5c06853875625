use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::BufReader;

use super::error::StorageError;
use super::key::ImageKey;
use super::traits::{ImageReader, ImageStore};

/// Filesystem-backed image store.
///
/// Images live in a sharded layout keyed by content hash:
/// `{base_path}/{first 2 hex chars}/{remaining 62 hex chars}`.
/// The extension is part of the key only, so identical bytes uploaded as
/// `png` and `jpg` share one file on disk.
pub struct FilesystemImageStore {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemImageStore {
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            max_size,
        })
    }

    fn image_path(&self, key: &ImageKey) -> PathBuf {
        self.base_path
            .join(key.shard_prefix())
            .join(key.shard_suffix())
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl ImageStore for FilesystemImageStore {
    async fn put(&self, data: &[u8], extension: &str) -> Result<ImageKey, StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let key = ImageKey::compute(data, extension)?;
        let image_path = self.image_path(&key);

        if fs::try_exists(&image_path).await? {
            tracing::debug!(key = %key, "image already stored");
            return Ok(key);
        }

        // Write to a temp file first so readers never see a partial image.
        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Some(parent) = image_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&temp_path, &image_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(key)
    }

    async fn open(&self, key: &ImageKey) -> Result<ImageReader, StorageError> {
        let image_path = self.image_path(key);
        let file = match fs::File::open(&image_path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(key.path()));
            }
            Err(e) => return Err(e.into()),
        };
        let size = file.metadata().await?.len();
        Ok(ImageReader {
            reader: Box::new(BufReader::new(file)),
            size,
        })
    }
}
