use std::fmt;

use sha2::{Digest, Sha256};

use super::error::StorageError;

/// Directory prefix under which cat images are addressed.
pub const IMAGE_DIR: &str = "cats/images";

/// Identifies a stored image: the SHA-256 of its bytes plus the extension
/// it was uploaded with.
///
/// The relative path form is `cats/images/<64 hex chars>.<ext>` and is what
/// gets persisted on the cat row and exposed under the media URL.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ImageKey {
    hash: [u8; 32],
    extension: String,
}

impl ImageKey {
    /// Hash `data` and pair it with `extension` (lowercased).
    pub fn compute(data: &[u8], extension: &str) -> Result<Self, StorageError> {
        let extension = normalize_extension(extension)?;
        Ok(Self {
            hash: Sha256::digest(data).into(),
            extension,
        })
    }

    pub(crate) fn from_parts(hash: [u8; 32], extension: &str) -> Result<Self, StorageError> {
        Ok(Self {
            hash,
            extension: normalize_extension(extension)?,
        })
    }

    /// Parse a bare file name of the form `<hex>.<ext>`.
    pub fn from_file_name(name: &str) -> Result<Self, StorageError> {
        let (stem, ext) = name
            .rsplit_once('.')
            .ok_or_else(|| StorageError::InvalidKey(format!("missing extension in '{name}'")))?;

        if stem.len() != 64 {
            return Err(StorageError::InvalidKey(format!(
                "expected 64 hex characters, got {}",
                stem.len()
            )));
        }
        let bytes =
            hex::decode(stem).map_err(|e| StorageError::InvalidKey(format!("invalid hex: {e}")))?;
        let hash: [u8; 32] = bytes
            .try_into()
            .map_err(|_| StorageError::InvalidKey("decoded to wrong length".into()))?;

        Self::from_parts(hash, ext)
    }

    /// Parse a stored relative path (`cats/images/<hex>.<ext>`).
    pub fn from_path(path: &str) -> Result<Self, StorageError> {
        let name = path
            .strip_prefix(IMAGE_DIR)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| StorageError::InvalidKey(format!("'{path}' is not an image path")))?;
        Self::from_file_name(name)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.hash)
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// File name within the image directory.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.to_hex(), self.extension)
    }

    /// Relative path persisted on the cat row.
    pub fn path(&self) -> String {
        format!("{IMAGE_DIR}/{}", self.file_name())
    }

    /// First two hex characters, used as the on-disk shard directory.
    pub(crate) fn shard_prefix(&self) -> String {
        hex::encode(&self.hash[..1])
    }

    pub(crate) fn shard_suffix(&self) -> String {
        hex::encode(&self.hash[1..])
    }
}

fn normalize_extension(ext: &str) -> Result<String, StorageError> {
    let ext = ext.trim().to_ascii_lowercase();
    if ext.is_empty() || ext.len() > 16 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(StorageError::InvalidKey(format!(
            "unsupported extension '{ext}'"
        )));
    }
    Ok(ext)
}

impl fmt::Debug for ImageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageKey({})", self.path())
    }
}

impl fmt::Display for ImageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
