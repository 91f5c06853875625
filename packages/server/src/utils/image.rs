//! Normalization of submitted cat images.
//!
//! Images arrive either inline as a `data:image/<ext>;base64,<payload>`
//! string in a JSON body or as a multipart file part. Both become an
//! [`ImageFile`] before anything touches storage.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::AppError;

pub const NOT_A_FILE_MESSAGE: &str =
    "The submitted data was not a file. Check the encoding type on the form.";
pub const EMPTY_FILE_MESSAGE: &str = "The submitted file is empty.";
pub const INVALID_IMAGE_MESSAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

const DATA_URI_PREFIX: &str = "data:image";
const BASE64_SEPARATOR: &str = ";base64,";

/// A decoded image waiting to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub extension: String,
    pub data: Vec<u8>,
}

impl ImageFile {
    fn new(name: String, extension: &str, data: Vec<u8>) -> Result<Self, AppError> {
        if data.is_empty() {
            return Err(AppError::field("image", EMPTY_FILE_MESSAGE));
        }

        let extension = extension.trim().to_ascii_lowercase();
        let is_image = !extension.is_empty()
            && extension.chars().all(|c| c.is_ascii_alphanumeric())
            && mime_guess::from_ext(&extension)
                .first()
                .is_some_and(|m| m.type_() == mime_guess::mime::IMAGE);
        if !is_image {
            return Err(AppError::field("image", INVALID_IMAGE_MESSAGE));
        }

        Ok(Self {
            name,
            extension,
            data,
        })
    }

    /// Decode an inline `data:image/<ext>;base64,<payload>` string into a
    /// file named `temp.<ext>`.
    ///
    /// Strings that are not data URIs are rejected the same way a non-file
    /// value would be for a binary upload. A malformed payload fails with
    /// the base64 decoder's own message.
    pub fn from_data_uri(value: &str) -> Result<Self, AppError> {
        if !value.starts_with(DATA_URI_PREFIX) {
            return Err(AppError::field("image", NOT_A_FILE_MESSAGE));
        }

        let (header, payload) = value.split_once(BASE64_SEPARATOR).ok_or_else(|| {
            AppError::field("image", "Image data URI must be base64 encoded")
        })?;
        let extension = header.rsplit('/').next().unwrap_or(header);

        let data = STANDARD
            .decode(payload.trim())
            .map_err(|e| AppError::Validation(e.to_string()))?;

        Self::new(format!("temp.{extension}"), extension, data)
    }

    /// Wrap a multipart file part. The extension comes from the uploaded
    /// file name.
    pub fn from_upload(file_name: Option<&str>, data: Vec<u8>) -> Result<Self, AppError> {
        let file_name = file_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::field("image", NOT_A_FILE_MESSAGE))?;
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or_default();

        Self::new(file_name.to_string(), extension, data)
    }
}
