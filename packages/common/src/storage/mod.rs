mod error;
mod key;
mod traits;

pub mod filesystem;

pub use error::StorageError;
pub use key::{IMAGE_DIR, ImageKey};
pub use traits::{BoxReader, ImageReader, ImageStore};
