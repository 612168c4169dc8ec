//! Progsnap Storage
//!
//! Read-only access to a dataset, whether unpacked into a directory or
//! shipped as a zip archive. Both backends answer the same four questions:
//! open a file, is this a directory, is this a file, what is in this
//! directory.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod archive;
pub mod directory;
pub mod store;

pub use archive::ArchiveStorage;
pub use directory::DirectoryStorage;
pub use store::{Storage, StorageError, join};

use std::path::Path;
use std::sync::Arc;

/// Pick a backend for `path`: directories are read in place, regular files
/// are opened as zip archives
///
/// # Errors
///
/// Returns `NotFound` if the path is neither, or the archive error if the
/// file cannot be read as a zip archive
pub fn open_storage(path: &Path) -> Result<Arc<dyn Storage>, StorageError> {
    if path.is_dir() {
        tracing::debug!(path = %path.display(), "opening dataset directory");
        Ok(Arc::new(DirectoryStorage::new(path)))
    } else if path.is_file() {
        tracing::debug!(path = %path.display(), "opening dataset archive");
        Ok(Arc::new(ArchiveStorage::open(path)?))
    } else {
        Err(StorageError::NotFound {
            path: path.display().to_string(),
        })
    }
}
