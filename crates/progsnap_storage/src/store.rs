//! Uniform read-only access to a dataset container.

use progsnap_core::ProgsnapError;
use std::collections::BTreeSet;
use std::io::BufRead;

/// Storage error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// Path does not exist in the container
    #[error("Path not found: {path}")]
    NotFound { path: String },
    /// IO error
    #[error("IO error at {path}: {reason}")]
    Io { path: String, reason: String },
    /// Archive could not be decoded
    #[error("Invalid archive {path}: {reason}")]
    Archive { path: String, reason: String },
    /// Archive lock was poisoned by a panicking reader
    #[error("Archive lock poisoned")]
    Poisoned,
}

impl StorageError {
    pub(crate) fn from_io(path: &str, err: &std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound {
                path: path.to_string(),
            }
        } else {
            Self::Io {
                path: path.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

impl From<StorageError> for ProgsnapError {
    fn from(err: StorageError) -> Self {
        let reason = err.to_string();
        match err {
            StorageError::NotFound { path } => ProgsnapError::NotFound { path },
            StorageError::Io { path, .. } | StorageError::Archive { path, .. } => {
                ProgsnapError::storage(path, reason)
            }
            StorageError::Poisoned => ProgsnapError::storage("<archive>", reason),
        }
    }
}

/// Read-only view over a directory tree or an archive
///
/// Paths are relative to the container root and always use `/` as the
/// separator, whatever the host platform.
pub trait Storage: Send + Sync {
    /// Open a file for line-oriented reading
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the path does not name a file
    fn open(&self, path: &str) -> Result<Box<dyn BufRead + '_>, StorageError>;

    /// Whether the path names a directory
    fn is_dir(&self, path: &str) -> bool;

    /// Whether the path names a regular file
    fn is_file(&self, path: &str) -> bool;

    /// Names of the immediate children of a directory, sorted
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the path is not a directory
    fn list(&self, path: &str) -> Result<BTreeSet<String>, StorageError>;

    /// Human-readable location, for logs
    fn describe(&self) -> String;
}

/// Join a container path and a child name with `/`
#[must_use]
pub fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir.trim_end_matches('/'), name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join() {
        assert_eq!(join("history", "3"), "history/3");
        assert_eq!(join("history/", "3"), "history/3");
        assert_eq!(join("", "dataset.txt"), "dataset.txt");
    }

    #[test]
    fn test_not_found_maps_to_core() {
        let err: ProgsnapError = StorageError::NotFound {
            path: "students.txt".to_string(),
        }
        .into();
        assert_eq!(
            err,
            ProgsnapError::NotFound {
                path: "students.txt".to_string()
            }
        );
    }

    #[test]
    fn test_io_maps_to_storage() {
        let err: ProgsnapError = StorageError::Io {
            path: "a.txt".to_string(),
            reason: "denied".to_string(),
        }
        .into();
        assert!(matches!(err, ProgsnapError::Storage { ref path, .. } if path == "a.txt"));
    }

    #[test]
    fn test_from_io_kind() {
        let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(
            StorageError::from_io("x", &missing),
            StorageError::NotFound { .. }
        ));
        let other = std::io::Error::other("boom");
        assert!(matches!(
            StorageError::from_io("x", &other),
            StorageError::Io { .. }
        ));
    }
}
