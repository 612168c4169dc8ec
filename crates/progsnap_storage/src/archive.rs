//! Zip archive backend.
//!
//! Zip files often omit directory entries, so the directory set is derived
//! once, at construction, from the ancestors of every entry name.

use crate::store::{Storage, StorageError};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, Cursor, Read, Seek};
use std::path::Path;
use std::sync::Mutex;
use zip::ZipArchive;
use zip::result::ZipError;

/// Dataset packed into a zip archive
pub struct ArchiveStorage<R> {
    archive: Mutex<ZipArchive<R>>,
    files: BTreeSet<String>,
    dirs: BTreeSet<String>,
    label: String,
}

impl ArchiveStorage<File> {
    /// Open an archive on disk
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened or is not a zip archive
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let label = path.display().to_string();
        let file = File::open(path).map_err(|e| StorageError::from_io(&label, &e))?;
        Self::from_reader(file, label)
    }
}

impl<R: Read + Seek> ArchiveStorage<R> {
    /// Wrap any seekable reader holding a zip archive
    ///
    /// # Errors
    ///
    /// Returns `Archive` if the reader does not hold a valid zip archive
    pub fn from_reader(reader: R, label: impl Into<String>) -> Result<Self, StorageError> {
        let label = label.into();
        let archive = ZipArchive::new(reader).map_err(|e| StorageError::Archive {
            path: label.clone(),
            reason: e.to_string(),
        })?;

        let mut files = BTreeSet::new();
        let mut dirs = BTreeSet::new();
        for name in archive.file_names() {
            let trimmed = match name.strip_suffix('/') {
                Some(dir) => {
                    dirs.insert(dir.to_string());
                    dir
                }
                None => {
                    files.insert(name.to_string());
                    name
                }
            };
            let mut dirpart = parent(trimmed);
            while let Some(dir) = dirpart {
                dirs.insert(dir.to_string());
                dirpart = parent(dir);
            }
        }
        tracing::debug!(
            archive = %label,
            files = files.len(),
            dirs = dirs.len(),
            "indexed archive entries"
        );

        Ok(Self {
            archive: Mutex::new(archive),
            files,
            dirs,
            label,
        })
    }
}

/// Directory part of an entry name, if it has one
fn parent(name: &str) -> Option<&str> {
    match name.rfind('/') {
        Some(idx) if idx > 0 => Some(&name[..idx]),
        _ => None,
    }
}

impl<R: Read + Seek + Send> Storage for ArchiveStorage<R> {
    fn open(&self, path: &str) -> Result<Box<dyn BufRead + '_>, StorageError> {
        let mut archive = self.archive.lock().map_err(|_| StorageError::Poisoned)?;
        let mut entry = archive.by_name(path).map_err(|e| match e {
            ZipError::FileNotFound => StorageError::NotFound {
                path: path.to_string(),
            },
            other => StorageError::Archive {
                path: path.to_string(),
                reason: other.to_string(),
            },
        })?;
        let mut bytes = Vec::new();
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| StorageError::from_io(path, &e))?;
        Ok(Box::new(Cursor::new(bytes)))
    }

    fn is_dir(&self, path: &str) -> bool {
        self.dirs.contains(path.trim_end_matches('/'))
    }

    fn is_file(&self, path: &str) -> bool {
        self.files.contains(path)
    }

    fn list(&self, path: &str) -> Result<BTreeSet<String>, StorageError> {
        let dir = path.trim_end_matches('/');
        let prefix = if dir.is_empty() {
            String::new()
        } else if self.dirs.contains(dir) {
            format!("{dir}/")
        } else {
            return Err(StorageError::NotFound {
                path: path.to_string(),
            });
        };

        let members = self
            .files
            .iter()
            .chain(self.dirs.iter())
            .filter_map(|name| name.strip_prefix(prefix.as_str()))
            .filter(|rest| !rest.is_empty())
            .map(|rest| rest.split('/').next().unwrap_or(rest).to_string())
            .collect();
        Ok(members)
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

impl<R> std::fmt::Debug for ArchiveStorage<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveStorage")
            .field("label", &self.label)
            .field("files", &self.files.len())
            .field("dirs", &self.dirs.len())
            .finish()
    }
}
