//! Plain directory backend.

use crate::store::{Storage, StorageError};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Dataset stored as an unpacked directory tree
#[derive(Debug, Clone)]
pub struct DirectoryStorage {
    root: PathBuf,
}

impl DirectoryStorage {
    /// Create a backend rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |acc, segment| acc.join(segment))
    }
}

impl Storage for DirectoryStorage {
    fn open(&self, path: &str) -> Result<Box<dyn BufRead + '_>, StorageError> {
        let file = File::open(self.resolve(path)).map_err(|e| StorageError::from_io(path, &e))?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn is_dir(&self, path: &str) -> bool {
        self.resolve(path).is_dir()
    }

    fn is_file(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }

    fn list(&self, path: &str) -> Result<BTreeSet<String>, StorageError> {
        let entries = fs::read_dir(self.resolve(path)).map_err(|e| StorageError::from_io(path, &e))?;
        let mut names = BTreeSet::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::from_io(path, &e))?;
            match entry.file_name().into_string() {
                Ok(name) => {
                    names.insert(name);
                }
                Err(raw) => tracing::warn!(dir = path, name = ?raw, "skipping non-UTF-8 entry"),
            }
        }
        Ok(names)
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("dataset.txt"), "{\"tag\":\"name\",\"value\":\"x\"}\n").unwrap();
        fs::create_dir_all(dir.path().join("history/2")).unwrap();
        fs::write(dir.path().join("history/2/10.txt"), "").unwrap();
        fs::create_dir_all(dir.path().join("history/1")).unwrap();
        dir
    }

    #[test]
    fn test_open_and_read() {
        let dir = fixture();
        let storage = DirectoryStorage::new(dir.path());
        let mut text = String::new();
        storage.open("dataset.txt").unwrap().read_to_string(&mut text).unwrap();
        assert!(text.contains("\"name\""));
    }

    #[test]
    fn test_open_missing() {
        let dir = fixture();
        let storage = DirectoryStorage::new(dir.path());
        assert!(matches!(
            storage.open("students.txt"),
            Err(StorageError::NotFound { .. })
        ));
    }

    #[test]
    fn test_dir_and_file_checks() {
        let dir = fixture();
        let storage = DirectoryStorage::new(dir.path());
        assert!(storage.is_dir("history"));
        assert!(storage.is_dir("history/2"));
        assert!(!storage.is_file("history/2"));
        assert!(storage.is_file("history/2/10.txt"));
        assert!(!storage.is_dir("history/2/10.txt"));
        assert!(!storage.is_file("missing.txt"));
    }

    #[test]
    fn test_list_sorted() {
        let dir = fixture();
        let storage = DirectoryStorage::new(dir.path());
        let names: Vec<String> = storage.list("history").unwrap().into_iter().collect();
        assert_eq!(names, vec!["1".to_string(), "2".to_string()]);
        assert!(storage.list("nope").is_err());
    }
}
