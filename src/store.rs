//! Flat file store module
//!
//! Owns filename validation and all filesystem operations under the base
//! directory. Handlers translate `StoreError` into HTTP status codes.

use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncReadExt;

use crate::config::StorageConfig;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid filename or extension")]
    InvalidName,
    #[error("Not found")]
    NotFound,
    #[error("File too large")]
    TooLarge,
    #[error("Content is not valid UTF-8")]
    NotUtf8,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read-only projection of a stored file, computed fresh on every listing
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub size: u64,
    pub mtime: u64,
}

/// Result of a successful write
#[derive(Debug)]
pub struct WriteOutcome {
    pub created: bool,
    pub size: usize,
}

/// Content and metadata of a successfully read file
#[derive(Debug)]
pub struct StoredFile {
    pub content: Vec<u8>,
    pub modified: SystemTime,
}

pub struct FileStore {
    base_dir: PathBuf,
    max_file_size: u64,
    allowed_extensions: Vec<String>,
}

impl FileStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            base_dir: PathBuf::from(&config.base_dir),
            max_file_size: config.max_file_size,
            allowed_extensions: config
                .allowed_extensions
                .iter()
                .map(|ext| ext.to_ascii_lowercase())
                .collect(),
        }
    }

    pub const fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Create the base directory if it does not exist yet
    pub async fn ensure_base_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.base_dir).await
    }

    /// Validate a requested filename without touching the filesystem
    ///
    /// Rejects names whose extension is absent or not in the allowed set
    /// (case-insensitive), and names that could escape the base directory.
    pub fn validate_name(&self, name: &str) -> Result<(), StoreError> {
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(StoreError::InvalidName);
        }
        let ext = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or(StoreError::InvalidName)?;
        if self.allowed_extensions.iter().any(|allowed| *allowed == ext) {
            Ok(())
        } else {
            Err(StoreError::InvalidName)
        }
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, StoreError> {
        self.validate_name(name)?;
        Ok(self.base_dir.join(name))
    }

    /// List regular files with an allowed extension, ascending by name
    pub async fn list(&self) -> Result<Vec<ListingEntry>, StoreError> {
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(&self.base_dir).await?;
        while let Some(entry) = dir.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if self.validate_name(&name).is_err() {
                continue;
            }
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            entries.push(ListingEntry {
                name,
                size: meta.len(),
                mtime: unix_seconds(meta.modified()?),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Read a stored file, enforcing the size cap and UTF-8 requirement
    ///
    /// Reads at most `max_file_size + 1` bytes so an oversized file is
    /// detected without loading it whole.
    pub async fn read(&self, name: &str) -> Result<StoredFile, StoreError> {
        let path = self.resolve(name)?;
        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StoreError::NotFound),
            Err(e) => return Err(StoreError::Io(e)),
        };
        let modified = file.metadata().await?.modified()?;

        let mut content = Vec::new();
        file.take(self.max_file_size + 1)
            .read_to_end(&mut content)
            .await?;
        if content.len() as u64 > self.max_file_size {
            return Err(StoreError::TooLarge);
        }
        if std::str::from_utf8(&content).is_err() {
            return Err(StoreError::NotUtf8);
        }
        Ok(StoredFile { content, modified })
    }

    /// Write (create or overwrite) a stored file
    ///
    /// The existence check happens before the write so the caller can
    /// distinguish creation from overwrite. The write itself is not atomic;
    /// a crash mid-write can leave a partial file.
    pub async fn write(&self, name: &str, content: &[u8]) -> Result<WriteOutcome, StoreError> {
        let path = self.resolve(name)?;
        if content.len() as u64 > self.max_file_size {
            return Err(StoreError::TooLarge);
        }
        if std::str::from_utf8(content).is_err() {
            return Err(StoreError::NotUtf8);
        }
        let created = !fs::try_exists(&path).await?;
        fs::write(&path, content).await?;
        Ok(WriteOutcome {
            created,
            size: content.len(),
        })
    }

    /// Remove a stored file, reporting whether it existed
    pub async fn delete(&self, name: &str) -> Result<bool, StoreError> {
        let path = self.resolve(name)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

fn unix_seconds(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MAX_SIZE: u64 = 64;

    fn test_store(dir: &TempDir) -> FileStore {
        FileStore::new(&StorageConfig {
            base_dir: dir.path().to_string_lossy().into_owned(),
            max_file_size: MAX_SIZE,
            allowed_extensions: vec!["txt".to_string(), "md".to_string()],
        })
    }

    #[test]
    fn test_validate_name() {
        let dir = TempDir::new().expect("tempdir");
        let store = test_store(&dir);

        assert!(store.validate_name("notes.txt").is_ok());
        assert!(store.validate_name("README.md").is_ok());
        // Extension matching is case-insensitive
        assert!(store.validate_name("NOTES.TXT").is_ok());

        assert!(matches!(
            store.validate_name("script.sh"),
            Err(StoreError::InvalidName)
        ));
        assert!(matches!(
            store.validate_name("no_extension"),
            Err(StoreError::InvalidName)
        ));
        assert!(matches!(store.validate_name(""), Err(StoreError::InvalidName)));
    }

    #[test]
    fn test_validate_name_rejects_traversal() {
        let dir = TempDir::new().expect("tempdir");
        let store = test_store(&dir);

        assert!(matches!(
            store.validate_name("../escape.txt"),
            Err(StoreError::InvalidName)
        ));
        assert!(matches!(
            store.validate_name("sub/dir.txt"),
            Err(StoreError::InvalidName)
        ));
        assert!(matches!(
            store.validate_name("..\\escape.txt"),
            Err(StoreError::InvalidName)
        ));
    }

    #[tokio::test]
    async fn test_write_then_read_round_trip() {
        let dir = TempDir::new().expect("tempdir");
        let store = test_store(&dir);

        let outcome = store.write("notes.txt", b"hello").await.expect("write");
        assert!(outcome.created);
        assert_eq!(outcome.size, 5);

        let file = store.read("notes.txt").await.expect("read");
        assert_eq!(file.content, b"hello");
    }

    #[tokio::test]
    async fn test_overwrite_reports_not_created() {
        let dir = TempDir::new().expect("tempdir");
        let store = test_store(&dir);

        let first = store.write("notes.txt", b"hello").await.expect("write");
        assert!(first.created);

        let second = store
            .write("notes.txt", b"hello world")
            .await
            .expect("overwrite");
        assert!(!second.created);
        assert_eq!(second.size, 11);

        let file = store.read("notes.txt").await.expect("read");
        assert_eq!(file.content, b"hello world");
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let dir = TempDir::new().expect("tempdir");
        let store = test_store(&dir);

        assert!(matches!(
            store.read("absent.txt").await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_size_boundary() {
        let dir = TempDir::new().expect("tempdir");
        let store = test_store(&dir);

        let exact = vec![b'a'; MAX_SIZE as usize];
        let outcome = store.write("exact.txt", &exact).await.expect("write at max");
        assert_eq!(outcome.size as u64, MAX_SIZE);

        let over = vec![b'a'; MAX_SIZE as usize + 1];
        assert!(matches!(
            store.write("over.txt", &over).await,
            Err(StoreError::TooLarge)
        ));
        assert!(matches!(
            store.read("over.txt").await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_read_oversized_existing_file() {
        let dir = TempDir::new().expect("tempdir");
        let store = test_store(&dir);

        // Placed outside the store's write path to bypass its size check
        std::fs::write(
            dir.path().join("big.txt"),
            vec![b'a'; MAX_SIZE as usize + 1],
        )
        .expect("write oversized file");

        assert!(matches!(
            store.read("big.txt").await,
            Err(StoreError::TooLarge)
        ));
    }

    #[tokio::test]
    async fn test_non_utf8_rejected_without_side_effects() {
        let dir = TempDir::new().expect("tempdir");
        let store = test_store(&dir);

        assert!(matches!(
            store.write("bin.txt", &[0xff, 0xfe, 0xfd]).await,
            Err(StoreError::NotUtf8)
        ));
        assert!(matches!(
            store.read("bin.txt").await,
            Err(StoreError::NotFound)
        ));

        std::fs::write(dir.path().join("raw.txt"), [0xff, 0xfe]).expect("write binary file");
        assert!(matches!(
            store.read("raw.txt").await,
            Err(StoreError::NotUtf8)
        ));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = TempDir::new().expect("tempdir");
        let store = test_store(&dir);

        store.write("gone.txt", b"bye").await.expect("write");
        assert!(store.delete("gone.txt").await.expect("first delete"));
        assert!(!store.delete("gone.txt").await.expect("second delete"));
        assert!(!store.delete("gone.txt").await.expect("third delete"));
    }

    #[tokio::test]
    async fn test_list_sorted_and_filtered() {
        let dir = TempDir::new().expect("tempdir");
        let store = test_store(&dir);

        store.write("b.md", b"second").await.expect("write b.md");
        store.write("a.txt", b"first").await.expect("write a.txt");
        // Disallowed extension and subdirectory must not appear
        std::fs::write(dir.path().join("skip.sh"), b"#!/bin/sh").expect("write skip.sh");
        std::fs::create_dir(dir.path().join("nested.txt")).expect("create dir");

        let entries = store.list().await.expect("list");
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.md"]);
        assert_eq!(entries[0].size, 5);
        assert_eq!(entries[1].size, 6);
    }

    #[tokio::test]
    async fn test_list_empty_directory() {
        let dir = TempDir::new().expect("tempdir");
        let store = test_store(&dir);

        let entries = store.list().await.expect("list");
        assert!(entries.is_empty());
    }
}
