//! Filesystem-backed content store.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use uuid::Uuid;

use super::{ContentStore, sanitize_filename};
use crate::error::{Result, StorageError};

/// Stores raw file content under a single upload directory.
///
/// Writes go through a temp file followed by an atomic rename so a crashed
/// write never leaves a partial blob behind.
#[derive(Debug)]
pub struct FsContentStore {
    upload_dir: PathBuf,
}

impl FsContentStore {
    /// Create a store rooted at `upload_dir`, creating the directory if
    /// needed.
    pub fn new(upload_dir: impl Into<PathBuf>) -> Result<Self> {
        let upload_dir = upload_dir.into();
        if !upload_dir.exists() {
            fs::create_dir_all(&upload_dir).map_err(StorageError::Io)?;
            info!("created upload directory: {}", upload_dir.display());
        }
        Ok(Self { upload_dir })
    }

    fn path_for(&self, content_ref: &str) -> PathBuf {
        // content_ref is generated by this store; sanitize anyway so a
        // hostile ref cannot escape the upload directory.
        self.upload_dir.join(sanitize_filename(content_ref))
    }

    fn extension_of(name: &str) -> &str {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin")
    }
}

impl ContentStore for FsContentStore {
    fn store(&self, bytes: &[u8], suggested_name: &str) -> Result<String> {
        if bytes.is_empty() {
            return Err(StorageError::EmptyContent.into());
        }

        let extension = Self::extension_of(suggested_name);
        let content_ref = format!("{}.{}", Uuid::new_v4(), extension);
        let target = self.path_for(&content_ref);

        let mut tmp =
            tempfile::NamedTempFile::new_in(&self.upload_dir).map_err(StorageError::Io)?;
        tmp.write_all(bytes).map_err(StorageError::Io)?;
        tmp.persist(&target)
            .map_err(|e| StorageError::Io(e.error))?;

        debug!(
            "stored {} bytes as {} (from {})",
            bytes.len(),
            content_ref,
            suggested_name
        );
        Ok(content_ref)
    }

    fn read(&self, content_ref: &str) -> Result<Vec<u8>> {
        let path = self.path_for(content_ref);
        if !path.exists() {
            return Err(StorageError::NotFound(content_ref.to_string()).into());
        }
        fs::read(&path).map_err(|e| StorageError::Io(e).into())
    }

    fn delete(&self, content_ref: &str) -> Result<()> {
        let path = self.path_for(content_ref);
        if !path.exists() {
            return Err(StorageError::NotFound(content_ref.to_string()).into());
        }
        fs::remove_file(&path).map_err(|e| StorageError::Io(e).into())
    }

    fn size(&self, content_ref: &str) -> u64 {
        fs::metadata(self.path_for(content_ref))
            .map(|m| m.len())
            .unwrap_or(0)
    }
}
