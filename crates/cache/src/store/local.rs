//! Local filesystem store

use super::Store;
use crate::{Error, Result};
use async_trait::async_trait;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::fs;
use tracing::debug;

/// Stores entries as plain files, one file per location
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStore;

impl LocalStore {
    /// Create a local store
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Store for LocalStore {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn exists(&self, location: &str) -> Result<bool> {
        let path = Path::new(location);
        fs::try_exists(path)
            .await
            .map_err(|e| Error::io(e, path, "exists"))
    }

    async fn read(&self, location: &str) -> Result<Option<Vec<u8>>> {
        let path = Path::new(location);
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(e, path, "read")),
        }
    }

    async fn write(&self, location: &str, bytes: &[u8]) -> Result<()> {
        let path = Path::new(location);
        let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| Error::io(e, parent, "create_dir_all"))?;
                parent.to_path_buf()
            }
            None => PathBuf::from("."),
        };

        let target = path.to_path_buf();
        let content = bytes.to_vec();
        tokio::task::spawn_blocking(move || replace_file(&parent, &target, &content))
            .await
            .map_err(|e| Error::io(std::io::Error::other(e), path, "write"))??;

        debug!(location, size = bytes.len(), "Wrote local cache entry");
        Ok(())
    }
}

/// Write `content` next to `target` and rename it into place
///
/// Readers see either the previous entry or the complete new one.
fn replace_file(dir: &Path, target: &Path, content: &[u8]) -> Result<()> {
    let mut staged =
        NamedTempFile::new_in(dir).map_err(|e| Error::io(e, dir, "create staging file"))?;
    staged
        .write_all(content)
        .and_then(|()| staged.as_file().sync_data())
        .map_err(|e| Error::io(e, staged.path(), "write"))?;
    staged
        .persist(target)
        .map_err(|e| Error::io(e.error, target, "persist"))?;
    Ok(())
}
