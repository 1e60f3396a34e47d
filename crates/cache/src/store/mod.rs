//! Storage backends for cache entries
//!
//! Both backends are addressed by the same location string, the cache
//! directory joined with the cache key, so one key names the same entry
//! locally and in the remote bucket.

mod local;
mod remote;

pub use local::LocalStore;
pub use remote::{
    DEFAULT_CONTENT_TYPE, ObjectRef, ObjectTransport, RemoteConfig, RemoteCredentials,
    RemoteStore,
};

use crate::Result;
use async_trait::async_trait;
use std::path::Path;

/// A place that can store and retrieve bytes by location
#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend name used in logs
    fn name(&self) -> &'static str;

    /// Whether an entry exists at `location`
    async fn exists(&self, location: &str) -> Result<bool>;

    /// Read the entry at `location`, `None` when absent
    async fn read(&self, location: &str) -> Result<Option<Vec<u8>>>;

    /// Write `bytes` to `location`, replacing any previous content
    async fn write(&self, location: &str, bytes: &[u8]) -> Result<()>;
}

/// Join a cache directory and a cache key into an entry location
///
/// Separators are always `/`, so the result doubles as an object key.
#[must_use]
pub fn entry_location(cache_dir: &Path, key: &str) -> String {
    let dir = cache_dir.to_string_lossy().replace('\\', "/");
    let dir = dir.trim_start_matches("./").trim_end_matches('/');
    if dir.is_empty() || dir == "." {
        key.to_string()
    } else {
        format!("{dir}/{key}")
    }
}
