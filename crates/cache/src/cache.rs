//! Read-through/write-through caching of an async function
//!
//! A [`CachedFn`] wraps an async function. Each call derives a cache key from
//! its arguments, looks for a stored entry (remote store first when one is
//! configured, then the local filesystem) and only calls the wrapped function
//! on a miss. The fresh result is written to the remote store when one is
//! configured, otherwise to the local filesystem.
//!
//! There is no locking and no coalescing of in-flight calls: concurrent misses
//! for the same key each call the function and the last write wins.

use crate::codec::{decode_content, encode_content};
use crate::error::BoxError;
use crate::store::{LocalStore, Store, entry_location};
use crate::{Arg, Error, KeyStrategy, Result};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Directory used for local entries unless configured otherwise
pub const DEFAULT_CACHE_DIR: &str = "cache";

type BoxedFn<T> =
    Arc<dyn Fn(Vec<Arg>) -> BoxFuture<'static, std::result::Result<T, BoxError>> + Send + Sync>;

/// Caller-supplied conversion from stored text to a value
pub type Decoder<T> = Arc<dyn Fn(&str) -> Result<T> + Send + Sync>;

/// An async function whose results are cached by argument list
///
/// Cloning is cheap; clones share the same configuration.
pub struct CachedFn<T> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    function: BoxedFn<T>,
    decoder: Option<Decoder<T>>,
    strategy: KeyStrategy,
    cache_dir: PathBuf,
    local: LocalStore,
    remote: Option<Arc<dyn Store>>,
}

impl<T> Clone for CachedFn<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for CachedFn<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedFn")
            .field("cache_dir", &self.inner.cache_dir)
            .field("strategy", &self.inner.strategy)
            .field("custom_decoder", &self.inner.decoder.is_some())
            .field("remote", &self.inner.remote.as_ref().map(|r| r.name()))
            .finish_non_exhaustive()
    }
}

impl<T> CachedFn<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    /// Start configuring a cached function
    #[must_use]
    pub fn builder() -> CachedFnBuilder<T> {
        CachedFnBuilder::default()
    }

    /// Directory that local entries live under
    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.inner.cache_dir
    }

    /// Cache key for an argument list
    #[must_use]
    pub fn key_for(&self, args: &[Arg]) -> String {
        self.inner.strategy.key_for(args)
    }

    /// Storage location for an argument list
    #[must_use]
    pub fn location_for(&self, args: &[Arg]) -> String {
        entry_location(&self.inner.cache_dir, &self.key_for(args))
    }

    /// Call the function, or return its cached result
    ///
    /// Lookups go to the remote store first (when configured) and then to the
    /// local filesystem. On a full miss the function is called, its result is
    /// stored and the original value is returned.
    #[instrument(name = "cache_invoke", skip_all)]
    pub async fn invoke(&self, args: Vec<Arg>) -> Result<T> {
        let inner = &self.inner;
        let location = self.location_for(&args);

        if let Some(remote) = &inner.remote {
            if let Some(content) = remote.read(&location).await? {
                debug!(location = %location, backend = remote.name(), "Cache hit");
                return self.decode(&content);
            }
        }

        if let Some(content) = inner.local.read(&location).await? {
            debug!(location = %location, backend = inner.local.name(), "Cache hit");
            return self.decode(&content);
        }

        debug!(location = %location, "Cache miss, calling function");
        let value = (inner.function)(args).await.map_err(Error::invocation)?;
        let content = encode_content(&value)?;

        let target: &dyn Store = match &inner.remote {
            Some(remote) => remote.as_ref(),
            None => &inner.local,
        };
        target.write(&location, &content).await?;
        info!(
            location = %location,
            backend = target.name(),
            size = content.len(),
            "Stored cache entry"
        );

        Ok(value)
    }

    /// Whether an entry exists for an argument list, without reading it
    #[instrument(name = "cache_has_key", skip_all)]
    pub async fn has_key(&self, args: &[Arg]) -> Result<bool> {
        let location = self.location_for(args);
        if let Some(remote) = &self.inner.remote {
            if remote.exists(&location).await? {
                return Ok(true);
            }
        }
        self.inner.local.exists(&location).await
    }

    fn decode(&self, content: &[u8]) -> Result<T> {
        let text = String::from_utf8_lossy(content);
        match &self.inner.decoder {
            Some(decoder) => decoder(&text),
            None => decode_content(&text),
        }
    }
}

/// Builder for [`CachedFn`]
pub struct CachedFnBuilder<T> {
    function: Option<BoxedFn<T>>,
    decoder: Option<Decoder<T>>,
    strategy: KeyStrategy,
    cache_dir: PathBuf,
    remote: Option<Arc<dyn Store>>,
}

impl<T> Default for CachedFnBuilder<T> {
    fn default() -> Self {
        Self {
            function: None,
            decoder: None,
            strategy: KeyStrategy::default(),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            remote: None,
        }
    }
}

impl<T> CachedFnBuilder<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    /// The async function to cache
    #[must_use]
    pub fn function<F, Fut, E>(mut self, function: F) -> Self
    where
        F: Fn(Vec<Arg>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        let boxed: BoxedFn<T> = Arc::new(move |args: Vec<Arg>| {
            let call = function(args);
            async move { call.await.map_err(Into::<BoxError>::into) }.boxed()
        });
        self.function = Some(boxed);
        self
    }

    /// Convert stored text with this decoder instead of the JSON heuristic
    #[must_use]
    pub fn decoder<D>(mut self, decoder: D) -> Self
    where
        D: Fn(&str) -> Result<T> + Send + Sync + 'static,
    {
        self.decoder = Some(Arc::new(decoder));
        self
    }

    /// Directory for local entries, also the prefix of remote object keys
    #[must_use]
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Replace the key strategy wholesale
    #[must_use]
    pub fn key_strategy(mut self, strategy: KeyStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Derive keys with a custom generator
    #[must_use]
    pub fn key_generator<G>(mut self, generator: G) -> Self
    where
        G: Fn(&[Arg]) -> String + Send + Sync + 'static,
    {
        self.strategy = self.strategy.with_generator(generator);
        self
    }

    /// Give every call a random key
    #[must_use]
    pub fn use_random_name(mut self, enabled: bool) -> Self {
        self.strategy = self.strategy.with_random_name(enabled);
        self
    }

    /// Consult and write to a remote store before the local filesystem
    #[must_use]
    pub fn remote(mut self, store: impl Store + 'static) -> Self {
        self.remote = Some(Arc::new(store));
        self
    }

    /// Finish configuration
    ///
    /// Fails with [`Error::Configuration`] when no function was supplied.
    pub fn build(self) -> Result<CachedFn<T>> {
        let function = self.function.ok_or_else(|| {
            Error::configuration("a function is required to create a cached function")
        })?;
        Ok(CachedFn {
            inner: Arc::new(Inner {
                function,
                decoder: self.decoder,
                strategy: self.strategy,
                cache_dir: self.cache_dir,
                local: LocalStore::new(),
                remote: self.remote,
            }),
        })
    }
}
