//! Integration tests for layered cache lookups
//!
//! Exercises the cached function against a local directory and an in-memory
//! object transport standing in for the remote bucket.

use async_trait::async_trait;
use fncache::{
    Arg, CachedFn, Error, LocalStore, ObjectRef, ObjectTransport, RemoteConfig, RemoteCredentials,
    RemoteStore, Result, Store, args, entry_location,
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::convert::Infallible;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[derive(Default)]
struct MemoryTransport {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    gets: AtomicUsize,
    puts: AtomicUsize,
}

impl MemoryTransport {
    fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    fn insert(&self, key: &str, bytes: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), bytes.to_vec());
    }
}

#[async_trait]
impl ObjectTransport for MemoryTransport {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        source: &Path,
        _content_type: &str,
    ) -> Result<ObjectRef> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        let bytes = std::fs::read(source).map_err(|e| Error::io(e, source, "read"))?;
        self.insert(key, &bytes);
        Ok(ObjectRef {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    async fn get_object(&self, _bucket: &str, key: &str, destination: &Path) -> Result<()> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let bytes = self.object(key).ok_or_else(|| Error::not_found(key))?;
        std::fs::write(destination, bytes).map_err(|e| Error::io(e, destination, "write"))
    }

    async fn head_object(&self, _bucket: &str, key: &str) -> Result<()> {
        self.object(key).map(|_| ()).ok_or_else(|| Error::not_found(key))
    }
}

fn remote_store(transport: &Arc<MemoryTransport>) -> RemoteStore<Arc<MemoryTransport>> {
    let config = RemoteConfig::new(
        RemoteCredentials::new("AKIAEXAMPLE", "secret", "us-east-1"),
        "cache-bucket",
    );
    RemoteStore::new(config, Arc::clone(transport)).unwrap()
}

fn counted(
    calls: &Arc<AtomicUsize>,
    result: Value,
) -> impl Fn(Vec<Arg>) -> futures::future::Ready<std::result::Result<Value, Infallible>>
+ Send
+ Sync
+ 'static {
    let calls = Arc::clone(calls);
    move |_| {
        calls.fetch_add(1, Ordering::SeqCst);
        futures::future::ready(Ok(result.clone()))
    }
}

#[tokio::test]
async fn local_only_roundtrip_writes_expected_file() {
    let tmp = TempDir::new().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let cached = CachedFn::builder()
        .function(counted(&calls, json!({"blue": "LL"})))
        .cache_dir(tmp.path())
        .build()
        .unwrap();

    cached.invoke(args![5, 6, 7]).await.unwrap();

    let path = tmp.path().join("5__6__7");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), r#"{"blue":"LL"}"#);
    let again = cached.invoke(args![5, 6, 7]).await.unwrap();
    assert_eq!(again, json!({"blue": "LL"}));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn function_is_called_with_the_same_arguments() {
    let tmp = TempDir::new().unwrap();
    let seen = Arc::new(Mutex::new(None));
    let recorder = Arc::clone(&seen);
    let cached = CachedFn::builder()
        .function(move |args: Vec<Arg>| {
            *recorder.lock().unwrap() = Some(args);
            async { Ok::<_, Infallible>(json!({"blue": "LL"})) }
        })
        .cache_dir(tmp.path())
        .build()
        .unwrap();

    cached.invoke(args![1, 2, 3]).await.unwrap();

    assert_eq!(seen.lock().unwrap().clone(), Some(args![1, 2, 3]));
}

#[tokio::test]
async fn nested_cache_dir_is_created() {
    let tmp = TempDir::new().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let dir = tmp.path().join("altCache").join("secondLevel");
    let cached = CachedFn::builder()
        .function(counted(&calls, json!({"green": true})))
        .cache_dir(&dir)
        .build()
        .unwrap();

    cached
        .invoke(vec![Arg::from(json!({"one": 1, "two": 2}))])
        .await
        .unwrap();

    assert_eq!(
        std::fs::read_to_string(dir.join("one=1&two=2")).unwrap(),
        r#"{"green":true}"#
    );
}

#[tokio::test]
async fn custom_key_generator_names_the_file() {
    let tmp = TempDir::new().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let cached = CachedFn::builder()
        .function(counted(&calls, json!({"red": 88})))
        .key_generator(|_| "my-file-name-that-is-special".to_string())
        .cache_dir(tmp.path())
        .build()
        .unwrap();

    cached.invoke(args![vec![json!(6), json!("Koolaid")]]).await.unwrap();

    assert_eq!(
        std::fs::read_to_string(tmp.path().join("my-file-name-that-is-special")).unwrap(),
        r#"{"red":88}"#
    );
}

#[tokio::test]
async fn random_names_write_one_entry_per_call() {
    let tmp = TempDir::new().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let cached = CachedFn::builder()
        .function(counted(&calls, json!({"red": 99})))
        .use_random_name(true)
        .cache_dir(tmp.path())
        .build()
        .unwrap();

    cached.invoke(args![6, "Koolaid", false]).await.unwrap();
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);

    cached.invoke(args![6, "Koolaid", false]).await.unwrap();
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn remote_hit_skips_local_and_function() {
    let tmp = TempDir::new().unwrap();
    let transport = Arc::new(MemoryTransport::default());
    let calls = Arc::new(AtomicUsize::new(0));
    let cached = CachedFn::builder()
        .function(counted(&calls, json!({"from": "function"})))
        .cache_dir(tmp.path())
        .remote(remote_store(&transport))
        .build()
        .unwrap();

    let location = cached.location_for(&args!["a"]);
    transport.insert(&location, br#"{"from":"remote"}"#);
    LocalStore::new()
        .write(&location, br#"{"from":"local"}"#)
        .await
        .unwrap();

    let value = cached.invoke(args!["a"]).await.unwrap();

    assert_eq!(value, json!({"from": "remote"}));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn remote_miss_falls_back_to_local() {
    let tmp = TempDir::new().unwrap();
    let transport = Arc::new(MemoryTransport::default());
    let calls = Arc::new(AtomicUsize::new(0));
    let cached = CachedFn::builder()
        .function(counted(&calls, json!({"from": "function"})))
        .cache_dir(tmp.path())
        .remote(remote_store(&transport))
        .build()
        .unwrap();

    let location = cached.location_for(&args!["b"]);
    LocalStore::new()
        .write(&location, br#"{"from":"local"}"#)
        .await
        .unwrap();

    let value = cached.invoke(args!["b"]).await.unwrap();

    assert_eq!(value, json!({"from": "local"}));
    assert_eq!(transport.gets.load(Ordering::SeqCst), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn remote_configured_miss_writes_only_remote() {
    let tmp = TempDir::new().unwrap();
    let transport = Arc::new(MemoryTransport::default());
    let calls = Arc::new(AtomicUsize::new(0));
    let cached = CachedFn::builder()
        .function(counted(&calls, json!({"red": 55})))
        .cache_dir(tmp.path())
        .remote(remote_store(&transport))
        .build()
        .unwrap();

    let value = cached.invoke(args![1, 2]).await.unwrap();

    let location = entry_location(tmp.path(), "1__2");
    assert_eq!(value, json!({"red": 55}));
    assert_eq!(transport.object(&location).unwrap(), br#"{"red":55}"#);
    assert_eq!(transport.puts.load(Ordering::SeqCst), 1);
    assert!(!LocalStore::new().exists(&location).await.unwrap());

    // the next call is served from the remote store
    cached.invoke(args![1, 2]).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn has_key_checks_remote_then_local() {
    let tmp = TempDir::new().unwrap();
    let transport = Arc::new(MemoryTransport::default());
    let calls = Arc::new(AtomicUsize::new(0));
    let cached = CachedFn::builder()
        .function(counted(&calls, json!(null)))
        .cache_dir(tmp.path())
        .remote(remote_store(&transport))
        .build()
        .unwrap();

    assert!(!cached.has_key(&args!["r"]).await.unwrap());
    transport.insert(&cached.location_for(&args!["r"]), b"1");
    assert!(cached.has_key(&args!["r"]).await.unwrap());

    assert!(!cached.has_key(&args!["l"]).await.unwrap());
    LocalStore::new()
        .write(&cached.location_for(&args!["l"]), b"1")
        .await
        .unwrap();
    assert!(cached.has_key(&args!["l"]).await.unwrap());
    assert_eq!(transport.gets.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn concurrent_misses_each_call_the_function() {
    let tmp = TempDir::new().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let cached = CachedFn::builder()
        .function(counted(&calls, json!({"n": 1})))
        .cache_dir(tmp.path())
        .build()
        .unwrap();

    let (a, b) = tokio::join!(cached.invoke(args!["same"]), cached.invoke(args!["same"]));

    assert_eq!(a.unwrap(), b.unwrap());
    assert!(calls.load(Ordering::SeqCst) >= 1);
    assert!(cached.has_key(&args!["same"]).await.unwrap());
}
