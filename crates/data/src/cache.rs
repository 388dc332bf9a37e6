//! File-backed artifact cache with TTL freshness and per-key single-flight.
//!
//! Artifacts live as flat files under a root directory; freshness is the age
//! of the file's last-modified timestamp against a caller-supplied TTL.
//! Writes go through a temp file and an atomic rename so a half-written
//! payload is never visible. A failed fetch removes any prior artifact for
//! the key so a later lookup re-attempts the fetch instead of serving a
//! corrupted value.

use std::collections::HashMap;
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::Mutex;
use tracing::{debug, warn};

use harbinger_core::error::{HarbingerError, Result};

/// Outcome of a cache lookup, before any fetch is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// A payload exists and is younger than the TTL.
    Fresh(Vec<u8>),
    /// A payload exists but has outlived the TTL.
    Stale,
    /// No artifact exists for the key.
    Missing,
}

/// Key-to-payload store with TTL freshness and atomic replacement.
pub struct ArtifactCache {
    root: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ArtifactCache {
    /// Opens a cache rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            locks: Mutex::new(HashMap::new()),
        })
    }

    /// Returns the cached payload for `key` if fresh, otherwise runs `fetch`.
    ///
    /// On fetch success the new payload atomically replaces any prior
    /// artifact. On fetch failure any prior or partial artifact for the key
    /// is removed and the failure propagates. Concurrent calls for the same
    /// key serialize so at most one fetch is in flight per key; distinct keys
    /// proceed independently.
    ///
    /// # Errors
    ///
    /// Propagates the fetch error, or an IO error from the store.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> Result<Vec<u8>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<u8>>>,
    {
        let guard = self.key_lock(key).await;
        let _held = guard.lock().await;

        match self.lookup(key, ttl)? {
            CacheLookup::Fresh(payload) => {
                debug!(key, "cache hit");
                return Ok(payload);
            }
            CacheLookup::Stale => debug!(key, "cache stale, refetching"),
            CacheLookup::Missing => debug!(key, "cache miss, fetching"),
        }

        match fetch().await {
            Ok(payload) => {
                self.write_atomic(key, &payload)?;
                Ok(payload)
            }
            Err(err) => {
                warn!(key, error = %err, "fetch failed, discarding artifact");
                self.remove_unlocked(key)?;
                Err(err)
            }
        }
    }

    /// Unconditionally replaces the artifact for `key` with `payload`.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be written.
    pub async fn store(&self, key: &str, payload: &[u8]) -> Result<()> {
        let guard = self.key_lock(key).await;
        let _held = guard.lock().await;
        self.write_atomic(key, payload)
    }

    /// Returns the payload for `key` if present and fresh, without fetching.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact exists but cannot be read.
    pub async fn load_fresh(&self, key: &str, ttl: Duration) -> Result<Option<Vec<u8>>> {
        let guard = self.key_lock(key).await;
        let _held = guard.lock().await;
        match self.lookup(key, ttl)? {
            CacheLookup::Fresh(payload) => Ok(Some(payload)),
            CacheLookup::Stale | CacheLookup::Missing => Ok(None),
        }
    }

    /// Removes the artifact for `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub async fn remove(&self, key: &str) -> Result<()> {
        let guard = self.key_lock(key).await;
        let _held = guard.lock().await;
        self.remove_unlocked(key)
    }

    /// Checks the artifact for `key` against `ttl` using a single wall-clock
    /// snapshot. A zero TTL reports an existing artifact as stale, which
    /// recovers always-refetch semantics.
    fn lookup(&self, key: &str, ttl: Duration) -> Result<CacheLookup> {
        let path = self.path_for(key);
        let metadata = match std::fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(CacheLookup::Missing)
            }
            Err(err) => return Err(err.into()),
        };

        let now = SystemTime::now();
        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .unwrap_or(Duration::MAX);

        if !ttl.is_zero() && age < ttl {
            Ok(CacheLookup::Fresh(std::fs::read(&path)?))
        } else {
            Ok(CacheLookup::Stale)
        }
    }

    // The temp file gets a randomized name outside the sanitized key
    // namespace, so a write for one key can never touch another key's
    // artifact.
    fn write_atomic(&self, key: &str, payload: &[u8]) -> Result<()> {
        let path = self.path_for(key);
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)?;
        tmp.write_all(payload)?;
        tmp.persist(&path).map_err(|e| HarbingerError::from(e.error))?;
        debug!(key, bytes = payload.len(), "artifact stored");
        Ok(())
    }

    fn remove_unlocked(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(sanitize_key(key))
    }

    /// Returns the cache root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn key_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(sanitize_key(key))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Flattens a key to a safe file name. Path separators and anything outside
/// `[A-Za-z0-9._-]` become underscores, so keys cannot escape the root.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
