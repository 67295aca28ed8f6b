//! Typed, best-effort facade over a cache storage backend.

use std::sync::Arc;
use tracing::{debug, warn};

use super::storage::CacheStorage;
use super::traits::Cacheable;

/// Cache layer that serializes structured values and hides storage failures.
///
/// A cache that cannot be read behaves like an empty cache, and a failed write
/// is logged and dropped. Callers never fail because of the cache.
#[derive(Clone)]
pub struct CacheLayer {
  storage: Arc<dyn CacheStorage>,
}

impl CacheLayer {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: impl CacheStorage + 'static) -> Self {
    Self {
      storage: Arc::new(storage),
    }
  }

  /// Whether a shared (process-outliving) tier backs this cache.
  pub fn is_shared(&self) -> bool {
    self.storage.is_shared()
  }

  /// Look up a structured value. Read and decode failures count as misses.
  pub async fn get<T: Cacheable>(&self, key: &str) -> Option<T> {
    let bytes = self.get_bytes(key).await?;
    match serde_json::from_slice(&bytes) {
      Ok(value) => Some(value),
      Err(e) => {
        warn!(
          key,
          entity_type = T::entity_type(),
          error = %e,
          "Discarding undecodable cache entry"
        );
        None
      }
    }
  }

  /// Store a structured value. Returns whether the write succeeded.
  pub async fn store<T: Cacheable>(&self, key: &str, value: &T) -> bool {
    match serde_json::to_vec(value) {
      Ok(bytes) => self.store_bytes(key, bytes).await,
      Err(e) => {
        warn!(
          key,
          entity_type = T::entity_type(),
          error = %e,
          "Failed to serialize cache entry"
        );
        false
      }
    }
  }

  /// Look up a raw blob. Read failures count as misses.
  pub async fn get_bytes(&self, key: &str) -> Option<Vec<u8>> {
    match self.storage.get(key).await {
      Ok(value) => value,
      Err(e) => {
        warn!(key, backend = self.storage.name(), error = %e, "Cache read failed");
        None
      }
    }
  }

  /// Store a raw blob. Returns whether the write succeeded.
  pub async fn store_bytes(&self, key: &str, value: Vec<u8>) -> bool {
    let len = value.len();
    match self.storage.set(key, value).await {
      Ok(()) => {
        debug!(key, bytes = len, "Cached entry");
        true
      }
      Err(e) => {
        warn!(key, backend = self.storage.name(), error = %e, "Cache write failed");
        false
      }
    }
  }
}
