//! In-process cache tier, bounded by total bytes and expired by TTL.

use async_trait::async_trait;
use moka::future::Cache;
use std::time::Duration;

use super::storage::CacheStorage;
use crate::error::Result;

/// Default memory budget for the process-local tier.
pub const DEFAULT_MAX_BYTES: u64 = 64 * 1024 * 1024;

/// Fast, process-local cache tier backed by `moka`.
///
/// Entries are weighed by key and value size, so image blobs count for what they hold.
pub struct MemoryStorage {
  entries: Cache<String, Vec<u8>>,
}

impl MemoryStorage {
  #[allow(dead_code)]
  pub fn new(ttl: Option<Duration>) -> Self {
    Self::with_max_bytes(ttl, DEFAULT_MAX_BYTES)
  }

  pub fn with_max_bytes(ttl: Option<Duration>, max_bytes: u64) -> Self {
    let mut builder = Cache::<String, Vec<u8>>::builder()
      .max_capacity(max_bytes)
      .weigher(|key: &String, value: &Vec<u8>| -> u32 {
        (key.len() + value.len()).try_into().unwrap_or(u32::MAX)
      });
    if let Some(ttl) = ttl {
      builder = builder.time_to_live(ttl);
    }

    Self {
      entries: builder.build(),
    }
  }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
  fn name(&self) -> &'static str {
    "memory"
  }

  async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
    Ok(self.entries.get(key).await)
  }

  async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
    self.entries.insert(key.to_string(), value).await;
    Ok(())
  }
}
