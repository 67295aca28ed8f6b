//! Two-tier cache: a fast process-local tier in front of an optional shared tier.

use async_trait::async_trait;
use tracing::{debug, warn};

use super::memory::MemoryStorage;
use super::storage::CacheStorage;
use crate::error::Result;

pub struct TieredStorage {
  memory: MemoryStorage,
  shared: Option<Box<dyn CacheStorage>>,
}

impl TieredStorage {
  pub fn new(memory: MemoryStorage, shared: Option<Box<dyn CacheStorage>>) -> Self {
    Self { memory, shared }
  }
}

#[async_trait]
impl CacheStorage for TieredStorage {
  fn name(&self) -> &'static str {
    "tiered"
  }

  fn is_shared(&self) -> bool {
    self.shared.is_some()
  }

  async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
    match self.memory.get(key).await {
      Ok(Some(value)) => return Ok(Some(value)),
      Ok(None) => {}
      Err(e) => warn!(key, error = %e, "Memory tier read failed"),
    }

    let Some(shared) = &self.shared else {
      return Ok(None);
    };

    let value = shared.get(key).await?;
    if let Some(value) = &value {
      debug!(key, tier = shared.name(), "Back-filling memory tier");
      if let Err(e) = self.memory.set(key, value.clone()).await {
        warn!(key, error = %e, "Memory tier back-fill failed");
      }
    }
    Ok(value)
  }

  async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
    match &self.shared {
      Some(shared) => {
        self.memory.set(key, value.clone()).await?;
        shared.set(key, value).await
      }
      None => self.memory.set(key, value).await,
    }
  }
}
