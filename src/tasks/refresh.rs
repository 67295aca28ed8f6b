use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::RefreshConfig;
use crate::error::Result;
use crate::pokemon::{ListOptions, NameIndex, PokemonCacheKey, PokemonService, ResolveOptions};

/// Outcome of one full refresh run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
  pub cached: usize,
  pub total: usize,
}

/// Periodically rebuilds the shared cache: the name index and every pokemon record.
pub struct RefreshTask {
  service: Arc<PokemonService>,
  batch_size: usize,
  interval: Duration,
}

impl RefreshTask {
  pub fn new(service: Arc<PokemonService>, config: &RefreshConfig) -> Self {
    Self {
      service,
      batch_size: config.batch_size.max(1),
      interval: config.interval(),
    }
  }

  /// Run once now, then every interval, until the handle is aborted.
  pub fn spawn(self) -> JoinHandle<()> {
    tokio::spawn(async move {
      let mut ticker = tokio::time::interval(self.interval);
      loop {
        ticker.tick().await;
        self.refresh_all().await;
      }
    })
  }

  /// Rebuild the shared cache from upstream.
  ///
  /// Returns `None` when the run was skipped or aborted. Individual pokemon
  /// failures are counted, never fatal.
  pub async fn refresh_all(&self) -> Option<RefreshSummary> {
    if !self.service.cache().is_shared() {
      warn!("No shared cache configured, skipping Pokemon caching");
      return None;
    }

    info!("Caching all Pokemon data");
    match self.run().await {
      Ok(summary) => summary,
      Err(e) => {
        error!(error = %e, "Error caching all Pokemon");
        None
      }
    }
  }

  async fn run(&self) -> Result<Option<RefreshSummary>> {
    let probe = self
      .service
      .list(ListOptions {
        ignore_cache: true,
        limit: 1,
        offset: 0,
      })
      .await?;

    if probe.count == 0 {
      warn!("PokeAPI reported no Pokemon, nothing to cache");
      return Ok(None);
    }

    let page = self
      .service
      .list(ListOptions {
        ignore_cache: true,
        limit: probe.count,
        offset: 0,
      })
      .await?;
    let names: Vec<String> = page.items.into_iter().map(|item| item.name).collect();

    let key = PokemonCacheKey::AllNames.to_string();
    self
      .service
      .cache()
      .store(&key, &NameIndex(names.clone()))
      .await;
    info!(count = names.len(), "Cached Pokemon names");

    let total = names.len();
    let mut cached = 0;
    for (i, batch) in names.chunks(self.batch_size).enumerate() {
      debug!(batch = i + 1, size = batch.len(), "Caching batch");

      let results = join_all(
        batch
          .iter()
          .map(|name| self.service.resolve(name, ResolveOptions::fresh())),
      )
      .await;

      for (name, result) in batch.iter().zip(results) {
        match result {
          Ok(_) => cached += 1,
          Err(e) => error!(name = %name, error = %e, "Failed to cache Pokemon"),
        }
      }
    }

    info!("Cache updated successfully with {} out of {} Pokemon", cached, total);
    Ok(Some(RefreshSummary { cached, total }))
  }
}
