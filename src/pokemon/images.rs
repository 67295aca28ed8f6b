use futures::future::join_all;
use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::cache::PokemonCacheKey;
use super::service::PokemonService;
use super::types::{ImageSlot, OriginalImages, ResolveOptions};

fn image_not_found(id_or_name: &str, slot: ImageSlot) -> Error {
  Error::NotFound {
    resource: match slot {
      ImageSlot::Front => "front image",
      ImageSlot::Back => "back image",
    },
    id: id_or_name.to_string(),
  }
}

impl PokemonService {
  /// Raw sprite bytes for one slot of a pokemon.
  ///
  /// Cached bytes are returned directly. Otherwise the record is resolved for
  /// its upstream URL and the image is fetched and cached. A pokemon without
  /// that sprite, or one that cannot be resolved, reports the image as not found.
  pub async fn get_image(&self, id_or_name: &str, slot: ImageSlot) -> Result<Vec<u8>> {
    let key = PokemonCacheKey::Image(id_or_name, slot).to_string();
    if let Some(bytes) = self.cache.get_bytes(&key).await {
      debug!(id_or_name, %slot, "Found cached image");
      return Ok(bytes);
    }

    let pokemon = match self.resolve(id_or_name, ResolveOptions::default()).await {
      Ok(pokemon) => pokemon,
      Err(e) => {
        warn!(id_or_name, %slot, error = %e, "Could not resolve pokemon for image");
        return Err(image_not_found(id_or_name, slot));
      }
    };

    // Resolving may have just prefetched it
    if let Some(bytes) = self.cache.get_bytes(&key).await {
      return Ok(bytes);
    }

    let Some(url) = pokemon.original_images.get(slot) else {
      return Err(image_not_found(id_or_name, slot));
    };

    self
      .fetch_and_cache_image(id_or_name, slot, url)
      .await
      .map_err(|e| {
        warn!(id_or_name, %slot, url, error = %e, "Could not fetch image");
        image_not_found(id_or_name, slot)
      })
  }

  /// Fetch and cache every sprite the record has an upstream URL for.
  /// Failures are logged and otherwise ignored.
  pub(super) async fn prefetch_images(&self, id_or_name: &str, images: &OriginalImages) {
    let fetches = ImageSlot::ALL.into_iter().filter_map(|slot| {
      images
        .get(slot)
        .map(|url| async move { (slot, self.fetch_and_cache_image(id_or_name, slot, url).await) })
    });

    for (slot, result) in join_all(fetches).await {
      if let Err(e) = result {
        warn!(id_or_name, %slot, error = %e, "Could not prefetch image");
      }
    }
  }

  async fn fetch_and_cache_image(
    &self,
    id_or_name: &str,
    slot: ImageSlot,
    url: &str,
  ) -> Result<Vec<u8>> {
    let bytes = self.api.fetch_binary(url).await?;
    let key = PokemonCacheKey::Image(id_or_name, slot).to_string();
    self.cache.store_bytes(&key, bytes.clone()).await;
    Ok(bytes)
  }
}
