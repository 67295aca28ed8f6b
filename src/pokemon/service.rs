//! Aggregation of upstream pokemon data into cached `SimplifiedPokemon` records.

use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::cache::CacheLayer;
use crate::error::{Error, Result};
use crate::pokeapi::api_types::{ApiDamageRelations, ApiPokemon, ApiSpecies};
use crate::pokeapi::PokeApi;

use super::cache::PokemonCacheKey;
use super::retry::RetryPolicy;
use super::types::{
  ImageSlot, ListOptions, NameIndex, OriginalImages, PokemonPage, ResolveOptions,
  SimplifiedPokemon,
};
use super::weakness::derive_weaknesses;

/// Cache-first access to pokemon data.
///
/// Upstream client and cache are injected so the same service backs request
/// handling and the bulk refresh job.
pub struct PokemonService {
  pub(super) api: Arc<dyn PokeApi>,
  pub(super) cache: CacheLayer,
  /// Base URL that image references are built on
  public_url: String,
  retry: RetryPolicy,
}

impl PokemonService {
  pub fn new(api: Arc<dyn PokeApi>, cache: CacheLayer, public_url: impl Into<String>) -> Self {
    Self {
      api,
      cache,
      public_url: public_url.into().trim_end_matches('/').to_string(),
      retry: RetryPolicy::default(),
    }
  }

  #[allow(dead_code)]
  pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
    self.retry = retry;
    self
  }

  pub fn cache(&self) -> &CacheLayer {
    &self.cache
  }

  /// Get the simplified record for a pokemon id or name.
  ///
  /// 1. Unless `ignore_cache` is set, return the cached record on a hit
  /// 2. Otherwise aggregate from upstream and write the result through to the cache
  /// 3. A failed aggregation is retried per the retry policy, except for `NotFound`
  ///    and calls that are already a retry
  pub async fn resolve(
    &self,
    id_or_name: &str,
    options: ResolveOptions,
  ) -> Result<SimplifiedPokemon> {
    debug!(id_or_name, "Resolving pokemon");

    if !options.ignore_cache {
      let key = PokemonCacheKey::Pokemon(id_or_name).to_string();
      if let Some(cached) = self.cache.get::<SimplifiedPokemon>(&key).await {
        debug!(id_or_name, "Found cached pokemon");
        return Ok(cached);
      }
      debug!(id_or_name, "No cached pokemon, fetching from PokeAPI");
    }

    let policy = if options.is_retry_attempt {
      RetryPolicy::no_retry()
    } else {
      self.retry
    };

    let mut first_failure: Option<Error> = None;
    let mut attempt = 1;
    loop {
      let err = match self.aggregate(id_or_name).await {
        Ok(pokemon) => return Ok(pokemon),
        Err(err) => err,
      };

      error!(id_or_name, attempt, error = %err, "Error processing pokemon");

      if !policy.should_retry(attempt, &err) {
        return Err(match first_failure {
          Some(first) => Error::Aggregation {
            id: id_or_name.to_string(),
            first: Box::new(first),
            retry: Box::new(err),
          },
          None => err,
        });
      }

      info!(id_or_name, "Retrying fetch from PokeAPI");
      first_failure.get_or_insert(err);
      attempt += 1;
    }
  }

  /// One uncached aggregation: detail, then species and types concurrently,
  /// then the generation hop for the region.
  async fn aggregate(&self, id_or_name: &str) -> Result<SimplifiedPokemon> {
    let details = self.api.fetch_detail(id_or_name).await?;

    let (species, relations) = tokio::join!(
      self.fetch_species(id_or_name),
      self.fetch_damage_relations(&details),
    );

    let weaknesses = derive_weaknesses(&relations);
    debug!(id_or_name, ?weaknesses, "Calculated weaknesses");

    let region = self.fetch_region(id_or_name, species.as_ref()).await;

    let pokemon = self.simplify(id_or_name, details, weaknesses, region);

    let key = PokemonCacheKey::Pokemon(id_or_name).to_string();
    self.cache.store(&key, &pokemon).await;

    self
      .prefetch_images(id_or_name, &pokemon.original_images)
      .await;

    Ok(pokemon)
  }

  async fn fetch_species(&self, id_or_name: &str) -> Option<ApiSpecies> {
    match self.api.fetch_species(id_or_name).await {
      Ok(species) => Some(species),
      Err(e) => {
        warn!(id_or_name, error = %e, "Could not fetch species, continuing without it");
        None
      }
    }
  }

  /// Damage relations for every type of the pokemon. Failed fetches are left out.
  async fn fetch_damage_relations(&self, details: &ApiPokemon) -> Vec<ApiDamageRelations> {
    let fetches = details.types.iter().map(|t| async move {
      match self.api.fetch_type(&t.type_ref.url).await {
        Ok(type_detail) => Some(type_detail.damage_relations),
        Err(e) => {
          warn!(
            type_name = %t.type_ref.name,
            error = %e,
            "Could not fetch type details, ignoring its damage relations"
          );
          None
        }
      }
    });

    join_all(fetches).await.into_iter().flatten().collect()
  }

  async fn fetch_region(&self, id_or_name: &str, species: Option<&ApiSpecies>) -> Option<String> {
    let Some(generation) = species.and_then(|s| s.generation.as_ref()) else {
      debug!(id_or_name, "No generation reference, region unknown");
      return None;
    };

    match self.api.fetch_generation(&generation.url).await {
      Ok(generation) => Some(generation.main_region.name),
      Err(e) => {
        warn!(
          id_or_name,
          url = %generation.url,
          error = %e,
          "Could not fetch generation, continuing without region"
        );
        None
      }
    }
  }

  fn simplify(
    &self,
    id_or_name: &str,
    details: ApiPokemon,
    weaknesses: Vec<String>,
    region: Option<String>,
  ) -> SimplifiedPokemon {
    let original_images = OriginalImages {
      front: details.sprites.front_default,
      back: details.sprites.back_default,
    };

    SimplifiedPokemon {
      id: details.id,
      name: details.name,
      front_image_ref: original_images
        .front
        .as_ref()
        .map(|_| self.image_ref(id_or_name, ImageSlot::Front)),
      back_image_ref: original_images
        .back
        .as_ref()
        .map(|_| self.image_ref(id_or_name, ImageSlot::Back)),
      original_images,
      categories: details.types.into_iter().map(|t| t.type_ref.name).collect(),
      weaknesses,
      region,
    }
  }

  /// Where this service serves the given sprite.
  fn image_ref(&self, id_or_name: &str, slot: ImageSlot) -> String {
    format!("{}/pokemon/{}/{}-image", self.public_url, id_or_name, slot)
  }

  /// One page of pokemon names, from the cached index when present.
  ///
  /// A missing index falls back to the upstream list endpoint.
  pub async fn list(&self, options: ListOptions) -> Result<PokemonPage> {
    let ListOptions {
      ignore_cache,
      limit,
      offset,
    } = options;
    debug!(limit, offset, ignore_cache, "Listing pokemon");

    if !ignore_cache {
      let key = PokemonCacheKey::AllNames.to_string();
      match self.cache.get::<NameIndex>(&key).await {
        Some(NameIndex(names)) => return Ok(PokemonPage::from_names(&names, limit, offset)),
        None => warn!("No cached pokemon names found, fetching from PokeAPI"),
      }
    }

    let list = self.api.fetch_list(limit, offset).await?;
    Ok(PokemonPage::from_upstream(list, limit, offset))
  }
}
