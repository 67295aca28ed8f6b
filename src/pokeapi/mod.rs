//! Upstream PokeAPI access.

pub mod api_types;
mod client;

use async_trait::async_trait;

use crate::error::Result;
use api_types::{ApiGeneration, ApiPokemon, ApiPokemonList, ApiSpecies, ApiType};

pub use client::PokeApiClient;

/// Raw access to the upstream API.
///
/// Only `fetch_detail` distinguishes a missing identifier (`Error::NotFound`);
/// every other failure is reported as `Error::Upstream`.
#[async_trait]
pub trait PokeApi: Send + Sync {
  /// One page of the pokemon index.
  async fn fetch_list(&self, limit: usize, offset: usize) -> Result<ApiPokemonList>;

  /// The detail record for a pokemon id or name.
  async fn fetch_detail(&self, id_or_name: &str) -> Result<ApiPokemon>;

  /// The species record for a pokemon id or name.
  async fn fetch_species(&self, id_or_name: &str) -> Result<ApiSpecies>;

  /// A type record (damage relations) by its resource URL.
  async fn fetch_type(&self, url: &str) -> Result<ApiType>;

  /// A generation record by its resource URL.
  async fn fetch_generation(&self, url: &str) -> Result<ApiGeneration>;

  /// Raw bytes of an image (or any other binary resource).
  async fn fetch_binary(&self, url: &str) -> Result<Vec<u8>>;
}
