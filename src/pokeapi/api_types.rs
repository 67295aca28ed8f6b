//! Serde-deserializable types matching PokeAPI responses.
//!
//! Only the fields the aggregation needs are modelled. Optional upstream data is
//! `Option`, list data defaults to empty so partial payloads still decode.

use serde::Deserialize;

/// A `{name, url}` reference, used throughout PokeAPI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiNamedResource {
  pub name: String,
  #[serde(default)]
  pub url: String,
}

// ============================================================================
// List endpoint
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ApiPokemonList {
  pub count: usize,
  #[serde(default)]
  pub results: Vec<ApiNamedResource>,
}

// ============================================================================
// Pokemon detail endpoint
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiSprites {
  pub front_default: Option<String>,
  pub back_default: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiPokemonType {
  #[serde(rename = "type")]
  pub type_ref: ApiNamedResource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiPokemon {
  pub id: u32,
  pub name: String,
  #[serde(default)]
  pub sprites: ApiSprites,
  #[serde(default)]
  pub types: Vec<ApiPokemonType>,
}

// ============================================================================
// Type, species and generation resources
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiDamageRelations {
  #[serde(default)]
  pub double_damage_from: Vec<ApiNamedResource>,
  #[serde(default)]
  pub half_damage_from: Vec<ApiNamedResource>,
  #[serde(default)]
  pub no_damage_from: Vec<ApiNamedResource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiType {
  #[serde(default)]
  pub damage_relations: ApiDamageRelations,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSpecies {
  pub generation: Option<ApiNamedResource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiGeneration {
  pub main_region: ApiNamedResource,
}
