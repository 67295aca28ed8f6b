//! Cache keys and `Cacheable` implementations for pokemon data.

use std::fmt;

use crate::cache::Cacheable;

use super::types::{ImageSlot, NameIndex, SimplifiedPokemon};

impl Cacheable for SimplifiedPokemon {
  fn entity_type() -> &'static str {
    "pokemon"
  }
}

impl Cacheable for NameIndex {
  fn entity_type() -> &'static str {
    "name_index"
  }
}

/// The three independent key families. No entry requires another to exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PokemonCacheKey<'a> {
  /// Simplified record, keyed by the id or name it was requested with
  Pokemon(&'a str),
  /// Raw sprite bytes
  Image(&'a str, ImageSlot),
  /// Flat index of every known name
  AllNames,
}

impl fmt::Display for PokemonCacheKey<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Pokemon(id_or_name) => write!(f, "pokemon:{}", id_or_name),
      Self::Image(id_or_name, slot) => write!(f, "pokemon:{}:{}Image", id_or_name, slot),
      Self::AllNames => f.write_str("allPokemonNames"),
    }
  }
}
