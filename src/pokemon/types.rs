//! Client-facing types produced by the pokemon service.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pokeapi::api_types::ApiPokemonList;

/// Which sprite of a pokemon an image refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum ImageSlot {
  Front,
  Back,
}

impl ImageSlot {
  pub const ALL: [ImageSlot; 2] = [ImageSlot::Front, ImageSlot::Back];

  pub fn as_str(self) -> &'static str {
    match self {
      ImageSlot::Front => "front",
      ImageSlot::Back => "back",
    }
  }
}

impl fmt::Display for ImageSlot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Upstream sprite URLs, kept so images can be re-fetched after the record is cached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginalImages {
  pub front: Option<String>,
  pub back: Option<String>,
}

impl OriginalImages {
  pub fn get(&self, slot: ImageSlot) -> Option<&str> {
    match slot {
      ImageSlot::Front => self.front.as_deref(),
      ImageSlot::Back => self.back.as_deref(),
    }
  }
}

/// The cached, client-facing view of one pokemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplifiedPokemon {
  pub id: u32,
  pub name: String,
  /// Path on this service serving the front sprite, if upstream has one
  pub front_image_ref: Option<String>,
  pub back_image_ref: Option<String>,
  #[serde(rename = "originalImageURLs")]
  pub original_images: OriginalImages,
  /// Type names in upstream slot order
  pub categories: Vec<String>,
  /// Types dealing double damage that none of this pokemon's types neutralize
  pub weaknesses: Vec<String>,
  pub region: Option<String>,
}

/// Every known pokemon name, in upstream order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameIndex(pub Vec<String>);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub url: Option<String>,
}

/// One page of the pokemon index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PokemonPage {
  pub count: usize,
  pub items: Vec<ListItem>,
  pub next_offset: usize,
  pub previous_offset: usize,
}

impl PokemonPage {
  /// Slice a page out of the cached name index.
  pub fn from_names(names: &[String], limit: usize, offset: usize) -> Self {
    Self {
      count: names.len(),
      items: names
        .iter()
        .skip(offset)
        .take(limit)
        .map(|name| ListItem {
          name: name.clone(),
          url: None,
        })
        .collect(),
      next_offset: offset.saturating_add(limit),
      previous_offset: offset.saturating_sub(limit),
    }
  }

  /// Wrap an upstream page. The cursors are plain offset arithmetic,
  /// upstream's own next/previous links are not used.
  pub fn from_upstream(list: ApiPokemonList, limit: usize, offset: usize) -> Self {
    Self {
      count: list.count,
      items: list
        .results
        .into_iter()
        .map(|r| ListItem {
          name: r.name,
          url: Some(r.url).filter(|u| !u.is_empty()),
        })
        .collect(),
      next_offset: offset.saturating_add(limit),
      previous_offset: offset.saturating_sub(limit),
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
  /// Skip the cache lookup (the result is still written to the cache)
  pub ignore_cache: bool,
  /// This call is already a retry; fail without retrying again
  pub is_retry_attempt: bool,
}

impl ResolveOptions {
  pub fn fresh() -> Self {
    Self {
      ignore_cache: true,
      ..Self::default()
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOptions {
  pub ignore_cache: bool,
  pub limit: usize,
  pub offset: usize,
}

impl Default for ListOptions {
  fn default() -> Self {
    Self {
      ignore_cache: false,
      limit: 10,
      offset: 0,
    }
  }
}
