//! Pokemon aggregation on top of the PokeAPI client and the cache layer.

mod cache;
mod images;
mod retry;
mod service;
mod types;
mod weakness;

pub use cache::PokemonCacheKey;
pub use service::PokemonService;
pub use types::{ImageSlot, ListOptions, NameIndex, ResolveOptions};
