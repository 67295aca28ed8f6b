//! Core traits for the caching system.

use serde::{de::DeserializeOwned, Serialize};

/// Trait for structured values that can be cached.
///
/// Values are stored as JSON, so anything serde can round-trip qualifies.
pub trait Cacheable: Send + Sync + Serialize + DeserializeOwned {
  /// Entity type name used in log output (e.g., "pokemon", "name_index")
  fn entity_type() -> &'static str;
}
