//! Key-value caching for aggregated records and image blobs.
//!
//! This module is Pokemon-agnostic. It provides:
//! - A byte-level `CacheStorage` trait with per-tier TTLs
//! - A bounded in-memory tier (moka) and a durable SQLite tier
//! - A tiered composition (memory first, shared second, with back-fill)
//! - A typed `CacheLayer` whose reads and writes are best-effort

mod layer;
mod memory;
mod storage;
mod tiered;
mod traits;

pub use layer::CacheLayer;
pub use memory::{MemoryStorage, DEFAULT_MAX_BYTES};
pub use storage::{CacheStorage, SqliteStorage};
pub use tiered::TieredStorage;
pub use traits::Cacheable;
