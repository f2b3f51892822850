//! Listing cache.
//!
//! Assembled listings are stored as serialized strings in a key-value store,
//! one namespace per feed. Entries are never expired or invalidated here; a
//! populated feed keeps serving its snapshot until the store drops it.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! capacity = 64
//! ```

mod config;
mod keys;
mod store;

pub use config::{CacheConfig, DEFAULT_CAPACITY, MIN_CAPACITY};
pub use keys::{ArtifactSlot, CacheKey, LISTING_KEY_COUNT};
pub use store::{CacheStoreError, KvStore, MemoryKvStore};
