//! Prelude module - Commonly used types for quick imports
//!
//! This module re-exports the most commonly used types from Cacheron,
//! allowing users to import them with a single `use cacheron::prelude::*;`
//! statement instead of importing each type individually.

// Core types - always available
pub use crate::config::{CacheronConfig, LayerConfig};
pub use crate::entry::{CacheEntry, SetOptions};
pub use crate::error::{CacheronError, StorageError};
pub use crate::eviction::EvictionPolicy;
pub use crate::factory::{LayerFactory, TieredCacheBuilder};
pub use crate::layer::{CacheLayer, LayerHandle, TagInvalidation};
pub use crate::memory_layer::{MemoryLayer, MemoryLayerConfig};
pub use crate::stats::{GlobalStats, LayerStats};
pub use crate::tiered::TieredCache;
pub use crate::warmup::{warm_up, WarmupEntry};

// Feature-gated exports
#[cfg(feature = "filesystem")]
pub use crate::fs_layer::{FilesystemLayer, FilesystemLayerConfig};

#[cfg(feature = "redis")]
pub use crate::redis_layer::{RedisLayer, RedisLayerConfig};
