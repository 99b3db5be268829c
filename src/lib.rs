//! Copyright (c) 2026, Kirky.X
//!
//! MIT License
//!
//! Cacheron - Tiered Read-Through Cache
//!
//! Provides an ordered chain of cache layers (fast to slow) with hit promotion,
//! per-entry TTL, tag-based invalidation, and pluggable eviction.
//!
//! # API Layers
//!
//! ## Prelude (Quick Start)
//!
//! Use `use cacheron::prelude::*;` to import all commonly used types.
//!
//! ## Core API
//!
//! - [`TieredCache`] - Composer over an ordered layer chain
//! - [`TieredCacheBuilder`] - Manual chain assembly
//! - [`CacheronConfig`] - Configuration for chain assembly
//! - [`SetOptions`] - Per-write TTL and tags
//! - [`CacheronError`] - Error types
//!
//! ## Layers
//!
//! In-memory bounded layer with pluggable eviction; filesystem and Redis
//! layers behind feature gates.
//!
//! ## Extensions (feature-gated)
//!
//! - Filesystem layer (requires `filesystem` feature)
//! - Redis layer (requires `redis` feature)
//!
//! # Examples
//!
//! ```rust
//! use cacheron::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     // 装配一条单层内存缓存链
//!     let layer = Arc::new(MemoryLayer::<String>::new(
//!         MemoryLayerConfig::new().max_entries(1000),
//!     ));
//!     let cache = TieredCacheBuilder::new()
//!         .layer(LayerHandle::with_tags("hot", layer.clone(), layer))
//!         .build()
//!         .unwrap();
//!
//!     // 写入并读回
//!     cache.set("key", "value".to_string(), &SetOptions::default()).await;
//!     assert_eq!(cache.get("key").await, Some("value".to_string()));
//! }
//! ```
//!
//! # Features
//!
//! - **Ordered layer chain**: Sequential probe from fastest to slowest, stop at first hit
//! - **Hit promotion**: Values found in slow layers are repopulated into faster layers
//! - **Per-entry TTL**: Lazy expiry checked on read, no background sweeper
//! - **Pluggable eviction**: Recency, frequency, or time-based victim selection
//! - **Tag invalidation**: Bulk delete by tag across capable layers
//! - **Single-flight loading**: Optional merging of concurrent loads for the same key

pub mod prelude;

pub mod config;
pub mod constants;
pub mod entry;
pub mod error;
pub mod eviction;
pub mod factory;
#[cfg(feature = "filesystem")]
pub mod fs_layer;
pub mod layer;
pub mod memory_layer;
#[cfg(feature = "redis")]
pub mod redis_layer;
pub mod single_flight;
pub mod stats;
pub mod tag_index;
pub mod tiered;
pub mod warmup;

// 重新导出常用类型
pub use config::{CacheronConfig, LayerConfig};
pub use entry::{CacheEntry, SetOptions};
pub use error::{CacheronError, StorageError};
pub use eviction::EvictionPolicy;
pub use factory::{LayerFactory, TieredCacheBuilder};
pub use layer::{CacheLayer, LayerHandle, TagInvalidation};
pub use memory_layer::{MemoryLayer, MemoryLayerConfig};
pub use single_flight::SingleFlightLoader;
pub use stats::{GlobalStats, LayerStats};
pub use tiered::TieredCache;
pub use warmup::{warm_up, WarmupEntry};

#[cfg(feature = "filesystem")]
pub use fs_layer::{FilesystemLayer, FilesystemLayerConfig};
#[cfg(feature = "redis")]
pub use redis_layer::{RedisLayer, RedisLayerConfig};
