//! Copyright (c) 2026, Kirky.X
//!
//! MIT License
//!
//! Centralized configuration constants for Cacheron.
//!
//! This module provides well-documented constants used throughout the library.
//! All magic numbers are defined here with their purpose and usage context.

/// Default capacity for the bounded memory layer when not specified.
///
/// This value provides reasonable out-of-box performance for most applications.
/// Represents 10,000 cache entries.
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Default TTL for cache entries (5 minutes).
///
/// Applied when neither the write options nor the layer configuration
/// carry an explicit TTL.
pub const DEFAULT_TTL_SECS: u64 = 300;

/// Minimum TTL in milliseconds.
///
/// TTLs below this value are clamped so that `expires_at > created_at`
/// always holds.
pub const MIN_TTL_MS: u64 = 1;

/// Number of access-latency samples retained per layer.
///
/// The layer's `avg_access_time_ms` is the arithmetic mean over a sliding
/// window of this many most recent samples, oldest dropped first.
pub const STATS_WINDOW_SIZE: usize = 100;

// ============================================================================
// Retry and Backoff Constants
// ============================================================================

/// Maximum retry attempts for transient remote-layer failures.
///
/// Default number of retry attempts before giving up.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Initial delay for exponential backoff (100 milliseconds).
///
/// Starting delay before the first retry.
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 100;

/// Default connection timeout for remote layers (5 seconds).
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 5;

// ============================================================================
// Key Constants
// ============================================================================

/// Maximum key length (1024 characters).
///
/// Prevents excessive memory usage from oversized keys.
pub const MAX_KEY_LENGTH: usize = 1024;

/// Default key prefix for the Redis layer.
pub const DEFAULT_REDIS_KEY_PREFIX: &str = "cacheron:";

/// SCAN batch size used by the Redis layer when listing keys.
pub const REDIS_SCAN_COUNT: usize = 100;

// ============================================================================
// Time Conversion Constants
// ============================================================================

/// Milliseconds per second.
pub const MS_PER_SECOND: u64 = 1000;

/// Nanoseconds per millisecond.
pub const NS_PER_MS: u64 = 1_000_000;
