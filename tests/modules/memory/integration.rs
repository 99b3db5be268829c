//! 内存层集成测试
//!
//! 通过公共契约验证有界内存层的TTL、淘汰和标签语义。

use cacheron::entry::SetOptions;
use cacheron::eviction::EvictionPolicy;
use cacheron::layer::{CacheLayer, TagInvalidation};
use cacheron::memory_layer::{MemoryLayer, MemoryLayerConfig};
use std::sync::Arc;
use std::time::Duration;

use crate::common::wait_millis;

#[tokio::test]
async fn test_default_ttl_applies_when_options_empty() {
    let layer = MemoryLayer::<String>::new(
        MemoryLayerConfig::new().default_ttl(Duration::from_millis(50)),
    );

    layer.set("k1", "v1".to_string(), &SetOptions::default()).await;
    assert_eq!(layer.get("k1").await, Some("v1".to_string()));

    wait_millis(80).await;
    assert_eq!(layer.get("k1").await, None);
}

#[tokio::test]
async fn test_per_entry_ttl_overrides_default() {
    let layer = MemoryLayer::<String>::new(
        MemoryLayerConfig::new().default_ttl(Duration::from_millis(30)),
    );

    layer
        .set(
            "long",
            "v".to_string(),
            &SetOptions::new().ttl(Duration::from_secs(60)),
        )
        .await;

    wait_millis(60).await;
    // 条目自带的TTL长于层默认值，仍然存活
    assert_eq!(layer.get("long").await, Some("v".to_string()));
}

#[tokio::test]
async fn test_recency_eviction_under_interleaved_access() {
    let layer = MemoryLayer::<String>::new(
        MemoryLayerConfig::new()
            .max_entries(3)
            .eviction_policy(EvictionPolicy::Recency),
    );

    layer.set("a", "1".to_string(), &SetOptions::default()).await;
    wait_millis(2).await;
    layer.set("b", "2".to_string(), &SetOptions::default()).await;
    wait_millis(2).await;
    layer.set("c", "3".to_string(), &SetOptions::default()).await;
    wait_millis(2).await;

    // 访问a刷新其最近访问时间，b成为最久未访问
    layer.get("a").await;
    wait_millis(2).await;

    layer.set("d", "4".to_string(), &SetOptions::default()).await;

    assert!(layer.has("a").await);
    assert!(!layer.has("b").await);
    assert!(layer.has("c").await);
    assert!(layer.has("d").await);
}

#[tokio::test]
async fn test_frequency_eviction_prefers_cold_entries() {
    let layer = MemoryLayer::<String>::new(
        MemoryLayerConfig::new()
            .max_entries(2)
            .eviction_policy(EvictionPolicy::Frequency),
    );

    layer.set("hot", "1".to_string(), &SetOptions::default()).await;
    layer.set("cold", "2".to_string(), &SetOptions::default()).await;

    for _ in 0..5 {
        layer.get("hot").await;
    }

    layer.set("new", "3".to_string(), &SetOptions::default()).await;

    assert!(layer.has("hot").await);
    assert!(!layer.has("cold").await);
    assert!(layer.has("new").await);
}

#[tokio::test]
async fn test_tag_replacement_on_overwrite() {
    let layer = MemoryLayer::<String>::new(MemoryLayerConfig::new());

    layer
        .set("k1", "v1".to_string(), &SetOptions::new().tag("old"))
        .await;
    layer
        .set("k1", "v2".to_string(), &SetOptions::new().tag("new"))
        .await;

    // 旧标签在重写时被替换
    assert_eq!(layer.delete_by_tag("old").await, 0);
    assert_eq!(layer.delete_by_tag("new").await, 1);
    assert_eq!(layer.get("k1").await, None);
}

#[tokio::test]
async fn test_concurrent_writers_respect_capacity() {
    let layer = Arc::new(MemoryLayer::<String>::new(
        MemoryLayerConfig::new().max_entries(10),
    ));

    let mut tasks = Vec::new();
    for i in 0..50 {
        let layer = Arc::clone(&layer);
        tasks.push(tokio::spawn(async move {
            layer
                .set(&format!("k{}", i), format!("v{}", i), &SetOptions::default())
                .await;
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    // 淘汰在锁内完成，容量从不被突破
    assert!(layer.size().await <= 10);
}

#[tokio::test]
async fn test_stats_reflect_hits_and_misses() {
    let layer = MemoryLayer::<String>::new(MemoryLayerConfig::new());

    layer.set("k1", "v1".to_string(), &SetOptions::default()).await;
    layer.get("k1").await;
    layer.get("k1").await;
    layer.get("missing").await;

    let stats = layer.stats().await;
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.size, 1);
}
