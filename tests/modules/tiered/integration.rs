//! 组合器集成测试
//!
//! 用计数层验证探测顺序、短路和晋升的层间交互。

use cacheron::entry::SetOptions;
use cacheron::layer::{CacheLayer, LayerHandle};
use cacheron::memory_layer::MemoryLayerConfig;
use cacheron::tiered::TieredCache;
use std::sync::Arc;
use std::time::Duration;

use crate::common::{create_two_tier, options_with, wait_millis, CountingLayer};

fn counting_chain() -> (TieredCache<String>, Arc<CountingLayer>, Arc<CountingLayer>) {
    let l0 = Arc::new(CountingLayer::new(MemoryLayerConfig::new()));
    let l1 = Arc::new(CountingLayer::new(MemoryLayerConfig::new()));
    let cache = TieredCache::new(
        vec![
            LayerHandle::with_tags("l0", l0.clone(), l0.clone()),
            LayerHandle::with_tags("l1", l1.clone(), l1.clone()),
        ],
        true,
    )
    .unwrap();
    (cache, l0, l1)
}

#[tokio::test]
async fn test_hit_in_fastest_layer_stops_probe() {
    let (cache, l0, l1) = counting_chain();

    cache.set("k1", "v1".to_string(), &SetOptions::default()).await;
    let l1_gets_before = l1.get_count();

    cache.get("k1").await;

    // L0命中，探测不会到达L1
    assert_eq!(l0.get_count(), 1);
    assert_eq!(l1.get_count(), l1_gets_before);
}

#[tokio::test]
async fn test_miss_probes_every_layer() {
    let (cache, l0, l1) = counting_chain();

    cache.get("missing").await;

    assert_eq!(l0.get_count(), 1);
    assert_eq!(l1.get_count(), 1);
}

#[tokio::test]
async fn test_promotion_writes_only_faster_layers() {
    let (cache, l0, l1) = counting_chain();

    // 只写L1，模拟L0淘汰后的状态
    l1.set("k1", "v1".to_string(), &SetOptions::default()).await;
    let l0_sets_before = l0.set_count();
    let l1_sets_before = l1.set_count();

    assert_eq!(cache.get("k1").await, Some("v1".to_string()));

    // 晋升只回填L0，不重写命中层自身
    assert_eq!(l0.set_count(), l0_sets_before + 1);
    assert_eq!(l1.set_count(), l1_sets_before);
}

#[tokio::test]
async fn test_set_fans_out_to_all_layers() {
    let (cache, l0, l1) = counting_chain();

    cache.set("k1", "v1".to_string(), &SetOptions::default()).await;

    assert_eq!(l0.set_count(), 1);
    assert_eq!(l1.set_count(), 1);
}

#[tokio::test]
async fn test_delete_fans_out_to_all_layers() {
    let (cache, l0, l1) = counting_chain();

    cache.set("k1", "v1".to_string(), &SetOptions::default()).await;
    cache.delete("k1").await;

    assert_eq!(l0.delete_count(), 1);
    assert_eq!(l1.delete_count(), 1);
}

#[tokio::test]
async fn test_promoted_entry_uses_target_layer_default_ttl() {
    let l0 = Arc::new(CountingLayer::new(
        MemoryLayerConfig::new().default_ttl(Duration::from_millis(50)),
    ));
    let l1 = Arc::new(CountingLayer::new(MemoryLayerConfig::new()));
    let cache = TieredCache::new(
        vec![
            LayerHandle::with_tags("l0", l0.clone(), l0.clone()),
            LayerHandle::with_tags("l1", l1.clone(), l1.clone()),
        ],
        true,
    )
    .unwrap();

    l1.set(
        "k1",
        "v1".to_string(),
        &SetOptions::new().ttl(Duration::from_secs(60)),
    )
    .await;

    // 晋升回填使用L0自己的默认TTL而非原条目TTL
    cache.get("k1").await;
    wait_millis(80).await;

    let l1_gets_before = l1.get_count();
    assert_eq!(cache.get("k1").await, Some("v1".to_string()));
    // L0中的晋升副本已过期，这次命中来自L1
    assert_eq!(l1.get_count(), l1_gets_before + 1);
}

#[tokio::test]
async fn test_expired_entry_falls_through_to_slower_layer() {
    let cache = create_two_tier(100);

    cache
        .set("k1", "v1".to_string(), &options_with(Some(40), &[]))
        .await;

    wait_millis(70).await;
    // 两层的副本都过期
    assert_eq!(cache.get("k1").await, None);
}

#[tokio::test]
async fn test_touch_missing_key_returns_false() {
    let cache = create_two_tier(100);
    assert!(!cache.touch("missing", Some(Duration::from_secs(1))).await);
}

#[tokio::test]
async fn test_per_layer_stats_keyed_by_name() {
    let cache = create_two_tier(100);
    cache.set("k1", "v1".to_string(), &SetOptions::default()).await;
    cache.get("k1").await;

    let stats = cache.stats().await;
    assert!(stats.per_layer.contains_key("l0"));
    assert!(stats.per_layer.contains_key("l1"));
    assert_eq!(stats.per_layer["l0"].hits, 1);
}
