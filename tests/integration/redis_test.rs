//! Redis层集成测试
//!
//! 测试Redis存储层的集成功能

use cacheron::entry::SetOptions;
use cacheron::layer::CacheLayer;
use cacheron::redis_layer::{RedisLayer, RedisLayerConfig};
use std::time::Duration;

use crate::common::wait_millis;

async fn redis_layer(prefix: &str) -> RedisLayer<String> {
    let config = RedisLayerConfig::new("redis://localhost:6379")
        .key_prefix(format!("cacheron-test:{}:", prefix));
    RedisLayer::new(config).await.unwrap()
}

/// 测试Redis连接和基本读写
#[tokio::test]
#[ignore] // 需要Redis服务器运行
async fn test_redis_set_get_roundtrip() {
    let layer = redis_layer("roundtrip").await;
    layer.clear().await;

    layer.set("k1", "v1".to_string(), &SetOptions::default()).await;
    assert_eq!(layer.get("k1").await, Some("v1".to_string()));
    assert!(layer.has("k1").await);

    assert!(layer.delete("k1").await);
    assert_eq!(layer.get("k1").await, None);
}

/// 测试TTL由Redis服务端执行
#[tokio::test]
#[ignore]
async fn test_redis_ttl_expiry() {
    let layer = redis_layer("ttl").await;
    layer.clear().await;

    layer
        .set(
            "short",
            "v".to_string(),
            &SetOptions::new().ttl(Duration::from_millis(100)),
        )
        .await;
    assert_eq!(layer.get("short").await, Some("v".to_string()));

    wait_millis(200).await;
    assert_eq!(layer.get("short").await, None);
}

/// 测试键扫描和清空只影响本前缀
#[tokio::test]
#[ignore]
async fn test_redis_keys_scoped_to_prefix() {
    let layer_a = redis_layer("scope-a").await;
    let layer_b = redis_layer("scope-b").await;
    layer_a.clear().await;
    layer_b.clear().await;

    layer_a.set("k1", "a".to_string(), &SetOptions::default()).await;
    layer_b.set("k1", "b".to_string(), &SetOptions::default()).await;

    assert_eq!(layer_a.keys().await, vec!["k1".to_string()]);
    assert_eq!(layer_a.size().await, 1);

    layer_a.clear().await;
    assert_eq!(layer_a.size().await, 0);
    // 其他前缀的数据不受影响
    assert_eq!(layer_b.get("k1").await, Some("b".to_string()));

    layer_b.clear().await;
}
