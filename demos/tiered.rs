//! 多层缓存示例
//!
//! 本示例演示如何装配内存+文件系统两层缓存链，体验命中晋升、
//! TTL过期和标签失效。
//!
//! 运行方式: `cargo run --example tiered`

use cacheron::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== 多层缓存示例 ===\n");

    // 装配两层链: 有界内存层(L0) + 文件系统层(L1)
    let dir = std::env::temp_dir().join("cacheron-demo");
    let memory = Arc::new(MemoryLayer::<String>::new(
        MemoryLayerConfig::new()
            .max_entries(2)
            .eviction_policy(EvictionPolicy::Recency),
    ));
    let fs = Arc::new(
        FilesystemLayer::<String>::new(FilesystemLayerConfig::new(&dir))
            .expect("创建文件系统层失败"),
    );

    let cache = TieredCacheBuilder::new()
        .layer(LayerHandle::with_tags("memory", memory.clone(), memory))
        .layer(LayerHandle::with_tags("disk", fs.clone(), fs))
        .build()
        .expect("装配缓存链失败");
    println!("创建缓存链: memory(容量=2) -> disk\n");

    // 演示命中晋升
    println!("--- 演示命中晋升 ---");
    cache.set("a", "alpha".to_string(), &SetOptions::default()).await;
    cache.set("b", "beta".to_string(), &SetOptions::default()).await;
    // c把a从容量为2的内存层中淘汰，磁盘层仍保留a
    cache.set("c", "gamma".to_string(), &SetOptions::default()).await;

    println!("读取a: {:?} (磁盘命中后晋升回内存层)", cache.get("a").await);
    println!(
        "内存层现在包含a: {}\n",
        cache.layers()[0].layer().has("a").await
    );

    // 演示TTL过期
    println!("--- 演示TTL过期 ---");
    cache
        .set(
            "short",
            "短命".to_string(),
            &SetOptions::new().ttl(Duration::from_millis(100)),
        )
        .await;
    println!("立即读取short: {:?}", cache.get("short").await);
    sleep(Duration::from_millis(150)).await;
    println!("150ms后读取short: {:?}\n", cache.get("short").await);

    // 演示标签失效
    println!("--- 演示标签失效 ---");
    cache
        .set(
            "user:1",
            "张三".to_string(),
            &SetOptions::new().tag("users"),
        )
        .await;
    cache
        .set(
            "user:2",
            "李四".to_string(),
            &SetOptions::new().tag("users"),
        )
        .await;
    let removed = cache.delete_by_tag("users").await;
    println!("按标签users删除: {}条", removed);
    println!("读取user:1: {:?}\n", cache.get("user:1").await);

    // 演示统计
    println!("--- 演示统计 ---");
    let stats = cache.stats().await;
    println!(
        "命中={}, 未命中={}, 命中率={:.2}",
        stats.hits, stats.misses, stats.hit_rate
    );
    for (name, layer_stats) in &stats.per_layer {
        println!(
            "  层{}: hits={}, misses={}, size={}",
            name, layer_stats.hits, layer_stats.misses, layer_stats.size
        );
    }

    cache.clear().await;
    println!("\n=== 示例完成 ===");
}
