//! 测试通用工具模块
//!
//! 提供测试中常用的工具函数和辅助结构。
#![allow(dead_code)]

use async_trait::async_trait;
use cacheron::{
    entry::SetOptions,
    eviction::EvictionPolicy,
    layer::{CacheLayer, LayerHandle, TagInvalidation},
    memory_layer::{MemoryLayer, MemoryLayerConfig},
    stats::LayerStats,
    tiered::TieredCache,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// 创建测试用的内存层句柄（带标签能力）
pub fn create_memory_handle(name: &str, config: MemoryLayerConfig) -> LayerHandle<String> {
    let layer = Arc::new(MemoryLayer::<String>::new(config));
    LayerHandle::with_tags(name, layer.clone(), layer)
}

/// 创建两层内存缓存链，L0有界，L1无界
pub fn create_two_tier(l0_max: usize) -> TieredCache<String> {
    let l0 = create_memory_handle(
        "l0",
        MemoryLayerConfig::new()
            .max_entries(l0_max)
            .eviction_policy(EvictionPolicy::Recency),
    );
    let l1 = create_memory_handle("l1", MemoryLayerConfig::new().unbounded());
    TieredCache::new(vec![l0, l1], true).unwrap()
}

/// 包装层 - 统计各操作的调用次数
///
/// 用于验证组合器的探测顺序、短路和晋升行为。
pub struct CountingLayer {
    inner: MemoryLayer<String>,
    pub gets: AtomicU64,
    pub sets: AtomicU64,
    pub deletes: AtomicU64,
}

impl CountingLayer {
    pub fn new(config: MemoryLayerConfig) -> Self {
        Self {
            inner: MemoryLayer::new(config),
            gets: AtomicU64::new(0),
            sets: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
        }
    }

    pub fn get_count(&self) -> u64 {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn set_count(&self) -> u64 {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> u64 {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheLayer<String> for CountingLayer {
    async fn get(&self, key: &str) -> Option<String> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String, options: &SetOptions) {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value, options).await
    }

    async fn delete(&self, key: &str) -> bool {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(key).await
    }

    async fn clear(&self) {
        self.inner.clear().await
    }

    async fn has(&self, key: &str) -> bool {
        self.inner.has(key).await
    }

    async fn keys(&self) -> Vec<String> {
        self.inner.keys().await
    }

    async fn size(&self) -> usize {
        self.inner.size().await
    }

    async fn stats(&self) -> LayerStats {
        self.inner.stats().await
    }
}

#[async_trait]
impl TagInvalidation for CountingLayer {
    async fn delete_by_tag(&self, tag: &str) -> usize {
        self.inner.delete_by_tag(tag).await
    }
}

/// 故障层 - 所有操作表现为不可用
///
/// 读取视为未命中，写入/删除为空操作，模拟后端整体失联。
pub struct DeadLayer;

#[async_trait]
impl CacheLayer<String> for DeadLayer {
    async fn get(&self, _key: &str) -> Option<String> {
        None
    }

    async fn set(&self, _key: &str, _value: String, _options: &SetOptions) {}

    async fn delete(&self, _key: &str) -> bool {
        false
    }

    async fn clear(&self) {}

    async fn has(&self, _key: &str) -> bool {
        false
    }

    async fn keys(&self) -> Vec<String> {
        Vec::new()
    }

    async fn size(&self) -> usize {
        0
    }

    async fn stats(&self) -> LayerStats {
        LayerStats::default()
    }
}

/// 等待指定时间（简化测试代码）
pub async fn wait_millis(ms: u64) {
    sleep(Duration::from_millis(ms)).await;
}

/// 带标签和TTL的写入选项
pub fn options_with(ttl_ms: Option<u64>, tags: &[&str]) -> SetOptions {
    let mut options = SetOptions::new();
    if let Some(ms) = ttl_ms {
        options = options.ttl(Duration::from_millis(ms));
    }
    for tag in tags {
        options = options.tag(*tag);
    }
    options
}
