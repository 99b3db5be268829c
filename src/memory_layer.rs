//! 内存层实现
//!
//! 进程内有界存储层，支持TTL、可插拔淘汰策略和标签删除。
//!
//! # 特性
//!
//! - **容量约束**: 插入新键且容量已满时，按配置的策略恰好淘汰一个条目
//! - **惰性过期**: 过期只在`get`/`has`时检查，没有后台清扫线程
//! - **标签索引**: 与条目表同锁维护，支持按标签批量删除
//! - **统计信息**: 命中/未命中计数和访问延迟滑动窗口
//!
//! 容量检查、淘汰选择和插入在同一次锁持有内完成，协作调度下
//! 并发的`get`/`set`序列不会破坏内部表。

use ahash::AHashMap;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use crate::constants::{DEFAULT_MAX_ENTRIES, DEFAULT_TTL_SECS};
use crate::entry::{CacheEntry, SetOptions};
use crate::eviction::EvictionPolicy;
use crate::layer::{CacheLayer, TagInvalidation};
use crate::stats::{LayerStats, LayerStatsRecorder};
use crate::tag_index::TagIndex;

/// 内存层配置
#[derive(Debug, Clone)]
pub struct MemoryLayerConfig {
    /// 最大条目数（None表示无界）
    pub max_entries: Option<usize>,
    /// 默认TTL
    pub default_ttl: Option<Duration>,
    /// 淘汰策略
    pub eviction_policy: EvictionPolicy,
}

impl Default for MemoryLayerConfig {
    fn default() -> Self {
        Self {
            max_entries: Some(DEFAULT_MAX_ENTRIES),
            default_ttl: Some(Duration::from_secs(DEFAULT_TTL_SECS)),
            eviction_policy: EvictionPolicy::Recency,
        }
    }
}

impl MemoryLayerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置最大条目数
    pub fn max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    /// 设置为无界
    pub fn unbounded(mut self) -> Self {
        self.max_entries = None;
        self
    }

    /// 设置默认TTL
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// 设置淘汰策略
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = policy;
        self
    }
}

/// 条目表和标签索引，保持一致性地在同一把锁下变更
struct MemoryTable<V> {
    entries: AHashMap<String, CacheEntry<V>>,
    tags: TagIndex,
}

impl<V> MemoryTable<V> {
    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.tags.remove(key, &entry.tags);
        Some(entry)
    }
}

/// 内存层实现
pub struct MemoryLayer<V> {
    table: Mutex<MemoryTable<V>>,
    config: MemoryLayerConfig,
    stats: LayerStatsRecorder,
}

impl<V> MemoryLayer<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// 创建新的内存层
    pub fn new(config: MemoryLayerConfig) -> Self {
        Self {
            table: Mutex::new(MemoryTable {
                entries: AHashMap::new(),
                tags: TagIndex::new(),
            }),
            config,
            stats: LayerStatsRecorder::new(),
        }
    }

    /// 使用默认配置创建内存层
    pub fn with_defaults() -> Self {
        Self::new(MemoryLayerConfig::default())
    }

    /// 获取配置
    pub fn config(&self) -> &MemoryLayerConfig {
        &self.config
    }

    fn effective_ttl(&self, options: &SetOptions) -> Duration {
        options
            .ttl
            .or(self.config.default_ttl)
            .unwrap_or(Duration::from_secs(DEFAULT_TTL_SECS))
    }
}

#[async_trait]
impl<V> CacheLayer<V> for MemoryLayer<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Option<V> {
        let started = Instant::now();
        let mut table = self.table.lock();

        let expired = match table.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => {
                self.stats.record_miss(started.elapsed());
                return None;
            }
        };

        if expired {
            table.remove_entry(key);
            trace!("惰性过期移除: key={}", key);
            self.stats.record_miss(started.elapsed());
            return None;
        }

        if let Some(entry) = table.entries.get_mut(key) {
            entry.record_access();
            let value = entry.value.clone();
            self.stats.record_hit(started.elapsed());
            return Some(value);
        }

        self.stats.record_miss(started.elapsed());
        None
    }

    async fn set(&self, key: &str, value: V, options: &SetOptions) {
        let ttl = self.effective_ttl(options);
        let entry = CacheEntry::new(value, ttl, options.tag_set());

        let mut table = self.table.lock();

        if table.entries.contains_key(key) {
            // 重写已存在的键：新标签集合替换旧集合，不触发淘汰
            table.remove_entry(key);
        } else if let Some(max_entries) = self.config.max_entries {
            if table.entries.len() >= max_entries {
                let victim = self
                    .config
                    .eviction_policy
                    .select_victim(table.entries.iter());
                if let Some(victim) = victim {
                    table.remove_entry(&victim);
                    debug!(
                        "容量淘汰: victim={}, policy={:?}",
                        victim, self.config.eviction_policy
                    );
                }
            }
        }

        table.tags.insert(key, &entry.tags);
        table.entries.insert(key.to_string(), entry);
    }

    async fn delete(&self, key: &str) -> bool {
        let mut table = self.table.lock();
        table.remove_entry(key).is_some()
    }

    async fn clear(&self) {
        let mut table = self.table.lock();
        table.entries.clear();
        table.tags.clear();
    }

    async fn has(&self, key: &str) -> bool {
        let mut table = self.table.lock();
        let expired = match table.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => return false,
        };

        if expired {
            table.remove_entry(key);
            return false;
        }
        true
    }

    async fn keys(&self) -> Vec<String> {
        let table = self.table.lock();
        table.entries.keys().cloned().collect()
    }

    async fn size(&self) -> usize {
        let table = self.table.lock();
        table.entries.len()
    }

    async fn stats(&self) -> LayerStats {
        let size = self.table.lock().entries.len();
        self.stats.snapshot(size)
    }
}

#[async_trait]
impl<V> TagInvalidation for MemoryLayer<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn delete_by_tag(&self, tag: &str) -> usize {
        let mut table = self.table.lock();
        let members: Vec<String> = match table.tags.members(tag) {
            Some(members) => members.iter().cloned().collect(),
            None => return 0,
        };

        let mut count = 0;
        for key in members {
            if table.remove_entry(&key).is_some() {
                count += 1;
            }
        }

        debug!("按标签删除: tag={}, count={}", tag, count);
        count
    }
}
