//! 多层缓存组合器
//!
//! 持有一条固定顺序的存储层链（快到慢），实现命中晋升读路径、
//! 扇出写/删、跨层键和标签操作以及全局统计聚合。
//!
//! # 特性
//!
//! - **顺序探测**: `get`按层序探测，命中即停
//! - **命中晋升**: 低层命中后把值按层序回填到所有更快的层
//! - **扇出**: `set`/`delete`/`clear`并发下发到每一层，单层失败不影响其他层
//! - **标签失效**: 只下发给具备标签删除能力的层，其余静默跳过
//! - **单飞加载**: 可选的`get_or_load`合并同键并发加载
//!
//! 组合器只持有层句柄列表和全局计数器，从不触碰任何层的内部存储。

use futures::future::join_all;
use regex::Regex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, instrument, trace};

use crate::entry::SetOptions;
use crate::error::{CacheronError, StorageError};
use crate::layer::LayerHandle;
use crate::single_flight::SingleFlightLoader;
use crate::stats::GlobalStats;

/// 全局计数器
#[derive(Debug, Default)]
struct GlobalCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
}

impl GlobalCounters {
    fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.sets.store(0, Ordering::Relaxed);
        self.deletes.store(0, Ordering::Relaxed);
    }
}

/// 多层缓存组合器
///
/// 层顺序在构造时固定，最快的层在前。每个实例独立持有自己的
/// 全局计数器，`reset_stats`显式清零，不存在进程级单例。
pub struct TieredCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    layers: Vec<LayerHandle<V>>,
    counters: GlobalCounters,
    analytics_enabled: bool,
    single_flight: SingleFlightLoader<V>,
}

impl<V> TieredCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// 创建新的组合器
    ///
    /// 层列表为空时返回配置错误。
    pub fn new(layers: Vec<LayerHandle<V>>, analytics_enabled: bool) -> Result<Self, CacheronError> {
        if layers.is_empty() {
            return Err(CacheronError::ConfigError(
                "至少需要一个存储层".to_string(),
            ));
        }

        Ok(Self {
            layers,
            counters: GlobalCounters::default(),
            analytics_enabled,
            single_flight: SingleFlightLoader::new(),
        })
    }

    /// 层句柄列表
    pub fn layers(&self) -> &[LayerHandle<V>] {
        &self.layers
    }

    /// 是否启用分析统计
    pub fn analytics_enabled(&self) -> bool {
        self.analytics_enabled
    }

    /// 获取值
    ///
    /// 按层序探测；第`i`层命中时，先把值按层序依次回填到`0..i`层
    /// （每层套用自己的默认TTL，不携带原TTL和标签），再返回。
    /// 晋升在`get`返回前完成，单层晋升失败由该层内部消化。
    #[instrument(skip(self))]
    pub async fn get(&self, key: &str) -> Option<V> {
        for (i, handle) in self.layers.iter().enumerate() {
            if let Some(value) = handle.layer().get(key).await {
                trace!("层命中: layer={}, key={}", handle.name(), key);
                if self.analytics_enabled {
                    self.counters.hits.fetch_add(1, Ordering::Relaxed);
                }

                // 晋升：按层序回填更快的层
                let promote_options = SetOptions::default();
                for faster in &self.layers[..i] {
                    faster
                        .layer()
                        .set(key, value.clone(), &promote_options)
                        .await;
                    trace!("晋升回填: layer={}, key={}", faster.name(), key);
                }

                return Some(value);
            }
        }

        if self.analytics_enabled {
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
        }
        None
    }

    /// 设置值
    ///
    /// 并发写入每一层；层的写入失败在层内部消化，不会阻断其他层。
    #[instrument(skip(self, value, options))]
    pub async fn set(&self, key: &str, value: V, options: &SetOptions) {
        self.counters.sets.fetch_add(1, Ordering::Relaxed);

        join_all(
            self.layers
                .iter()
                .map(|handle| handle.layer().set(key, value.clone(), options)),
        )
        .await;
    }

    /// 删除值
    ///
    /// 并发下发到每一层，任意一层实际删除即返回true。
    #[instrument(skip(self))]
    pub async fn delete(&self, key: &str) -> bool {
        self.counters.deletes.fetch_add(1, Ordering::Relaxed);

        let results = join_all(self.layers.iter().map(|handle| handle.layer().delete(key))).await;
        results.into_iter().any(|deleted| deleted)
    }

    /// 清空所有层
    pub async fn clear(&self) {
        join_all(self.layers.iter().map(|handle| handle.layer().clear())).await;
    }

    /// 检查键是否存在
    ///
    /// 按层序短路探测，不触发晋升。
    pub async fn has(&self, key: &str) -> bool {
        for handle in &self.layers {
            if handle.layer().has(key).await {
                return true;
            }
        }
        false
    }

    /// 所有层键集合的去重并集，顺序不保证
    pub async fn keys(&self) -> Vec<String> {
        let per_layer = join_all(self.layers.iter().map(|handle| handle.layer().keys())).await;

        let mut union = ahash::AHashSet::new();
        for keys in per_layer {
            union.extend(keys);
        }
        union.into_iter().collect()
    }

    /// 按标签删除
    ///
    /// 只下发给具备标签删除能力的层并累加删除数，其余层静默跳过。
    #[instrument(skip(self))]
    pub async fn delete_by_tag(&self, tag: &str) -> usize {
        let results = join_all(
            self.layers
                .iter()
                .filter_map(|handle| handle.tag_invalidation())
                .map(|tags| tags.delete_by_tag(tag)),
        )
        .await;

        let count: usize = results.into_iter().sum();
        debug!("跨层标签删除: tag={}, count={}", tag, count);
        count
    }

    /// 获取或加载
    ///
    /// 未命中时调用加载器并写回。同键的并发未命中各自独立调用
    /// 加载器（需要合并时改用[`get_or_load`](Self::get_or_load)）。
    /// 加载器错误原样传播，不写入缓存。
    pub async fn get_or_set<F, Fut>(
        &self,
        key: &str,
        loader: F,
        options: &SetOptions,
    ) -> Result<V, CacheronError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<V, CacheronError>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        let value = loader().await?;
        self.set(key, value.clone(), options).await;
        Ok(value)
    }

    /// 单飞模式获取或加载
    ///
    /// 与[`get_or_set`](Self::get_or_set)的区别：同键的并发未命中
    /// 合并为一次实际加载，其余调用者等待同一个在途结果。
    pub async fn get_or_load<F, Fut>(
        &self,
        key: &str,
        loader: F,
        options: &SetOptions,
    ) -> Result<V, StorageError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<V, StorageError>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        let value = self.single_flight.get_or_load(key, loader).await?;
        self.set(key, value.clone(), options).await;
        Ok(value)
    }

    /// 批量获取
    ///
    /// 并发取每个键，结果只包含命中的键。
    pub async fn mget(&self, keys: &[String]) -> HashMap<String, V> {
        let results = join_all(keys.iter().map(|key| async move {
            (key.clone(), self.get(key).await)
        }))
        .await;

        results
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key, v)))
            .collect()
    }

    /// 批量设置，所有条目使用相同选项
    pub async fn mset(&self, entries: Vec<(String, V)>, options: &SetOptions) {
        join_all(
            entries
                .into_iter()
                .map(|(key, value)| async move { self.set(&key, value, options).await }),
        )
        .await;
    }

    /// 按正则模式失效
    ///
    /// 对全量键并集做匹配并逐一删除，返回匹配数。列举和删除之间
    /// 存在竞争（条目可能在其间过期），返回值反映扫描结果而非
    /// 最终删除数。
    #[instrument(skip(self))]
    pub async fn invalidate_pattern(&self, pattern: &str) -> Result<usize, CacheronError> {
        let regex =
            Regex::new(pattern).map_err(|e| CacheronError::PatternError(e.to_string()))?;

        let matched: Vec<String> = self
            .keys()
            .await
            .into_iter()
            .filter(|key| regex.is_match(key))
            .collect();

        let count = matched.len();
        join_all(matched.iter().map(|key| self.delete(key))).await;

        debug!("模式失效: pattern={}, matched={}", pattern, count);
        Ok(count)
    }

    /// 刷新TTL
    ///
    /// 读出当前值（可能触发晋升）后用新TTL重写，键不存在时返回false。
    /// 这是完整的值重写而非原地过期修改。
    pub async fn touch(&self, key: &str, ttl: Option<Duration>) -> bool {
        let value = match self.get(key).await {
            Some(value) => value,
            None => return false,
        };

        let mut options = SetOptions::new();
        if let Some(ttl) = ttl {
            options = options.ttl(ttl);
        }
        self.set(key, value, &options).await;
        true
    }

    /// 全局聚合统计
    ///
    /// 各层统计实时向层查询，组合器不做缓存。
    pub async fn stats(&self) -> GlobalStats {
        let hits = self.counters.hits.load(Ordering::Relaxed);
        let misses = self.counters.misses.load(Ordering::Relaxed);
        let total_requests = hits + misses;
        let hit_rate = if total_requests == 0 {
            0.0
        } else {
            hits as f64 / total_requests as f64
        };

        let mut per_layer = ahash::AHashMap::new();
        for handle in &self.layers {
            per_layer.insert(handle.name().to_string(), handle.layer().stats().await);
        }

        GlobalStats {
            hits,
            misses,
            sets: self.counters.sets.load(Ordering::Relaxed),
            deletes: self.counters.deletes.load(Ordering::Relaxed),
            hit_rate,
            total_requests,
            per_layer,
        }
    }

    /// 重置全局计数器
    pub fn reset_stats(&self) {
        self.counters.reset();
    }
}

impl<V> std::fmt::Debug for TieredCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredCache")
            .field("layers", &self.layers)
            .field("analytics_enabled", &self.analytics_enabled)
            .finish()
    }
}
