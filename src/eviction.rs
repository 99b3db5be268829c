//! 淘汰策略
//!
//! 有界层容量超限时选择被移除的条目。
//!
//! 选择是对常驻条目的O(n)扫描，n由`max_entries`约束。这是刻意的
//! 简单性/吞吐量权衡；需要O(1)淘汰的场景可以换用有序结构
//! （recency用双向链表+哈希索引，frequency用计数结构），属于可选的
//! 性能升级而非正确性要求。

use serde::{Deserialize, Serialize};

use crate::entry::CacheEntry;

/// 淘汰策略
///
/// 平分时取扫描中先遇到的条目，依赖底层哈希表的迭代顺序，结果不确定。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionPolicy {
    /// 按最近访问时间淘汰（LRU）
    #[default]
    Recency,
    /// 按访问次数淘汰（LFU）
    Frequency,
    /// 按过期时间淘汰
    TimeBased,
    /// 永不淘汰
    None,
}

impl EvictionPolicy {
    /// 从常驻条目中选择被淘汰的键
    ///
    /// `None`策略不选择任何条目。
    pub fn select_victim<'a, V, I>(&self, entries: I) -> Option<String>
    where
        I: Iterator<Item = (&'a String, &'a CacheEntry<V>)>,
        V: 'a,
    {
        match self {
            EvictionPolicy::Recency => entries
                .min_by_key(|(_, e)| e.last_accessed)
                .map(|(k, _)| k.clone()),
            EvictionPolicy::Frequency => entries
                .min_by_key(|(_, e)| e.access_count)
                .map(|(k, _)| k.clone()),
            EvictionPolicy::TimeBased => entries
                .min_by_key(|(_, e)| e.expires_at)
                .map(|(k, _)| k.clone()),
            EvictionPolicy::None => None,
        }
    }
}
