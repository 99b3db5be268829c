//! 缓存条目
//!
//! 定义各存储层共用的条目记录和写入选项。
//!
//! 条目在`set`时创建，在每次命中读取时由所属层原地更新访问统计，
//! 在显式删除、惰性过期检测或容量淘汰时销毁。

use ahash::AHashSet;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::MIN_TTL_MS;

/// 缓存条目
///
/// 纯数据记录。`expires_at > created_at`恒成立（TTL最小钳制为1毫秒）。
/// `access_count`每次命中读取恰好递增一次；`last_accessed`只在命中读取时更新，
/// 写入不更新。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    /// 缓存值
    pub value: V,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 过期时间
    pub expires_at: DateTime<Utc>,
    /// 访问次数
    pub access_count: u64,
    /// 最后访问时间
    pub last_accessed: DateTime<Utc>,
    /// 标签集合（空集合表示无标签）
    #[serde(default)]
    pub tags: AHashSet<String>,
}

impl<V> CacheEntry<V> {
    /// 创建新的缓存条目
    pub fn new(value: V, ttl: Duration, tags: AHashSet<String>) -> Self {
        let now = Utc::now();
        let ttl_ms = (ttl.as_millis() as i64).max(MIN_TTL_MS as i64);
        Self {
            value,
            created_at: now,
            expires_at: now + ChronoDuration::milliseconds(ttl_ms),
            access_count: 0,
            last_accessed: now,
            tags,
        }
    }

    /// 检查是否过期
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// 更新访问信息
    pub fn record_access(&mut self) {
        self.last_accessed = Utc::now();
        self.access_count += 1;
    }
}

/// 写入选项
///
/// `ttl`为空时使用层配置的默认TTL；`tags`替换（而非合并）该键此前的标签集合。
#[derive(Debug, Clone, Default)]
pub struct SetOptions {
    /// 过期时间
    pub ttl: Option<Duration>,
    /// 标签列表
    pub tags: Vec<String>,
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置TTL
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// 设置标签
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// 追加单个标签
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// 标签集合
    pub fn tag_set(&self) -> AHashSet<String> {
        self.tags.iter().cloned().collect()
    }
}
