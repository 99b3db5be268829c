//! 缓存预热模块
//!
//! 启动阶段把一批键值预先灌入缓存链，避免冷启动期的穿透。
//! 条目按给定顺序逐个加载，单个条目失败记录日志后跳过。

use futures::future::BoxFuture;
use tracing::{info, warn};

use crate::entry::SetOptions;
use crate::error::CacheronError;
use crate::tiered::TieredCache;

/// 预热条目
///
/// 加载器是一次性的boxed future，允许每个条目使用不同的数据源。
pub struct WarmupEntry<V> {
    /// 缓存键
    pub key: String,
    /// 值加载器
    pub loader: BoxFuture<'static, Result<V, CacheronError>>,
    /// 写入选项（TTL和标签）
    pub options: SetOptions,
}

impl<V> WarmupEntry<V> {
    /// 创建预热条目
    pub fn new(
        key: impl Into<String>,
        loader: BoxFuture<'static, Result<V, CacheronError>>,
    ) -> Self {
        Self {
            key: key.into(),
            loader,
            options: SetOptions::default(),
        }
    }

    /// 设置写入选项
    pub fn options(mut self, options: SetOptions) -> Self {
        self.options = options;
        self
    }
}

/// 预热缓存
///
/// 顺序执行每个条目的加载器并写入所有层，返回成功写入的条目数。
/// 加载失败的条目记录警告后跳过，不会中断后续条目。
pub async fn warm_up<V>(cache: &TieredCache<V>, entries: Vec<WarmupEntry<V>>) -> usize
where
    V: Clone + Send + Sync + 'static,
{
    let total = entries.len();
    let mut loaded = 0;

    for entry in entries {
        match entry.loader.await {
            Ok(value) => {
                cache.set(&entry.key, value, &entry.options).await;
                loaded += 1;
            }
            Err(e) => {
                warn!("预热条目加载失败: key={}, error={}", entry.key, e);
            }
        }
    }

    info!("缓存预热完成: loaded={}/{}", loaded, total);
    loaded
}
