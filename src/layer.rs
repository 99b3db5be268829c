//! 存储层抽象
//!
//! 定义所有存储后端的统一契约和按标签删除的可选能力。
//!
//! 后端自由选择实现方式（进程内表、远端键值存储、文件系统记录），
//! 只要遵守条目过期语义和标签语义。后端不可用属于层内部事务：
//! 读取视为未命中，写入/删除静默跳过，错误从不传播给组合器。

use async_trait::async_trait;
use std::sync::Arc;

use crate::entry::SetOptions;
use crate::stats::LayerStats;

/// 存储层契约
///
/// 每层独占自己的条目表和统计信息，是其唯一的变更者。
#[async_trait]
pub trait CacheLayer<V>: Send + Sync
where
    V: Clone + Send + Sync + 'static,
{
    /// 获取值
    ///
    /// 惰性过期：命中已过期条目时将其移除并报告未命中。
    async fn get(&self, key: &str) -> Option<V>;

    /// 设置值
    ///
    /// `options.ttl`为空时使用层默认TTL；标签集合替换该键此前的标签。
    async fn set(&self, key: &str, value: V, options: &SetOptions);

    /// 删除值，返回是否实际删除
    async fn delete(&self, key: &str) -> bool;

    /// 清空层
    async fn clear(&self);

    /// 检查键是否存在（同样执行惰性过期）
    async fn has(&self, key: &str) -> bool;

    /// 列出常驻键
    async fn keys(&self) -> Vec<String>;

    /// 常驻条目数
    ///
    /// 包含已过期但尚未被读取发现的条目。
    async fn size(&self) -> usize;

    /// 统计快照
    async fn stats(&self) -> LayerStats;
}

/// 按标签删除能力
///
/// 可选能力，在构造期绑定到层句柄上，组合器不做运行时探测。
#[async_trait]
pub trait TagInvalidation: Send + Sync {
    /// 删除携带该标签的所有条目，返回删除数量
    async fn delete_by_tag(&self, tag: &str) -> usize;
}

/// 层句柄
///
/// 组合器持有的单元：层名称、层契约对象，以及构造期解析的
/// 可选标签删除能力。
pub struct LayerHandle<V>
where
    V: Clone + Send + Sync + 'static,
{
    name: String,
    layer: Arc<dyn CacheLayer<V>>,
    tag_invalidation: Option<Arc<dyn TagInvalidation>>,
}

impl<V> LayerHandle<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// 创建无标签能力的层句柄
    pub fn new(name: impl Into<String>, layer: Arc<dyn CacheLayer<V>>) -> Self {
        Self {
            name: name.into(),
            layer,
            tag_invalidation: None,
        }
    }

    /// 创建带标签删除能力的层句柄
    ///
    /// `tags`通常是与`layer`相同的实例再次以能力特征对象的形式传入。
    pub fn with_tags(
        name: impl Into<String>,
        layer: Arc<dyn CacheLayer<V>>,
        tags: Arc<dyn TagInvalidation>,
    ) -> Self {
        Self {
            name: name.into(),
            layer,
            tag_invalidation: Some(tags),
        }
    }

    /// 层名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 层契约对象
    pub fn layer(&self) -> &Arc<dyn CacheLayer<V>> {
        &self.layer
    }

    /// 标签删除能力（若有）
    pub fn tag_invalidation(&self) -> Option<&Arc<dyn TagInvalidation>> {
        self.tag_invalidation.as_ref()
    }
}

impl<V> Clone for LayerHandle<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            layer: Arc::clone(&self.layer),
            tag_invalidation: self.tag_invalidation.clone(),
        }
    }
}

impl<V> std::fmt::Debug for LayerHandle<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerHandle")
            .field("name", &self.name)
            .field("tag_capable", &self.tag_invalidation.is_some())
            .finish()
    }
}
