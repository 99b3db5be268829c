//! 层工厂模块
//!
//! 提供统一的层创建接口，支持通过配置动态装配缓存链。
//!
//! # 特性
//!
//! - **统一创建接口** - 通过层描述符创建各种存储层
//! - **构造期能力解析** - 标签删除能力在创建句柄时绑定
//! - **顺序装配** - `TieredCache::from_config`按描述符顺序装配，跳过禁用层

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::{CacheronConfig, LayerConfig};
use crate::error::CacheronError;
use crate::layer::LayerHandle;
use crate::memory_layer::{MemoryLayer, MemoryLayerConfig};
use crate::tiered::TieredCache;

#[cfg(feature = "filesystem")]
use crate::fs_layer::{FilesystemLayer, FilesystemLayerConfig};
#[cfg(feature = "redis")]
use crate::redis_layer::{RedisLayer, RedisLayerConfig};

/// 层工厂
///
/// # 示例
///
/// ```rust
/// use cacheron::config::LayerConfig;
/// use cacheron::eviction::EvictionPolicy;
/// use cacheron::factory::LayerFactory;
///
/// # #[tokio::main]
/// # async fn main() {
/// let config = LayerConfig::Memory {
///     enabled: true,
///     name: Some("hot".to_string()),
///     max_entries: Some(1000),
///     default_ttl_ms: Some(60_000),
///     eviction_policy: EvictionPolicy::Recency,
/// };
/// let handle = LayerFactory::create::<String>(&config, 0).await.unwrap();
/// assert_eq!(handle.name(), "hot");
/// # }
/// ```
pub struct LayerFactory;

impl LayerFactory {
    /// 从层描述符创建层句柄
    ///
    /// `index`用于缺省层名生成。内存层和文件系统层绑定标签删除能力，
    /// Redis层不具备该能力。
    pub async fn create<V>(
        config: &LayerConfig,
        index: usize,
    ) -> Result<LayerHandle<V>, CacheronError>
    where
        V: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
    {
        let name = config.layer_name(index);

        match config {
            LayerConfig::Memory {
                max_entries,
                default_ttl_ms,
                eviction_policy,
                ..
            } => {
                let mut layer_config = MemoryLayerConfig::new().eviction_policy(*eviction_policy);
                if let Some(max_entries) = max_entries {
                    layer_config = layer_config.max_entries(*max_entries);
                }
                if let Some(ttl_ms) = default_ttl_ms {
                    layer_config = layer_config.default_ttl(Duration::from_millis(*ttl_ms));
                }

                let layer = Arc::new(MemoryLayer::<V>::new(layer_config));
                Ok(LayerHandle::with_tags(name, layer.clone(), layer))
            }
            #[cfg(feature = "filesystem")]
            LayerConfig::Filesystem {
                path,
                default_ttl_ms,
                ..
            } => {
                let mut layer_config = FilesystemLayerConfig::new(path);
                if let Some(ttl_ms) = default_ttl_ms {
                    layer_config = layer_config.default_ttl(Duration::from_millis(*ttl_ms));
                }

                let layer = Arc::new(FilesystemLayer::<V>::new(layer_config)?);
                Ok(LayerHandle::with_tags(name, layer.clone(), layer))
            }
            #[cfg(feature = "redis")]
            LayerConfig::Redis {
                url,
                key_prefix,
                default_ttl_ms,
                ..
            } => {
                let mut layer_config = RedisLayerConfig::new(url.clone());
                if let Some(prefix) = key_prefix {
                    layer_config = layer_config.key_prefix(prefix.clone());
                }
                if let Some(ttl_ms) = default_ttl_ms {
                    layer_config = layer_config.default_ttl(Duration::from_millis(*ttl_ms));
                }

                let layer = Arc::new(RedisLayer::<V>::new(layer_config).await?);
                Ok(LayerHandle::new(name, layer))
            }
        }
    }
}

/// 组合器构建器
///
/// 手工装配层句柄链的入口，句柄按加入顺序排列（最快的层先加入）。
pub struct TieredCacheBuilder<V>
where
    V: Clone + Send + Sync + 'static,
{
    layers: Vec<LayerHandle<V>>,
    analytics_enabled: bool,
}

impl<V> TieredCacheBuilder<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            analytics_enabled: true,
        }
    }

    /// 追加一层（快到慢的顺序）
    pub fn layer(mut self, handle: LayerHandle<V>) -> Self {
        self.layers.push(handle);
        self
    }

    /// 设置是否启用命中/未命中统计
    pub fn analytics_enabled(mut self, enabled: bool) -> Self {
        self.analytics_enabled = enabled;
        self
    }

    /// 构建组合器
    pub fn build(self) -> Result<TieredCache<V>, CacheronError> {
        TieredCache::new(self.layers, self.analytics_enabled)
    }
}

impl<V> Default for TieredCacheBuilder<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> TieredCache<V>
where
    V: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    /// 从配置装配组合器
    ///
    /// 按描述符顺序创建启用的层，禁用的层跳过不计。
    pub async fn from_config(config: &CacheronConfig) -> Result<Self, CacheronError> {
        config.validate().map_err(CacheronError::ConfigError)?;

        let mut layers = Vec::new();
        for (index, layer_config) in config.layers.iter().enumerate() {
            if !layer_config.enabled() {
                debug!("跳过禁用层: {}", layer_config.layer_name(index));
                continue;
            }
            layers.push(LayerFactory::create(layer_config, index).await?);
        }

        TieredCache::new(layers, config.analytics_enabled)
    }
}
