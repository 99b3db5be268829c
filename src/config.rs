//! 配置模块
//!
//! 定义多层缓存的配置结构：有序的层描述符列表（快到慢）加全局开关。
//! 支持JSON/YAML/TOML三种格式加载。

use serde::{Deserialize, Serialize};
use std::path::Path;
#[cfg(feature = "filesystem")]
use std::path::PathBuf;

use crate::error::CacheronError;
use crate::eviction::EvictionPolicy;

fn default_enabled() -> bool {
    true
}

fn default_analytics() -> bool {
    true
}

/// 多层缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheronConfig {
    /// 是否启用命中/未命中统计
    #[serde(default = "default_analytics")]
    pub analytics_enabled: bool,
    /// 有序的层描述符列表，最快的层在前
    pub layers: Vec<LayerConfig>,
}

impl Default for CacheronConfig {
    fn default() -> Self {
        Self {
            analytics_enabled: true,
            layers: vec![LayerConfig::Memory {
                enabled: true,
                name: None,
                max_entries: None,
                default_ttl_ms: None,
                eviction_policy: EvictionPolicy::default(),
            }],
        }
    }
}

impl CacheronConfig {
    /// 校验配置
    pub fn validate(&self) -> Result<(), String> {
        if self.layers.is_empty() {
            return Err("至少需要一个层描述符".to_string());
        }

        if !self.layers.iter().any(|layer| layer.enabled()) {
            return Err("至少需要一个启用的层".to_string());
        }

        for (index, layer) in self.layers.iter().enumerate() {
            layer
                .validate()
                .map_err(|e| format!("层[{}]校验失败: {}", index, e))?;
        }

        Ok(())
    }

    /// 从JSON字符串加载
    pub fn from_json_str(content: &str) -> Result<Self, CacheronError> {
        Ok(serde_json::from_str(content)?)
    }

    /// 从YAML字符串加载
    pub fn from_yaml_str(content: &str) -> Result<Self, CacheronError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// 从TOML字符串加载
    pub fn from_toml_str(content: &str) -> Result<Self, CacheronError> {
        Ok(toml::from_str(content)?)
    }

    /// 从文件加载，按扩展名分派格式
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CacheronError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            Some("toml") => Self::from_toml_str(&content),
            other => Err(CacheronError::ConfigError(format!(
                "不支持的配置文件格式: {:?}",
                other
            ))),
        }
    }
}

/// 层描述符
///
/// `backend`字段区分后端类型；`enabled: false`的层在装配时被跳过，
/// 不影响其余层的顺序。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum LayerConfig {
    /// 进程内有界层
    Memory {
        #[serde(default = "default_enabled")]
        enabled: bool,
        /// 层名称（统计聚合的键，缺省按序号生成）
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        max_entries: Option<usize>,
        #[serde(default)]
        default_ttl_ms: Option<u64>,
        #[serde(default)]
        eviction_policy: EvictionPolicy,
    },
    /// 文件系统层
    #[cfg(feature = "filesystem")]
    Filesystem {
        #[serde(default = "default_enabled")]
        enabled: bool,
        #[serde(default)]
        name: Option<String>,
        /// 记录目录
        path: PathBuf,
        #[serde(default)]
        default_ttl_ms: Option<u64>,
    },
    /// Redis层
    #[cfg(feature = "redis")]
    Redis {
        #[serde(default = "default_enabled")]
        enabled: bool,
        #[serde(default)]
        name: Option<String>,
        /// Redis连接URL
        url: String,
        #[serde(default)]
        key_prefix: Option<String>,
        #[serde(default)]
        default_ttl_ms: Option<u64>,
    },
}

impl LayerConfig {
    /// 层是否启用
    pub fn enabled(&self) -> bool {
        match self {
            LayerConfig::Memory { enabled, .. } => *enabled,
            #[cfg(feature = "filesystem")]
            LayerConfig::Filesystem { enabled, .. } => *enabled,
            #[cfg(feature = "redis")]
            LayerConfig::Redis { enabled, .. } => *enabled,
        }
    }

    /// 层名称，缺省按后端类型和序号生成
    pub fn layer_name(&self, index: usize) -> String {
        let (name, kind) = match self {
            LayerConfig::Memory { name, .. } => (name, "memory"),
            #[cfg(feature = "filesystem")]
            LayerConfig::Filesystem { name, .. } => (name, "filesystem"),
            #[cfg(feature = "redis")]
            LayerConfig::Redis { name, .. } => (name, "redis"),
        };
        name.clone().unwrap_or_else(|| format!("{}-{}", kind, index))
    }

    /// 校验层描述符
    pub fn validate(&self) -> Result<(), String> {
        match self {
            LayerConfig::Memory {
                max_entries,
                default_ttl_ms,
                ..
            } => {
                if *max_entries == Some(0) {
                    return Err("max_entries不能为0".to_string());
                }
                if *default_ttl_ms == Some(0) {
                    return Err("default_ttl_ms不能为0".to_string());
                }
                Ok(())
            }
            #[cfg(feature = "filesystem")]
            LayerConfig::Filesystem {
                path,
                default_ttl_ms,
                ..
            } => {
                if path.as_os_str().is_empty() {
                    return Err("path不能为空".to_string());
                }
                if *default_ttl_ms == Some(0) {
                    return Err("default_ttl_ms不能为0".to_string());
                }
                Ok(())
            }
            #[cfg(feature = "redis")]
            LayerConfig::Redis {
                url,
                default_ttl_ms,
                ..
            } => {
                if url.is_empty() {
                    return Err("url不能为空".to_string());
                }
                if *default_ttl_ms == Some(0) {
                    return Err("default_ttl_ms不能为0".to_string());
                }
                Ok(())
            }
        }
    }
}
