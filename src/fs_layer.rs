//! 文件系统层实现
//!
//! 每个键一条记录：文件名取键的确定性非加密64位哈希的十六进制，
//! 内容为serde_json序列化的记录（原始键 + 条目元数据 + 值）。
//!
//! # 特性
//!
//! - **损坏容忍**: 无法解析的记录视为未命中，从不致命
//! - **惰性过期**: 过期记录在读取时删除
//! - **计数回写**: 命中时把更新后的访问统计写回记录
//! - **标签删除**: 扫描目录内全部记录
//!
//! 文件名是哈希值，记录里保存原始键；哈希碰撞时记录键与请求键
//! 不一致，按未命中处理。

use ahash::RandomState;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::hash::{BuildHasher, Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

use crate::constants::DEFAULT_TTL_SECS;
use crate::entry::{CacheEntry, SetOptions};
use crate::error::CacheronError;
use crate::layer::{CacheLayer, TagInvalidation};
use crate::stats::{LayerStats, LayerStatsRecorder};

/// 文件名哈希种子，固定值保证重启后同一键映射到同一文件
const HASH_SEEDS: (u64, u64, u64, u64) = (
    0x9e37_79b9_7f4a_7c15,
    0x6a09_e667_f3bc_c909,
    0xbb67_ae85_84ca_a73b,
    0x3c6e_f372_fe94_f82b,
);

/// 记录文件扩展名
const RECORD_EXTENSION: &str = "json";

/// 文件系统层配置
#[derive(Debug, Clone)]
pub struct FilesystemLayerConfig {
    /// 记录目录
    pub path: PathBuf,
    /// 默认TTL
    pub default_ttl: Option<Duration>,
}

impl FilesystemLayerConfig {
    /// 创建新的文件系统层配置
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            default_ttl: Some(Duration::from_secs(DEFAULT_TTL_SECS)),
        }
    }

    /// 设置默认TTL
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }
}

/// 磁盘记录：原始键 + 条目
#[derive(Debug, Serialize, Deserialize)]
struct FileRecord<V> {
    key: String,
    entry: CacheEntry<V>,
}

/// 文件系统层实现
pub struct FilesystemLayer<V> {
    config: FilesystemLayerConfig,
    hasher: RandomState,
    stats: LayerStatsRecorder,
    _marker: std::marker::PhantomData<fn() -> V>,
}

impl<V> FilesystemLayer<V>
where
    V: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    /// 创建新的文件系统层
    ///
    /// 记录目录不存在时创建。
    pub fn new(config: FilesystemLayerConfig) -> Result<Self, CacheronError> {
        std::fs::create_dir_all(&config.path)?;
        Ok(Self {
            config,
            hasher: RandomState::with_seeds(
                HASH_SEEDS.0,
                HASH_SEEDS.1,
                HASH_SEEDS.2,
                HASH_SEEDS.3,
            ),
            stats: LayerStatsRecorder::new(),
            _marker: std::marker::PhantomData,
        })
    }

    /// 获取配置
    pub fn config(&self) -> &FilesystemLayerConfig {
        &self.config
    }

    fn record_path(&self, key: &str) -> PathBuf {
        let mut hasher = self.hasher.build_hasher();
        key.hash(&mut hasher);
        self.config
            .path
            .join(format!("{:016x}.{}", hasher.finish(), RECORD_EXTENSION))
    }

    fn effective_ttl(&self, options: &SetOptions) -> Duration {
        options
            .ttl
            .or(self.config.default_ttl)
            .unwrap_or(Duration::from_secs(DEFAULT_TTL_SECS))
    }

    /// 读取记录，损坏的记录视为不存在
    async fn read_record(&self, path: &Path) -> Option<FileRecord<V>> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("读取缓存记录失败: path={}, error={}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("缓存记录损坏，视为未命中: path={}, error={}", path.display(), e);
                let _ = tokio::fs::remove_file(path).await;
                None
            }
        }
    }

    /// 写入记录，失败时静默跳过
    async fn write_record(&self, path: &Path, record: &FileRecord<V>) {
        let bytes = match serde_json::to_vec(record) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("序列化缓存记录失败: key={}, error={}", record.key, e);
                return;
            }
        };

        if let Err(e) = tokio::fs::write(path, bytes).await {
            warn!("写入缓存记录失败: path={}, error={}", path.display(), e);
        }
    }

    /// 遍历目录内的全部记录文件
    async fn record_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        let mut dir = match tokio::fs::read_dir(&self.config.path).await {
            Ok(dir) => dir,
            Err(e) => {
                warn!("读取缓存目录失败: path={}, error={}", self.config.path.display(), e);
                return files;
            }
        };

        while let Ok(Some(dir_entry)) = dir.next_entry().await {
            let path = dir_entry.path();
            if path.extension().map(|ext| ext == RECORD_EXTENSION) == Some(true) {
                files.push(path);
            }
        }
        files
    }
}

#[async_trait]
impl<V> CacheLayer<V> for FilesystemLayer<V>
where
    V: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    async fn get(&self, key: &str) -> Option<V> {
        let started = Instant::now();
        let path = self.record_path(key);

        let mut record = match self.read_record(&path).await {
            Some(record) if record.key == key => record,
            Some(_) => {
                // 哈希碰撞，记录属于别的键
                self.stats.record_miss(started.elapsed());
                return None;
            }
            None => {
                self.stats.record_miss(started.elapsed());
                return None;
            }
        };

        if record.entry.is_expired() {
            let _ = tokio::fs::remove_file(&path).await;
            trace!("惰性过期移除: key={}", key);
            self.stats.record_miss(started.elapsed());
            return None;
        }

        record.entry.record_access();
        let value = record.entry.value.clone();
        // 访问统计回写，失败不影响本次命中
        self.write_record(&path, &record).await;

        self.stats.record_hit(started.elapsed());
        Some(value)
    }

    async fn set(&self, key: &str, value: V, options: &SetOptions) {
        let ttl = self.effective_ttl(options);
        let record = FileRecord {
            key: key.to_string(),
            entry: CacheEntry::new(value, ttl, options.tag_set()),
        };
        self.write_record(&self.record_path(key), &record).await;
    }

    async fn delete(&self, key: &str) -> bool {
        let path = self.record_path(key);

        // 碰撞保护：只删除确实属于该键的记录
        match self.read_record(&path).await {
            Some(record) if record.key == key => tokio::fs::remove_file(&path).await.is_ok(),
            _ => false,
        }
    }

    async fn clear(&self) {
        for path in self.record_files().await {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                warn!("清空缓存记录失败: path={}, error={}", path.display(), e);
            }
        }
    }

    async fn has(&self, key: &str) -> bool {
        let path = self.record_path(key);
        match self.read_record(&path).await {
            Some(record) if record.key == key => {
                if record.entry.is_expired() {
                    let _ = tokio::fs::remove_file(&path).await;
                    false
                } else {
                    true
                }
            }
            _ => false,
        }
    }

    async fn keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        for path in self.record_files().await {
            if let Some(record) = self.read_record(&path).await {
                keys.push(record.key);
            }
        }
        keys
    }

    async fn size(&self) -> usize {
        self.record_files().await.len()
    }

    async fn stats(&self) -> LayerStats {
        let size = self.record_files().await.len();
        self.stats.snapshot(size)
    }
}

#[async_trait]
impl<V> TagInvalidation for FilesystemLayer<V>
where
    V: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    async fn delete_by_tag(&self, tag: &str) -> usize {
        let mut count = 0;
        for path in self.record_files().await {
            if let Some(record) = self.read_record(&path).await {
                if record.entry.tags.contains(tag) && tokio::fs::remove_file(&path).await.is_ok() {
                    count += 1;
                }
            }
        }

        debug!("按标签删除: tag={}, count={}", tag, count);
        count
    }
}
