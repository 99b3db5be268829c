//! Redis层实现
//!
//! 基于Redis的远端存储层，带键前缀隔离、指数退避重试和降级标记。
//!
//! # 特性
//!
//! - **连接池**: 使用ConnectionManager管理连接
//! - **重试机制**: 指数退避重试，连接错误时尝试重连
//! - **降级机制**: Redis故障时标记降级，读取按未命中、写入按空操作处理
//! - **PX过期**: 条目TTL直接映射到Redis的毫秒级过期
//! - **SCAN遍历**: 键列举和清空只触及本层前缀下的键
//!
//! 本层不维护标签索引，不提供按标签删除能力；组合器按构造期
//! 能力解析自动跳过它。

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::constants::{
    DEFAULT_CONNECTION_TIMEOUT_SECS, DEFAULT_INITIAL_BACKOFF_MS, DEFAULT_MAX_RETRIES,
    DEFAULT_REDIS_KEY_PREFIX, DEFAULT_TTL_SECS, REDIS_SCAN_COUNT,
};
use crate::entry::SetOptions;
use crate::error::StorageError;
use crate::layer::CacheLayer;
use crate::stats::{LayerStats, LayerStatsRecorder};

/// Redis层配置
#[derive(Clone)]
pub struct RedisLayerConfig {
    /// Redis连接URL
    pub url: String,
    /// 数据库索引
    pub db: i64,
    /// 密码（使用 Secret 包装以防止意外泄露）
    pub password: Option<Secret<String>>,
    /// 键前缀
    pub key_prefix: String,
    /// 默认TTL
    pub default_ttl: Option<Duration>,
    /// 连接超时
    pub connection_timeout: Duration,
    /// 最大重试次数
    pub max_retries: u32,
    /// 重试初始退避时间
    pub retry_initial_backoff: Duration,
}

impl std::fmt::Debug for RedisLayerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisLayerConfig")
            .field("url", &self.url)
            .field("db", &self.db)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("key_prefix", &self.key_prefix)
            .field("default_ttl", &self.default_ttl)
            .field("connection_timeout", &self.connection_timeout)
            .field("max_retries", &self.max_retries)
            .field("retry_initial_backoff", &self.retry_initial_backoff)
            .finish()
    }
}

impl Default for RedisLayerConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            db: 0,
            password: None,
            key_prefix: DEFAULT_REDIS_KEY_PREFIX.to_string(),
            default_ttl: Some(Duration::from_secs(DEFAULT_TTL_SECS)),
            connection_timeout: Duration::from_secs(DEFAULT_CONNECTION_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_initial_backoff: Duration::from_millis(DEFAULT_INITIAL_BACKOFF_MS),
        }
    }
}

impl RedisLayerConfig {
    /// 创建新的Redis层配置
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// 设置数据库索引
    pub fn db(mut self, db: i64) -> Self {
        self.db = db;
        self
    }

    /// 设置密码
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(Secret::new(password.into()));
        self
    }

    /// 设置键前缀
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// 设置默认TTL
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// 设置最大重试次数
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// 设置重试初始退避时间
    pub fn retry_initial_backoff(mut self, backoff: Duration) -> Self {
        self.retry_initial_backoff = backoff;
        self
    }
}

/// Redis层实现
pub struct RedisLayer<V> {
    /// 连接管理器
    conn_manager: Mutex<Option<ConnectionManager>>,
    /// 配置
    config: RedisLayerConfig,
    /// 统计信息
    stats: LayerStatsRecorder,
    /// 降级状态
    degraded: AtomicBool,
    _marker: std::marker::PhantomData<fn() -> V>,
}

impl<V> RedisLayer<V>
where
    V: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    /// 创建新的Redis层
    pub async fn new(config: RedisLayerConfig) -> Result<Self, StorageError> {
        info!("创建Redis层, URL: {}", config.url);

        let layer = Self {
            conn_manager: Mutex::new(None),
            config,
            stats: LayerStatsRecorder::new(),
            degraded: AtomicBool::new(false),
            _marker: std::marker::PhantomData,
        };

        layer.connect().await?;

        info!("Redis层创建成功");
        Ok(layer)
    }

    /// 获取配置
    pub fn config(&self) -> &RedisLayerConfig {
        &self.config
    }

    /// 检查是否降级
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }

    /// 检查Redis连接
    pub async fn ping(&self) -> Result<(), StorageError> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }

    /// 建立连接
    async fn connect(&self) -> Result<(), StorageError> {
        debug!("建立Redis连接");

        // 使用安全的 ConnectionInfo 来处理认证
        let url = self.config.url.trim_start_matches("redis://");
        let url = url.trim_start_matches("rediss://");
        let url = if let Some(at_pos) = url.find('@') {
            &url[at_pos + 1..]
        } else {
            url
        };

        let (host, port) = if let Some(colon_pos) = url.rfind(':') {
            let host = &url[..colon_pos];
            let port = url[colon_pos + 1..].parse::<u16>().unwrap_or(6379);
            (host.to_string(), port)
        } else {
            (url.to_string(), 6379)
        };

        let client_info = redis::ConnectionInfo {
            addr: redis::ConnectionAddr::Tcp(host, port),
            redis: redis::RedisConnectionInfo {
                db: self.config.db,
                username: None,
                password: self
                    .config
                    .password
                    .as_ref()
                    .map(|p| p.expose_secret().clone()),
            },
        };

        let client = Client::open(client_info).map_err(|e| {
            error!("创建Redis客户端失败: {}", e);
            StorageError::ConnectionError(format!("创建Redis客户端失败: {}", e))
        })?;

        let conn_manager = tokio::time::timeout(
            self.config.connection_timeout,
            ConnectionManager::new(client),
        )
        .await
        .map_err(|_| StorageError::TimeoutError("Redis连接超时".to_string()))?
        .map_err(|e| {
            error!("创建Redis连接管理器失败: {}", e);
            StorageError::ConnectionError(format!("创建Redis连接管理器失败: {}", e))
        })?;

        *self.conn_manager.lock().await = Some(conn_manager);
        self.degraded.store(false, Ordering::Relaxed);

        info!("Redis连接建立成功");
        Ok(())
    }

    async fn connection(&self) -> Result<ConnectionManager, StorageError> {
        self.conn_manager
            .lock()
            .await
            .as_ref()
            .cloned()
            .ok_or_else(|| StorageError::ConnectionError("连接未初始化".to_string()))
    }

    /// 带重试的执行
    async fn execute_with_retry<F, Fut, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, StorageError>>,
    {
        let mut last_error = None;
        let mut backoff = self.config.retry_initial_backoff;

        for attempt in 0..=self.config.max_retries {
            match f().await {
                Ok(result) => {
                    if attempt > 0 {
                        debug!("重试成功，尝试次数: {}", attempt);
                    }
                    self.degraded.store(false, Ordering::Relaxed);
                    return Ok(result);
                }
                Err(e) => {
                    last_error = Some(e.clone());

                    if attempt < self.config.max_retries {
                        warn!(
                            "Redis操作失败，将在 {:?} 后重试 (尝试 {}/{}): {}",
                            backoff,
                            attempt + 1,
                            self.config.max_retries,
                            e
                        );
                        tokio::time::sleep(backoff).await;
                        backoff = backoff.mul_f32(2.0); // 指数退避

                        if matches!(e, StorageError::ConnectionError(_)) {
                            if let Err(reconnect_err) = self.connect().await {
                                error!("重新连接失败: {}", reconnect_err);
                            }
                        }
                    }
                }
            }
        }

        self.degraded.store(true, Ordering::Relaxed);
        warn!("Redis操作失败，已达最大重试次数，标记降级");
        Err(last_error
            .unwrap_or_else(|| StorageError::QueryError("重试次数耗尽".to_string())))
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{}", self.config.key_prefix, key)
    }

    fn strip_prefix(&self, key: &str) -> String {
        key.strip_prefix(&self.config.key_prefix)
            .unwrap_or(key)
            .to_string()
    }

    async fn try_get(&self, key: &str) -> Result<Option<V>, StorageError> {
        let redis_key = self.prefixed(key);
        let payload: Option<String> = self
            .execute_with_retry(|| async {
                let mut conn = self.connection().await?;
                conn.get(&redis_key).await.map_err(StorageError::from)
            })
            .await?;

        match payload {
            Some(payload) => match serde_json::from_str(&payload) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    // 记录损坏按未命中处理
                    warn!("Redis记录损坏，视为未命中: key={}, error={}", key, e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    async fn try_set(&self, key: &str, value: &V, options: &SetOptions) -> Result<(), StorageError> {
        let payload = serde_json::to_string(value)?;
        let ttl = options
            .ttl
            .or(self.config.default_ttl)
            .unwrap_or(Duration::from_secs(DEFAULT_TTL_SECS));
        let ttl_ms = (ttl.as_millis() as u64).max(1);
        let redis_key = self.prefixed(key);

        self.execute_with_retry(|| async {
            let mut conn = self.connection().await?;
            let _: () = redis::cmd("SET")
                .arg(&redis_key)
                .arg(&payload)
                .arg("PX")
                .arg(ttl_ms)
                .query_async(&mut conn)
                .await
                .map_err(StorageError::from)?;
            Ok(())
        })
        .await
    }

    /// SCAN遍历本层前缀下的全部键
    async fn scan_keys(&self) -> Result<Vec<String>, StorageError> {
        let pattern = format!("{}*", self.config.key_prefix);

        self.execute_with_retry(|| async {
            let mut conn = self.connection().await?;
            let mut keys = Vec::new();
            let mut cursor: u64 = 0;

            loop {
                let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                    .arg(cursor)
                    .arg("MATCH")
                    .arg(&pattern)
                    .arg("COUNT")
                    .arg(REDIS_SCAN_COUNT)
                    .query_async(&mut conn)
                    .await
                    .map_err(StorageError::from)?;

                keys.extend(batch);
                cursor = next;
                if cursor == 0 {
                    break;
                }
            }

            Ok(keys)
        })
        .await
    }
}

#[async_trait]
impl<V> CacheLayer<V> for RedisLayer<V>
where
    V: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    async fn get(&self, key: &str) -> Option<V> {
        let started = Instant::now();
        match self.try_get(key).await {
            Ok(Some(value)) => {
                self.stats.record_hit(started.elapsed());
                Some(value)
            }
            Ok(None) => {
                self.stats.record_miss(started.elapsed());
                None
            }
            Err(e) => {
                warn!("Redis读取失败，视为未命中: key={}, error={}", key, e);
                self.stats.record_miss(started.elapsed());
                None
            }
        }
    }

    async fn set(&self, key: &str, value: V, options: &SetOptions) {
        if let Err(e) = self.try_set(key, &value, options).await {
            warn!("Redis写入失败，静默跳过: key={}, error={}", key, e);
        }
    }

    async fn delete(&self, key: &str) -> bool {
        let redis_key = self.prefixed(key);
        let result = self
            .execute_with_retry(|| async {
                let mut conn = self.connection().await?;
                let deleted: i64 = conn.del(&redis_key).await.map_err(StorageError::from)?;
                Ok(deleted)
            })
            .await;

        match result {
            Ok(deleted) => deleted > 0,
            Err(e) => {
                warn!("Redis删除失败，静默跳过: key={}, error={}", key, e);
                false
            }
        }
    }

    async fn clear(&self) {
        let keys = match self.scan_keys().await {
            Ok(keys) => keys,
            Err(e) => {
                warn!("Redis清空失败，静默跳过: error={}", e);
                return;
            }
        };

        if keys.is_empty() {
            return;
        }

        let result = self
            .execute_with_retry(|| async {
                let mut conn = self.connection().await?;
                let _: () = conn.del(&keys).await.map_err(StorageError::from)?;
                Ok(())
            })
            .await;

        if let Err(e) = result {
            warn!("Redis清空失败，静默跳过: error={}", e);
        }
    }

    async fn has(&self, key: &str) -> bool {
        let redis_key = self.prefixed(key);
        let result = self
            .execute_with_retry(|| async {
                let mut conn = self.connection().await?;
                let exists: bool = conn.exists(&redis_key).await.map_err(StorageError::from)?;
                Ok(exists)
            })
            .await;

        result.unwrap_or(false)
    }

    async fn keys(&self) -> Vec<String> {
        match self.scan_keys().await {
            Ok(keys) => keys.iter().map(|k| self.strip_prefix(k)).collect(),
            Err(e) => {
                warn!("Redis键列举失败: error={}", e);
                Vec::new()
            }
        }
    }

    async fn size(&self) -> usize {
        match self.scan_keys().await {
            Ok(keys) => keys.len(),
            Err(_) => 0,
        }
    }

    async fn stats(&self) -> LayerStats {
        let size = self.size().await;
        self.stats.snapshot(size)
    }
}
