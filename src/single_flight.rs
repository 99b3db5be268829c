//! 单飞加载器
//!
//! 同一键的并发加载合并为一次实际加载：首个调用者执行加载并回填，
//! 其余并发调用者等待同一个在途结果。

use dashmap::DashMap;
use tokio::sync::watch;
use tracing::trace;

use crate::error::StorageError;

/// 单飞加载器
pub struct SingleFlightLoader<V> {
    /// 加载中的任务: key -> sender
    pending: DashMap<String, watch::Sender<Option<Result<V, StorageError>>>>,
}

impl<V> SingleFlightLoader<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
        }
    }

    /// 尝试获取已存在的加载任务，或创建新的
    pub async fn get_or_load<F, Fut>(&self, key: &str, loader: F) -> Result<V, StorageError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<V, StorageError>>,
    {
        use dashmap::mapref::entry::Entry;

        // 尝试插入新任务或获取现有任务
        let tx = match self.pending.entry(key.to_string()) {
            Entry::Occupied(entry) => {
                // 已有其他请求在加载，等待结果
                trace!("等待其他请求加载 key={}", key);
                let tx = entry.get();
                let mut rx = tx.subscribe();
                drop(entry); // 释放锁

                // 检查当前值
                if let Some(res) = rx.borrow().clone() {
                    return res;
                }

                // 等待变更
                if rx.changed().await.is_ok() {
                    if let Some(res) = rx.borrow().clone() {
                        return res;
                    }
                }

                return Err(StorageError::TimeoutError(
                    "Loader dropped without result".to_string(),
                ));
            }
            Entry::Vacant(entry) => {
                // 创建新任务
                let (tx, _) = watch::channel(None);
                entry.insert(tx.clone());
                tx
            }
        };

        // 执行加载
        let result = loader().await;

        // 通知等待者
        let _ = tx.send(Some(result.clone()));

        // 清理单飞条目
        self.pending.remove(key);

        result
    }
}

impl<V> Default for SingleFlightLoader<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
