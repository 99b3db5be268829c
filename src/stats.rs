//! 统计信息
//!
//! 层级统计（命中/未命中计数 + 访问延迟滑动窗口）和全局聚合统计。
//! 统计为派生数据，持续重算，从不持久化。

use ahash::AHashMap;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::constants::STATS_WINDOW_SIZE;

/// 层级统计快照
#[derive(Debug, Clone, Default, Serialize)]
pub struct LayerStats {
    /// 命中次数
    pub hits: u64,
    /// 未命中次数
    pub misses: u64,
    /// 当前条目数
    pub size: usize,
    /// 平均访问延迟（毫秒）
    pub avg_access_time_ms: f64,
}

/// 层级统计记录器
///
/// 每次`get`记录一次命中或未命中以及一个访问延迟样本；
/// 只保留最近100个样本（滑动窗口，最旧的先丢弃），
/// `avg_access_time_ms`是窗口内样本的算术平均。
#[derive(Debug, Default)]
pub struct LayerStatsRecorder {
    hits: AtomicU64,
    misses: AtomicU64,
    samples: Mutex<VecDeque<f64>>,
}

impl LayerStatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录命中
    pub fn record_hit(&self, elapsed: Duration) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        self.record_sample(elapsed);
    }

    /// 记录未命中
    pub fn record_miss(&self, elapsed: Duration) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        self.record_sample(elapsed);
    }

    fn record_sample(&self, elapsed: Duration) {
        let mut samples = self.samples.lock();
        if samples.len() >= STATS_WINDOW_SIZE {
            samples.pop_front();
        }
        samples.push_back(elapsed.as_secs_f64() * 1000.0);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// 窗口内的平均访问延迟（毫秒）
    pub fn avg_access_time_ms(&self) -> f64 {
        let samples = self.samples.lock();
        if samples.is_empty() {
            0.0
        } else {
            samples.iter().sum::<f64>() / samples.len() as f64
        }
    }

    /// 生成统计快照
    pub fn snapshot(&self, size: usize) -> LayerStats {
        LayerStats {
            hits: self.hits(),
            misses: self.misses(),
            size,
            avg_access_time_ms: self.avg_access_time_ms(),
        }
    }

    /// 重置统计
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.samples.lock().clear();
    }
}

/// 全局聚合统计
#[derive(Debug, Clone, Default, Serialize)]
pub struct GlobalStats {
    /// 命中次数
    pub hits: u64,
    /// 未命中次数
    pub misses: u64,
    /// 写入次数
    pub sets: u64,
    /// 删除次数
    pub deletes: u64,
    /// 命中率（无请求时为0）
    pub hit_rate: f64,
    /// 总请求次数
    pub total_requests: u64,
    /// 各层统计
    pub per_layer: AHashMap<String, LayerStats>,
}
