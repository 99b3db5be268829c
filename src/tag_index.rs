//! 标签索引
//!
//! 标签到成员键集合的反向映射，由支持按标签删除的层维护。
//! 尽力而为：某个标签没有索引项等价于"无成员"，不是错误。

use ahash::{AHashMap, AHashSet};

/// 标签索引
#[derive(Debug, Default)]
pub struct TagIndex {
    index: AHashMap<String, AHashSet<String>>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记键的标签集合
    pub fn insert(&mut self, key: &str, tags: &AHashSet<String>) {
        for tag in tags {
            self.index
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string());
        }
    }

    /// 移除键在给定标签集合下的登记
    ///
    /// 标签下的成员集合清空后整项移除。
    pub fn remove(&mut self, key: &str, tags: &AHashSet<String>) {
        for tag in tags {
            if let Some(members) = self.index.get_mut(tag) {
                members.remove(key);
                if members.is_empty() {
                    self.index.remove(tag);
                }
            }
        }
    }

    /// 标签的成员键集合
    pub fn members(&self, tag: &str) -> Option<&AHashSet<String>> {
        self.index.get(tag)
    }

    /// 索引的标签数
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// 清空索引
    pub fn clear(&mut self) {
        self.index.clear();
    }
}
