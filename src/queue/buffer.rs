//! 消息缓冲队列
//!
//! 线程安全的先进先出队列，保存待合并发送的消息片段

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// 合并消息时片段之间的分隔符
pub const SEPARATOR: &str = "\n\n";

/// 队列中的消息片段
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueEntry {
    pub title: String,
    pub content: String,
}

/// 消息缓冲队列
#[derive(Debug)]
pub struct MessageQueue {
    /// 默认标题
    default_title: String,
    entries: Mutex<VecDeque<QueueEntry>>,
}

impl MessageQueue {
    pub fn new(default_title: impl Into<String>) -> Self {
        Self {
            default_title: default_title.into(),
            entries: Mutex::new(VecDeque::new()),
        }
    }

    pub fn default_title(&self) -> &str {
        &self.default_title
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<QueueEntry>> {
        // 锁内只有入队出队操作，中毒后队列依然一致
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 使用默认标题入队
    pub fn push(&self, content: impl Into<String>) {
        self.push_with_title("", content);
    }

    /// 使用指定标题入队，标题为空时使用默认标题
    pub fn push_with_title(&self, title: impl Into<String>, content: impl Into<String>) {
        let mut title = title.into();
        if title.is_empty() {
            title = self.default_title.clone();
        }
        self.push_entry(QueueEntry {
            title,
            content: content.into(),
        });
    }

    /// 原样入队
    pub fn push_entry(&self, entry: QueueEntry) {
        self.lock().push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// 取出队列中的消息并拼接为一条内容
    ///
    /// `limit` 为 0 时清空队列。大于 0 时最多执行 `limit` 轮，每一轮都会清空
    /// 当前队列；由于整个过程持有锁，第一轮之后队列必然为空，`limit` 并不限制条目数。
    pub fn drain_batch(&self, limit: u32) -> String {
        let mut entries = self.lock();
        let mut batch = String::new();

        if limit == 0 {
            while let Some(entry) = entries.pop_front() {
                batch.push_str(&entry.content);
                batch.push_str(SEPARATOR);
            }
        } else {
            for _ in 0..limit {
                if entries.is_empty() {
                    break;
                }
                while let Some(entry) = entries.pop_front() {
                    batch.push_str(&entry.content);
                    batch.push_str(SEPARATOR);
                }
            }
        }

        batch
    }
}
