//! 消息队列模块
//!
//! 以队列方式发送消息：多次推送的消息按间隔合并为一条markdown消息发送

pub mod buffer;
pub mod fallback;
pub mod scheduler;

use crate::config::QueueConfig;
use crate::error::DingError;
use crate::notification::{Credentials, DingTalkSender, MessageSender};
use std::sync::Arc;

// 重新导出主要类型
pub use buffer::{MessageQueue, QueueEntry, SEPARATOR};
pub use fallback::{FallbackNotifier, FALLBACK_NOTICE};
pub use scheduler::BatchScheduler;

/// 队列参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueOptions {
    /// 合并消息的标题
    pub title: String,
    /// 发送间隔（秒），最小为1
    pub interval_seconds: u64,
    /// 每次发送的轮数限制，0 为不限制
    pub limit: u32,
}

impl QueueOptions {
    pub fn new(title: impl Into<String>, interval_seconds: u64, limit: u32) -> Self {
        Self {
            title: title.into(),
            interval_seconds: interval_seconds.max(1),
            limit,
        }
    }
}

impl From<&QueueConfig> for QueueOptions {
    fn from(config: &QueueConfig) -> Self {
        Self::new(config.title.clone(), config.interval_seconds, config.limit)
    }
}

/// 用队列方式发送钉钉消息
pub struct DingQueue {
    queue: Arc<MessageQueue>,
    scheduler: BatchScheduler,
}

impl DingQueue {
    /// 使用机器人凭证创建队列
    ///
    /// 兜底通知使用相同的 access token，不加签。
    pub fn new(credentials: Credentials, options: QueueOptions) -> Result<Self, DingError> {
        Ok(Self::from_sender(DingTalkSender::new(credentials)?, options))
    }

    /// 使用已有的钉钉发送器创建队列
    pub fn from_sender(sender: DingTalkSender, options: QueueOptions) -> Self {
        let fallback = Arc::new(sender.unsigned());
        Self::with_senders(Arc::new(sender), fallback, options)
    }

    /// 使用任意发送器创建队列
    pub fn with_senders(
        sender: Arc<dyn MessageSender>,
        fallback: Arc<dyn MessageSender>,
        options: QueueOptions,
    ) -> Self {
        let queue = Arc::new(MessageQueue::new(options.title));
        let scheduler = BatchScheduler::new(
            Arc::clone(&queue),
            sender,
            FallbackNotifier::new(fallback),
            options.interval_seconds,
            options.limit,
        );
        Self { queue, scheduler }
    }

    /// push 消息到队列
    pub fn push(&self, content: impl Into<String>) {
        self.queue.push(content);
    }

    /// 带标题 push 消息到队列，标题为空时使用队列标题
    pub fn push_with_title(&self, title: impl Into<String>, content: impl Into<String>) {
        self.queue.push_with_title(title, content);
    }

    pub fn push_entry(&self, entry: QueueEntry) {
        self.queue.push_entry(entry);
    }

    /// 待发送的消息数量
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn title(&self) -> &str {
        self.queue.default_title()
    }

    /// 开始工作
    pub async fn start(&self) {
        self.scheduler.start().await;
    }

    /// 停止工作，剩余消息以及已派发的发送都会在返回前完成
    pub async fn stop(&self) {
        self.scheduler.stop().await;
    }

    pub async fn is_running(&self) -> bool {
        self.scheduler.is_running().await
    }

    /// 立即发送一次，不等待调度间隔
    ///
    /// 队列为空时返回 `false`。必须在 tokio 运行时内调用。
    pub fn tick(&self) -> bool {
        self.scheduler.tick()
    }

    /// 等待已派发的发送完成
    pub async fn wait_pending(&self) {
        self.scheduler.wait_pending().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NoOpSender;

    #[test]
    fn test_options_normalize_interval() {
        let options = QueueOptions::new("t", 0, 0);
        assert_eq!(options.interval_seconds, 1);
    }

    #[test]
    fn test_options_from_config() {
        let config = QueueConfig {
            title: "日报".to_string(),
            interval_seconds: 5,
            limit: 2,
        };
        assert_eq!(QueueOptions::from(&config), QueueOptions::new("日报", 5, 2));
    }

    #[test]
    fn test_push_counts() {
        let queue = DingQueue::with_senders(
            Arc::new(NoOpSender),
            Arc::new(NoOpSender),
            QueueOptions::new("t", 1, 0),
        );
        queue.push("a");
        queue.push_with_title("x", "b");
        queue.push_entry(QueueEntry::default());
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.title(), "t");
    }

    #[tokio::test]
    async fn test_tick_drains() {
        let queue = DingQueue::with_senders(
            Arc::new(NoOpSender),
            Arc::new(NoOpSender),
            QueueOptions::new("t", 1, 0),
        );
        queue.push("a");
        assert!(queue.tick());
        queue.wait_pending().await;
        assert!(queue.is_empty());
    }
}
