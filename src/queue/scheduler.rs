//! 批量发送调度器模块
//!
//! 按固定间隔取出队列中的消息，合并为一条markdown消息发送

use crate::message::Markdown;
use crate::notification::MessageSender;
use crate::queue::buffer::MessageQueue;
use crate::queue::fallback::FallbackNotifier;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// 单次取队列并发送的执行者
#[derive(Clone)]
struct Dispatcher {
    queue: Arc<MessageQueue>,
    sender: Arc<dyn MessageSender>,
    fallback: FallbackNotifier,
    limit: u32,
    /// 已派发但可能尚未完成的发送任务
    pending: Arc<StdMutex<JoinSet<()>>>,
}

impl Dispatcher {
    /// 取出队列并在独立任务中发送，返回是否派发了发送任务
    fn tick(&self) -> bool {
        let content = self.queue.drain_batch(self.limit);
        if content.is_empty() {
            return false;
        }

        let dispatcher = self.clone();
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        // 回收已完成的任务
        while let Some(result) = pending.try_join_next() {
            if let Err(e) = result {
                warn!("合并消息发送任务异常退出: {}", e);
            }
        }
        pending.spawn(async move {
            dispatcher.dispatch(content).await;
        });
        true
    }

    /// 取出队列并等待发送完成
    async fn flush(&self) {
        let content = self.queue.drain_batch(self.limit);
        if !content.is_empty() {
            self.dispatch(content).await;
        }
    }

    /// 等待所有已派发的发送任务完成
    async fn wait_pending(&self) {
        loop {
            let mut tasks = std::mem::take(
                &mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner),
            );
            if tasks.is_empty() {
                return;
            }
            while let Some(result) = tasks.join_next().await {
                if let Err(e) = result {
                    warn!("合并消息发送任务异常退出: {}", e);
                }
            }
        }
    }

    async fn dispatch(&self, content: String) {
        debug!("发送合并消息，长度: {}", content.len());
        let message = Markdown::new(self.queue.default_title(), content);
        let result = self.sender.send(&message.into()).await;
        if !result.success {
            warn!("合并消息发送失败: {}", result.err_msg);
            self.fallback.notify().await;
        }
    }
}

/// 批量发送调度器
pub struct BatchScheduler {
    dispatcher: Dispatcher,
    /// 发送间隔
    period: Duration,
    /// 关闭信号
    shutdown_tx: broadcast::Sender<()>,
    /// 调度任务
    task: Mutex<Option<JoinHandle<()>>>,
}

impl BatchScheduler {
    /// 创建调度器
    ///
    /// # 参数
    /// * `queue` - 消息队列
    /// * `sender` - 合并消息发送器
    /// * `fallback` - 发送失败时的兜底通知
    /// * `interval_seconds` - 发送间隔（秒），最小为1
    /// * `limit` - 每次发送的轮数限制，0 为不限制
    pub fn new(
        queue: Arc<MessageQueue>,
        sender: Arc<dyn MessageSender>,
        fallback: FallbackNotifier,
        interval_seconds: u64,
        limit: u32,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            dispatcher: Dispatcher {
                queue,
                sender,
                fallback,
                limit,
                pending: Arc::new(StdMutex::new(JoinSet::new())),
            },
            period: Duration::from_secs(interval_seconds.max(1)),
            shutdown_tx,
            task: Mutex::new(None),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// 立即执行一次取队列和发送
    ///
    /// 发送在后台任务中进行，队列为空时不派发任务并返回 `false`。
    /// 发送结果可通过 [`wait_pending`](Self::wait_pending) 等待。
    ///
    /// # Panics
    /// 必须在 tokio 运行时内调用。
    pub fn tick(&self) -> bool {
        self.dispatcher.tick()
    }

    /// 等待所有已派发的发送任务完成，包括兜底通知
    pub async fn wait_pending(&self) {
        self.dispatcher.wait_pending().await;
    }

    /// 启动调度器，启动时立即执行一次发送
    pub async fn start(&self) {
        let mut task = self.task.lock().await;
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            debug!("批量发送调度器已在运行");
            return;
        }

        let dispatcher = self.dispatcher.clone();
        let period = self.period;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        *task = Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!("批量发送调度器已启动，间隔: {:?}", period);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        dispatcher.tick();
                    }
                    _ = shutdown_rx.recv() => {
                        dispatcher.flush().await;
                        break;
                    }
                }
            }

            info!("批量发送调度器已停止");
        }));
    }

    /// 停止调度器
    ///
    /// 停止前会把队列中剩余的消息发送出去，返回时所有已派发的发送都已完成。
    pub async fn stop(&self) {
        let handle = self.task.lock().await.take();
        match handle {
            Some(handle) => {
                let _ = self.shutdown_tx.send(());
                if let Err(e) = handle.await {
                    warn!("批量发送调度任务异常退出: {}", e);
                }
            }
            None => debug!("批量发送调度器未运行"),
        }

        self.dispatcher.wait_pending().await;
    }

    pub async fn is_running(&self) -> bool {
        self.task
            .lock()
            .await
            .as_ref()
            .is_some_and(|t| !t.is_finished())
    }
}
