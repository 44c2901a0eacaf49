//! dinghook - 钉钉群机器人消息发送库
//!
//! 支持：
//! - 文本、链接、markdown、ActionCard、FeedCard 消息
//! - 加签方式发送
//! - 队列方式合并发送
//! - TOML 配置和结构化日志

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod message;
pub mod notification;
pub mod queue;

// 重新导出主要类型
pub use error::{DingError, DingHookError};
pub use message::Message;
pub use notification::{Credentials, DingTalkSender, MessageSender, SendResult};
pub use queue::{DingQueue, QueueOptions};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
