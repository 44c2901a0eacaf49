//! 通知模块
//!
//! 提供钉钉机器人消息发送和加签功能

pub mod dingtalk;
pub mod sender;

// 重新导出主要类型
pub use dingtalk::{calc_sign, Credentials, DingTalkSender, DING_API_URL};
pub use sender::{MessageSender, NoOpSender, SendResult};
