//! 消息模块
//!
//! 提供钉钉机器人支持的各类消息及其请求体转换

pub mod types;

// 重新导出主要类型
pub use types::{
    ActionButton, FeedCard, FeedLink, IndependentActionCard, Link, Markdown, Message,
    MessageKind, OverallActionCard, Text,
};
