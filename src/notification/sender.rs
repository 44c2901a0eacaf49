//! 通知发送器模块
//!
//! 定义消息发送的trait、发送结果和基础实现

use crate::error::DingError;
use crate::message::Message;
use async_trait::async_trait;
use serde::Deserialize;

/// 发送结果
///
/// `err_code`/`err_msg` 在钉钉接口返回时原样保留；本地错误时 `err_code` 为 0，
/// `err_msg` 为错误描述。
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SendResult {
    /// 是否成功
    #[serde(skip)]
    pub success: bool,
    /// 错误信息
    #[serde(rename = "errmsg", default)]
    pub err_msg: String,
    /// 钉钉返回的错误码
    #[serde(rename = "errcode", default)]
    pub err_code: i64,
}

impl SendResult {
    /// 成功的结果
    pub fn ok() -> Self {
        Self {
            success: true,
            err_msg: String::new(),
            err_code: 0,
        }
    }
}

impl From<DingError> for SendResult {
    fn from(err: DingError) -> Self {
        Self {
            success: false,
            err_msg: err.to_string(),
            err_code: 0,
        }
    }
}

/// 消息发送器trait
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// 发送消息
    ///
    /// # 参数
    /// * `message` - 要发送的消息
    ///
    /// # 返回
    /// * `SendResult` - 发送结果，失败不会以错误形式返回
    async fn send(&self, message: &Message) -> SendResult;
}

/// 空的通知发送器实现（用于测试或禁用通知）
pub struct NoOpSender;

#[async_trait]
impl MessageSender for NoOpSender {
    async fn send(&self, _message: &Message) -> SendResult {
        SendResult::ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Text;

    #[test]
    fn test_decode_remote_error() {
        let mut result: SendResult =
            serde_json::from_str(r#"{"errcode":123,"errmsg":"x"}"#).unwrap();
        result.success = result.err_code == 0;

        assert!(!result.success);
        assert_eq!(result.err_code, 123);
        assert_eq!(result.err_msg, "x");
    }

    #[test]
    fn test_from_error() {
        let result = SendResult::from(DingError::Config);
        assert!(!result.success);
        assert_eq!(result.err_code, 0);
        assert_eq!(result.err_msg, "access token is required");
    }

    #[tokio::test]
    async fn test_noop_sender() {
        let result = NoOpSender.send(&Text::new("hi").into()).await;
        assert!(result.success);
    }
}
