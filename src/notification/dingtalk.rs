//! 钉钉通知发送器模块
//!
//! 实现钉钉自定义机器人webhook通知功能，支持加签方式发送

use crate::error::DingError;
use crate::message::{Link, Markdown, Message, Text};
use crate::notification::sender::{MessageSender, SendResult};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use sha2::Sha256;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 钉钉机器人接口地址
pub const DING_API_URL: &str = "https://oapi.dingtalk.com/robot/send";

/// 默认请求超时时间
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

type HmacSha256 = Hmac<Sha256>;

/// 机器人凭证
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// access token，必填
    pub access_token: String,
    /// 加签token，可选，如果填写则使用加签方式发送
    pub sign_token: Option<String>,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            sign_token: None,
        }
    }

    pub fn with_sign_token(mut self, sign_token: impl Into<String>) -> Self {
        let sign_token = sign_token.into();
        self.sign_token = (!sign_token.is_empty()).then_some(sign_token);
        self
    }
}

/// 计算加签
///
/// 以 sign token 为密钥对 `"{timestamp}\n{sign_token}"` 做 HMAC-SHA256，
/// base64 编码后再做 URL 转义。
pub fn calc_sign(timestamp: i64, sign_token: &str) -> Result<String, DingError> {
    let string_to_sign = format!("{timestamp}\n{sign_token}");
    let mut mac = HmacSha256::new_from_slice(sign_token.as_bytes())
        .map_err(|e| DingError::Validation(format!("invalid sign token: {e}")))?;
    mac.update(string_to_sign.as_bytes());
    let encoded = STANDARD.encode(mac.finalize().into_bytes());
    Ok(url::form_urlencoded::byte_serialize(encoded.as_bytes()).collect())
}

/// 钉钉通知发送器
#[derive(Debug, Clone)]
pub struct DingTalkSender {
    /// HTTP客户端
    client: Client,
    /// 机器人凭证
    credentials: Credentials,
    /// 接口地址
    base_url: String,
}

impl DingTalkSender {
    /// 使用默认接口地址和超时创建发送器
    pub fn new(credentials: Credentials) -> Result<Self, DingError> {
        Self::with_options(credentials, DING_API_URL, DEFAULT_TIMEOUT)
    }

    /// 创建发送器
    ///
    /// # 参数
    /// * `credentials` - 机器人凭证
    /// * `base_url` - 接口地址，不含查询参数
    /// * `timeout` - 请求超时时间
    pub fn with_options(
        credentials: Credentials,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DingError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
            .build()?;

        Ok(Self {
            client,
            credentials,
            base_url: base_url.into(),
        })
    }

    /// 相同 access token、不加签的发送器，共用HTTP客户端
    pub fn unsigned(&self) -> Self {
        Self {
            client: self.client.clone(),
            credentials: Credentials::new(self.credentials.access_token.clone()),
            base_url: self.base_url.clone(),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// 发送普通文本消息
    pub async fn send_text(&self, message: Text) -> SendResult {
        self.send(&message.into()).await
    }

    /// 发送link类型消息
    pub async fn send_link(&self, message: Link) -> SendResult {
        self.send(&message.into()).await
    }

    /// 发送markdown格式消息
    pub async fn send_markdown(&self, message: Markdown) -> SendResult {
        self.send(&message.into()).await
    }

    /// 构建请求地址
    fn request_url(&self, timestamp: i64) -> Result<String, DingError> {
        let mut url = format!("{}?access_token={}", self.base_url, self.credentials.access_token);
        if let Some(sign_token) = &self.credentials.sign_token {
            let sign = calc_sign(timestamp, sign_token)?;
            url.push_str(&format!("&timestamp={timestamp}&sign={sign}"));
        }
        Ok(url)
    }

    async fn try_send(&self, message: &Message) -> Result<SendResult, DingError> {
        if self.credentials.access_token.is_empty() {
            return Err(DingError::Config);
        }

        message.validate()?;

        let body = serde_json::to_vec(&message.to_payload())?;
        let url = self.request_url(chrono::Utc::now().timestamp_millis())?;

        debug!(
            "发送{}消息到钉钉: {}",
            message.kind(),
            String::from_utf8_lossy(&body)
        );

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        let content = response.bytes().await?;

        debug!("钉钉响应: {}", String::from_utf8_lossy(&content));

        let mut result: SendResult =
            serde_json::from_slice(&content).map_err(|e| DingError::Decode(e.to_string()))?;
        result.success = result.err_code == 0;
        Ok(result)
    }
}

#[async_trait]
impl MessageSender for DingTalkSender {
    async fn send(&self, message: &Message) -> SendResult {
        match self.try_send(message).await {
            Ok(result) => {
                if result.success {
                    info!("钉钉消息发送成功");
                } else {
                    warn!(
                        "钉钉消息发送失败: {} - {}",
                        result.err_code, result.err_msg
                    );
                }
                result
            }
            Err(e) => {
                warn!("钉钉消息发送失败: {}", e);
                e.into()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calc_sign_deterministic() {
        let a = calc_sign(1_600_000_000_000, "SEC123").unwrap();
        let b = calc_sign(1_600_000_000_000, "SEC123").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, calc_sign(1_600_000_000_001, "SEC123").unwrap());
    }

    #[test]
    fn test_calc_sign_matches_reference() {
        let timestamp = 1_577_836_800_000_i64;
        let secret = "SECabcdef";

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{timestamp}\n{secret}").as_bytes());
        let expected_b64 = STANDARD.encode(mac.finalize().into_bytes());

        let sign = calc_sign(timestamp, secret).unwrap();
        assert!(!sign.contains('+'));
        assert!(!sign.contains('/'));
        assert!(!sign.contains('='));

        let decoded: String = url::form_urlencoded::parse(format!("s={sign}").as_bytes())
            .find(|(k, _)| k == "s")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        assert_eq!(decoded, expected_b64);
    }

    #[test]
    fn test_request_url_without_sign() {
        let sender = DingTalkSender::new(Credentials::new("abc")).unwrap();
        assert_eq!(
            sender.request_url(1).unwrap(),
            "https://oapi.dingtalk.com/robot/send?access_token=abc"
        );
    }

    #[test]
    fn test_request_url_with_sign() {
        let sender =
            DingTalkSender::new(Credentials::new("abc").with_sign_token("SEC1")).unwrap();
        let url = sender.request_url(42).unwrap();
        let expected_sign = calc_sign(42, "SEC1").unwrap();
        assert_eq!(
            url,
            format!(
                "https://oapi.dingtalk.com/robot/send?access_token=abc&timestamp=42&sign={expected_sign}"
            )
        );
    }

    #[test]
    fn test_unsigned_drops_sign_token() {
        let sender =
            DingTalkSender::new(Credentials::new("abc").with_sign_token("SEC1")).unwrap();
        let unsigned = sender.unsigned();
        assert_eq!(unsigned.credentials().access_token, "abc");
        assert!(unsigned.credentials().sign_token.is_none());
    }

    #[test]
    fn test_empty_sign_token_is_ignored() {
        let credentials = Credentials::new("abc").with_sign_token("");
        assert!(credentials.sign_token.is_none());
    }

    #[tokio::test]
    async fn test_missing_access_token() {
        let sender = DingTalkSender::new(Credentials::default()).unwrap();
        let result = sender.send_text(Text::new("hi")).await;
        assert!(!result.success);
        assert_eq!(result.err_msg, "access token is required");
    }
}
