//! 错误处理模块
//!
//! 定义应用程序的统一错误类型

use thiserror::Error;

/// dinghook 应用程序的主要错误类型
#[derive(Error, Debug)]
pub enum DingHookError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 消息发送相关错误
    #[error("消息发送错误: {0}")]
    Ding(#[from] DingError),

    /// 其他错误
    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件解析错误
    #[error("配置文件解析失败: {0}")]
    ParseError(String),

    /// 配置验证错误
    #[error("配置验证失败: {0}")]
    ValidationError(String),

    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    /// 环境变量替换错误
    #[error("环境变量替换失败: {var}")]
    EnvVarError { var: String },
}

/// 钉钉消息发送错误类型
///
/// 发送器不会把这些错误向上抛出，而是转换为 [`SendResult`](crate::notification::SendResult)。
#[derive(Error, Debug)]
pub enum DingError {
    /// 缺少 access token 等配置
    #[error("access token is required")]
    Config,

    /// 必填字段缺失
    #[error("field valid error: {0}")]
    Validation(String),

    /// 不支持的消息类型
    #[error("not support message type: {0}")]
    UnsupportedType(String),

    /// 消息序列化失败
    #[error("marshal message error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 网络传输失败
    #[error("post data to api error: {0}")]
    Network(#[from] reqwest::Error),

    /// 响应体无法解析
    #[error("unmarshal http response body error: {0}")]
    Decode(String),
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, DingHookError>;
