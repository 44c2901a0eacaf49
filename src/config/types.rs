//! 配置数据结构定义
//!
//! 定义应用程序的配置结构体和验证逻辑

use crate::error::DingError;
use crate::logging::parse_level;
use crate::notification::{Credentials, DingTalkSender, DING_API_URL};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// 主配置结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 机器人配置
    pub robot: RobotConfig,
    /// 队列配置
    #[serde(default)]
    pub queue: QueueConfig,
    /// 日志输出配置
    #[serde(default)]
    pub log: LogSection,
}

/// 日志输出配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LogSection {
    /// 日志文件路径，设置后只输出到文件
    #[serde(default)]
    pub file: Option<PathBuf>,
    /// 是否使用JSON格式
    #[serde(default)]
    pub json: bool,
    /// 模块级别日志控制，如 `"dinghook::queue" = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

/// 初始化日志需要的配置项
///
/// 在完整配置校验之前读取，不要求机器人配置存在。
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct LogSettings {
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default)]
    pub log: LogSection,
}

/// 钉钉机器人配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RobotConfig {
    /// access token
    pub access_token: String,
    /// 加签token
    #[serde(default)]
    pub sign_token: Option<String>,
    /// 接口地址
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
}

impl RobotConfig {
    pub fn credentials(&self) -> Credentials {
        let credentials = Credentials::new(self.access_token.clone());
        match &self.sign_token {
            Some(sign_token) => credentials.with_sign_token(sign_token.clone()),
            None => credentials,
        }
    }

    /// 按配置创建发送器
    pub fn build_sender(&self) -> Result<DingTalkSender, DingError> {
        DingTalkSender::with_options(
            self.credentials(),
            self.base_url.clone(),
            Duration::from_secs(self.request_timeout_seconds),
        )
    }
}

/// 消息队列配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueConfig {
    /// 合并消息标题
    #[serde(default = "default_queue_title")]
    pub title: String,
    /// 发送间隔（秒）
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
    /// 每次发送的轮数限制，0 为不限制
    #[serde(default)]
    pub limit: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            title: default_queue_title(),
            interval_seconds: default_interval(),
            limit: 0,
        }
    }
}

// 默认值函数
fn default_log_level() -> String {
    "info".to_string()
}
fn default_base_url() -> String {
    DING_API_URL.to_string()
}
fn default_timeout() -> u64 {
    30
}
fn default_queue_title() -> String {
    "消息汇总".to_string()
}
fn default_interval() -> u64 {
    60
}

/// 配置验证函数
///
/// # 参数
/// * `config` - 要验证的配置
///
/// # 返回
/// * `Result<(), String>` - 验证结果，错误时返回错误信息
pub fn validate_config(config: &Config) -> Result<(), String> {
    const VALID_LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];
    if parse_level(&config.log_level).is_none() {
        return Err(format!(
            "无效的日志级别: {}，支持的级别: {:?}",
            config.log_level, VALID_LOG_LEVELS
        ));
    }
    for (module, level) in &config.log.modules {
        if parse_level(level).is_none() {
            return Err(format!("模块 {} 的日志级别无效: {}", module, level));
        }
    }

    if config.robot.access_token.trim().is_empty() {
        return Err("access_token 不能为空".to_string());
    }

    if !config.robot.base_url.starts_with("http://")
        && !config.robot.base_url.starts_with("https://")
    {
        return Err(format!("接口地址格式无效: {}", config.robot.base_url));
    }

    if config.robot.request_timeout_seconds == 0 {
        return Err("请求超时时间不能为0".to_string());
    }

    if config.queue.title.trim().is_empty() {
        return Err("队列消息标题不能为空".to_string());
    }

    Ok(())
}
