//! 命令行参数定义
//!
//! 使用clap定义应用程序的命令行接口

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// dinghook - 钉钉机器人消息发送工具
#[derive(Parser, Debug, Clone)]
#[command(
    name = "dinghook",
    version = crate::VERSION,
    about = crate::APP_DESCRIPTION,
    long_about = None
)]
pub struct Args {
    /// 配置文件路径
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "配置文件路径",
        env = "DINGHOOK_CONFIG"
    )]
    pub config: Option<PathBuf>,

    /// 日志级别，未指定时使用配置文件中的级别
    #[arg(
        short,
        long,
        value_enum,
        help = "日志级别",
        env = "DINGHOOK_LOG_LEVEL"
    )]
    pub log_level: Option<LogLevel>,

    /// access token，优先于配置文件
    #[arg(long, value_name = "TOKEN", env = "DINGHOOK_ACCESS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// 加签token，优先于配置文件
    #[arg(long, value_name = "SECRET", env = "DINGHOOK_SIGN_TOKEN", hide_env_values = true)]
    pub sign_token: Option<String>,

    /// 子命令
    #[command(subcommand)]
    pub command: Commands,
}

/// 日志级别枚举
#[derive(ValueEnum, Clone, Debug, PartialEq)]
pub enum LogLevel {
    /// 调试级别
    Debug,
    /// 信息级别
    Info,
    /// 警告级别
    Warn,
    /// 错误级别
    Error,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// 子命令定义
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// 发送一条消息
    Send {
        /// 消息类型: text, link, markdown, actionCard, feedCard
        #[arg(short = 't', long = "type", default_value = "text", help = "消息类型")]
        msg_type: String,

        /// 消息内容
        #[arg(value_name = "CONTENT", help = "消息内容")]
        content: String,

        /// 标题
        #[arg(long, help = "标题")]
        title: Option<String>,

        /// 跳转URL
        #[arg(long, help = "点击消息或按钮跳转的URL")]
        url: Option<String>,

        /// 图片URL
        #[arg(long, help = "图片URL")]
        pic_url: Option<String>,

        /// 按钮标题（actionCard）
        #[arg(long, help = "按钮标题")]
        button_title: Option<String>,

        /// 按钮横向排列（actionCard）
        #[arg(long, help = "按钮横向排列")]
        horizontal: bool,

        /// 被@人的手机号
        #[arg(long = "at", value_name = "MOBILE", help = "被@人的手机号")]
        at_mobiles: Vec<String>,

        /// @所有人
        #[arg(long, help = "@所有人")]
        at_all: bool,
    },

    /// 从标准输入逐行读取消息，按间隔合并发送
    Queue {
        /// 合并消息标题
        #[arg(long, help = "合并消息标题")]
        title: Option<String>,

        /// 发送间隔（秒）
        #[arg(short, long, value_name = "SECONDS", help = "发送间隔（秒）")]
        interval: Option<u64>,

        /// 每次发送的轮数限制
        #[arg(long, value_name = "COUNT", help = "每次发送的轮数限制，0 为不限制")]
        limit: Option<u32>,
    },

    /// 验证配置文件
    Validate {
        /// 配置文件路径
        #[arg(value_name = "FILE", help = "配置文件路径")]
        config_path: Option<PathBuf>,
    },

    /// 显示版本信息
    Version,
}

impl Args {
    /// 获取配置文件路径
    pub fn get_config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::get_default_config_path)
    }
}
