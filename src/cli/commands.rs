//! 命令处理逻辑
//!
//! 实现各种CLI命令的处理逻辑

use crate::cli::args::{Args, Commands};
use crate::config::{Config, ConfigLoader, QueueConfig, RobotConfig, TomlConfigLoader};
use crate::error::{DingError, Result};
use crate::message::{
    FeedCard, FeedLink, Link, Markdown, Message, MessageKind, OverallActionCard, Text,
};
use crate::notification::{MessageSender, DING_API_URL};
use crate::queue::{DingQueue, QueueOptions};
use async_trait::async_trait;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// 命令处理器trait
#[async_trait]
pub trait Command: Send + Sync {
    /// 执行命令
    async fn execute(&self, args: &Args) -> Result<()>;
}

/// 加载配置文件，未指定且默认位置不存在时返回 `None`
async fn load_config(args: &Args) -> Result<Option<Config>> {
    let path = args.get_config_path();
    if args.config.is_none() && !path.exists() {
        return Ok(None);
    }

    let loader = TomlConfigLoader::new(true);
    Ok(Some(loader.load_from_file(path).await?))
}

/// 合并命令行参数与配置文件中的机器人配置
fn resolve_robot(args: &Args, config: Option<&Config>) -> Result<RobotConfig> {
    let mut robot = match config {
        Some(config) => config.robot.clone(),
        None => RobotConfig {
            access_token: String::new(),
            sign_token: None,
            base_url: DING_API_URL.to_string(),
            request_timeout_seconds: 30,
        },
    };

    if let Some(token) = &args.token {
        robot.access_token = token.clone();
    }
    if let Some(sign_token) = &args.sign_token {
        robot.sign_token = Some(sign_token.clone());
    }

    if robot.access_token.is_empty() {
        return Err(DingError::Config.into());
    }
    Ok(robot)
}

/// 命令行中构建消息需要的字段
#[derive(Debug, Default, Clone)]
pub struct MessageArgs {
    pub content: String,
    pub title: Option<String>,
    pub url: Option<String>,
    pub pic_url: Option<String>,
    pub button_title: Option<String>,
    pub horizontal: bool,
    pub at_mobiles: Vec<String>,
    pub at_all: bool,
}

/// 根据消息类型名构建消息
pub fn build_message(msg_type: &str, fields: MessageArgs) -> std::result::Result<Message, DingError> {
    let kind: MessageKind = msg_type.parse()?;
    let title = fields.title.unwrap_or_default();
    let url = fields.url.unwrap_or_default();
    let pic_url = fields.pic_url.unwrap_or_default();

    let message: Message = match kind {
        MessageKind::Text => Text {
            content: fields.content,
            at_mobiles: fields.at_mobiles,
            at_user_ids: Vec::new(),
            at_all: fields.at_all,
        }
        .into(),
        MessageKind::Link => Link {
            title,
            content: fields.content,
            message_url: url,
            picture_url: pic_url,
        }
        .into(),
        MessageKind::Markdown => Markdown::new(title, fields.content).into(),
        MessageKind::ActionCard => OverallActionCard {
            title,
            content: fields.content,
            button_title: fields.button_title.unwrap_or_default(),
            button_url: url,
            button_horizontal: fields.horizontal,
        }
        .into(),
        // 命令行只支持单条链接，标题取消息内容
        MessageKind::FeedCard => FeedCard {
            links: vec![FeedLink {
                title: fields.content,
                message_url: url,
                picture_url: pic_url,
            }],
        }
        .into(),
    };

    Ok(message)
}

/// 发送命令
pub struct SendCommand;

#[async_trait]
impl Command for SendCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        let Commands::Send {
            msg_type,
            content,
            title,
            url,
            pic_url,
            button_title,
            horizontal,
            at_mobiles,
            at_all,
        } = &args.command
        else {
            return Ok(());
        };

        let message = build_message(
            msg_type,
            MessageArgs {
                content: content.clone(),
                title: title.clone(),
                url: url.clone(),
                pic_url: pic_url.clone(),
                button_title: button_title.clone(),
                horizontal: *horizontal,
                at_mobiles: at_mobiles.clone(),
                at_all: *at_all,
            },
        )?;

        let config = load_config(args).await?;
        let sender = resolve_robot(args, config.as_ref())?.build_sender()?;

        let result = sender.send(&message).await;
        if result.success {
            println!("✅ 消息发送成功");
            Ok(())
        } else {
            println!("❌ 消息发送失败: [{}] {}", result.err_code, result.err_msg);
            Err(anyhow::anyhow!("消息发送失败: {}", result.err_msg).into())
        }
    }
}

/// 队列命令
pub struct QueueCommand;

#[async_trait]
impl Command for QueueCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        let Commands::Queue {
            title,
            interval,
            limit,
        } = &args.command
        else {
            return Ok(());
        };

        let config = load_config(args).await?;
        let sender = resolve_robot(args, config.as_ref())?.build_sender()?;

        let defaults = config.map(|c| c.queue).unwrap_or_default();
        let queue_config = QueueConfig {
            title: title.clone().unwrap_or(defaults.title),
            interval_seconds: interval.unwrap_or(defaults.interval_seconds),
            limit: limit.unwrap_or(defaults.limit),
        };

        let queue = DingQueue::from_sender(sender, QueueOptions::from(&queue_config));
        queue.start().await;
        info!(
            "开始从标准输入读取消息，间隔: {}s",
            queue_config.interval_seconds.max(1)
        );

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                line = lines.next_line() => match line {
                    Ok(Some(line)) if !line.trim().is_empty() => queue.push(line),
                    Ok(Some(_)) => {}
                    Ok(None) => break,
                    Err(e) => {
                        warn!("读取标准输入失败: {}", e);
                        break;
                    }
                },
                _ = tokio::signal::ctrl_c() => {
                    info!("收到中断信号，发送剩余消息后退出");
                    break;
                }
            }
        }

        queue.stop().await;
        Ok(())
    }
}

/// 验证命令
pub struct ValidateCommand;

#[async_trait]
impl Command for ValidateCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Validate { config_path } = &args.command {
            let path = config_path
                .clone()
                .unwrap_or_else(|| args.get_config_path());
            self.validate(&path).await
        } else {
            Ok(())
        }
    }
}

impl ValidateCommand {
    async fn validate(&self, path: &Path) -> Result<()> {
        println!("验证配置文件: {}", path.display());

        let loader = TomlConfigLoader::new(true);
        match loader.load_from_file(path).await {
            Ok(config) => {
                println!("✅ 配置文件有效");
                println!("   加签: {}", if config.robot.sign_token.is_some() { "是" } else { "否" });
                println!("   队列标题: {}", config.queue.title);
                println!("   发送间隔: {}s", config.queue.interval_seconds);
                Ok(())
            }
            Err(e) => {
                println!("❌ 配置文件无效: {e}");
                Err(e)
            }
        }
    }
}

/// 版本命令
pub struct VersionCommand;

#[async_trait]
impl Command for VersionCommand {
    async fn execute(&self, _args: &Args) -> Result<()> {
        println!("{} v{}", crate::APP_NAME, crate::VERSION);
        println!("{}", crate::APP_DESCRIPTION);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_build_text_message() {
        let message = build_message(
            "text",
            MessageArgs {
                content: "hi".to_string(),
                at_mobiles: vec!["138".to_string()],
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(
            message,
            Message::from(Text {
                content: "hi".to_string(),
                at_mobiles: vec!["138".to_string()],
                at_user_ids: vec![],
                at_all: false,
            })
        );
    }

    #[test]
    fn test_build_unsupported_message() {
        let result = build_message("voice", MessageArgs::default());
        assert!(matches!(result, Err(DingError::UnsupportedType(_))));
    }

    #[test]
    fn test_build_action_card() {
        let message = build_message(
            "actionCard",
            MessageArgs {
                content: "c".to_string(),
                title: Some("t".to_string()),
                url: Some("https://example.com".to_string()),
                button_title: Some("查看".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        assert!(message.validate().is_ok());
        assert_eq!(message.kind(), MessageKind::ActionCard);
    }

    #[test]
    fn test_resolve_robot_cli_overrides() {
        let args = Args::try_parse_from([
            "dinghook",
            "--token",
            "cli",
            "--sign-token",
            "SECcli",
            "version",
        ])
        .unwrap();

        let robot = resolve_robot(&args, None).unwrap();
        assert_eq!(robot.access_token, "cli");
        assert_eq!(robot.sign_token.as_deref(), Some("SECcli"));
        assert_eq!(robot.base_url, DING_API_URL);
    }
}
