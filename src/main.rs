//! dinghook 主程序入口
//!
//! 钉钉机器人消息发送工具

use anyhow::{Context, Result};
use clap::Parser;
use dinghook::cli::args::{Args, Commands};
use dinghook::cli::{Command, QueueCommand, SendCommand, ValidateCommand, VersionCommand};
use dinghook::config::TomlConfigLoader;
use dinghook::logging::{parse_level, LogConfig, LoggingSystem};
use tracing::{debug, error};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_config = resolve_log_config(&args).await;
    let logging_system = LoggingSystem::setup_logging(log_config).context("初始化日志系统失败")?;

    debug!(
        "dinghook v{} 启动，日志级别: {}",
        dinghook::VERSION,
        logging_system.config().level
    );

    if let Err(e) = execute_command(&args).await {
        error!("命令执行失败: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// 确定日志配置
///
/// 日志级别命令行参数优先，其次为配置文件中的 `log_level`；输出方式取配置文件的 `[log]` 段。
async fn resolve_log_config(args: &Args) -> LogConfig {
    // 此时日志尚未初始化，配置文件读取失败时静默使用默认配置
    let settings = TomlConfigLoader::new(true)
        .load_log_settings(args.get_config_path())
        .await
        .unwrap_or_default();

    let level = match &args.log_level {
        Some(level) => level.clone().into(),
        None => settings
            .log_level
            .as_deref()
            .and_then(parse_level)
            .unwrap_or(log::LevelFilter::Info),
    };

    LogConfig::from_section(level, &settings.log)
}

/// 执行CLI命令
async fn execute_command(args: &Args) -> Result<()> {
    let command: &dyn Command = match &args.command {
        Commands::Send { .. } => &SendCommand,
        Commands::Queue { .. } => &QueueCommand,
        Commands::Validate { .. } => &ValidateCommand,
        Commands::Version => &VersionCommand,
    };

    command.execute(args).await.map_err(|e| anyhow::anyhow!(e))
}
