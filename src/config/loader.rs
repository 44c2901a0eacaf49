//! 配置加载器实现
//!
//! 提供TOML配置文件解析、环境变量替换和错误处理功能

use crate::config::types::{validate_config, Config, LogSettings};
use crate::error::{ConfigError, Result};
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};

/// 配置加载器trait，定义配置加载接口
#[async_trait]
pub trait ConfigLoader: Send + Sync {
    /// 从文件加载配置
    async fn load_from_file<P: AsRef<Path> + Send>(&self, path: P) -> Result<Config>;

    /// 从字符串加载配置
    async fn load_from_string(&self, content: &str) -> Result<Config>;

    /// 验证配置
    fn validate(&self, config: &Config) -> Result<()>;
}

/// TOML配置加载器实现
#[derive(Debug, Clone)]
pub struct TomlConfigLoader {
    /// 是否启用环境变量替换
    enable_env_substitution: bool,
}

impl TomlConfigLoader {
    pub fn new(enable_env_substitution: bool) -> Self {
        Self {
            enable_env_substitution,
        }
    }

    /// 替换字符串中 `${VAR_NAME}` 格式的环境变量
    fn substitute_env_vars(&self, content: &str) -> Result<String> {
        if !self.enable_env_substitution {
            return Ok(content.to_string());
        }

        let env_var_regex = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
            .map_err(|e| ConfigError::ParseError(format!("正则表达式错误: {}", e)))?;

        let mut result = content.to_string();

        for captures in env_var_regex.captures_iter(content) {
            let full_match = &captures[0];
            let var_name = &captures[1];

            match std::env::var(var_name) {
                Ok(value) => {
                    result = result.replace(full_match, &value);
                }
                Err(_) => {
                    return Err(ConfigError::EnvVarError {
                        var: var_name.to_string(),
                    }
                    .into());
                }
            }
        }

        Ok(result)
    }

    fn parse_toml(&self, content: &str) -> Result<Config> {
        let processed_content = self.substitute_env_vars(content)?;

        let config: Config = toml::from_str(&processed_content)
            .map_err(|e| ConfigError::ParseError(format!("TOML解析失败: {}", e)))?;

        Ok(config)
    }
}

#[async_trait]
impl ConfigLoader for TomlConfigLoader {
    async fn load_from_file<P: AsRef<Path> + Send>(&self, path: P) -> Result<Config> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_string_lossy().to_string(),
            }
            .into());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::ParseError(format!("读取文件失败: {}", e)))?;

        let config = self.parse_toml(&content)?;
        self.validate(&config)?;

        log::info!("成功加载配置文件: {}", path.display());

        Ok(config)
    }

    async fn load_from_string(&self, content: &str) -> Result<Config> {
        let config = self.parse_toml(content)?;
        self.validate(&config)?;

        log::debug!("成功解析配置字符串");

        Ok(config)
    }

    fn validate(&self, config: &Config) -> Result<()> {
        validate_config(config).map_err(|e| ConfigError::ValidationError(e).into())
    }
}

impl TomlConfigLoader {
    /// 只读取日志相关配置，不做完整校验
    pub async fn load_log_settings<P: AsRef<Path>>(&self, path: P) -> Result<LogSettings> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_string_lossy().to_string(),
            }
            .into());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::ParseError(format!("读取文件失败: {}", e)))?;
        let content = self.substitute_env_vars(&content)?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(format!("TOML解析失败: {}", e)).into())
    }
}

/// 获取默认配置文件路径
///
/// 当前目录存在 `dinghook.toml` 时优先使用，否则为用户配置目录下的 `dinghook/config.toml`。
pub fn get_default_config_path() -> PathBuf {
    let local = Path::new("dinghook.toml");
    if local.exists() {
        return local.to_path_buf();
    }

    dirs::config_dir()
        .map(|config_dir| config_dir.join("dinghook").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("dinghook.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DingHookError;
    use std::env;
    use std::io::Write;

    const TEST_CONFIG_TOML: &str = r#"
log_level = "debug"

[robot]
access_token = "abc"
request_timeout_seconds = 5

[queue]
title = "构建通知"
interval_seconds = 10
limit = 3
"#;

    #[tokio::test]
    async fn test_toml_parsing() {
        let loader = TomlConfigLoader::new(false);
        let config = loader.load_from_string(TEST_CONFIG_TOML).await.unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.robot.access_token, "abc");
        assert_eq!(config.robot.request_timeout_seconds, 5);
        assert_eq!(config.queue.title, "构建通知");
        assert_eq!(config.queue.interval_seconds, 10);
        assert_eq!(config.queue.limit, 3);
    }

    #[tokio::test]
    async fn test_env_var_substitution() {
        env::set_var("DINGHOOK_TEST_TOKEN", "from-env");
        env::set_var("DINGHOOK_TEST_SIGN", "SECenv");

        let loader = TomlConfigLoader::new(true);
        let config = loader
            .load_from_string(
                r#"
[robot]
access_token = "${DINGHOOK_TEST_TOKEN}"
sign_token = "${DINGHOOK_TEST_SIGN}"
"#,
            )
            .await
            .unwrap();

        assert_eq!(config.robot.access_token, "from-env");
        assert_eq!(config.robot.sign_token.as_deref(), Some("SECenv"));

        env::remove_var("DINGHOOK_TEST_TOKEN");
        env::remove_var("DINGHOOK_TEST_SIGN");
    }

    #[tokio::test]
    async fn test_env_var_substitution_missing_var() {
        let loader = TomlConfigLoader::new(true);
        let result = loader
            .load_from_string(
                r#"
[robot]
access_token = "${DINGHOOK_MISSING_VAR}"
"#,
            )
            .await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("DINGHOOK_MISSING_VAR"));
    }

    #[tokio::test]
    async fn test_validation_error() {
        let loader = TomlConfigLoader::new(false);
        let result = loader
            .load_from_string(
                r#"
[robot]
access_token = ""
"#,
            )
            .await;

        assert!(matches!(
            result,
            Err(DingHookError::Config(ConfigError::ValidationError(_)))
        ));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TEST_CONFIG_TOML.as_bytes()).unwrap();

        let loader = TomlConfigLoader::new(false);
        let config = loader.load_from_file(file.path()).await.unwrap();
        assert_eq!(config.robot.access_token, "abc");
    }

    #[tokio::test]
    async fn test_load_log_settings_ignores_invalid_robot() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"log_level = \"debug\"\n\n[robot]\naccess_token = \"\"\n\n[log]\njson = true\n")
            .unwrap();

        let loader = TomlConfigLoader::new(false);
        let settings = loader.load_log_settings(file.path()).await.unwrap();
        assert_eq!(settings.log_level.as_deref(), Some("debug"));
        assert!(settings.log.json);

        // 完整加载会因 access_token 为空而失败
        assert!(loader.load_from_file(file.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let loader = TomlConfigLoader::new(false);
        let result = loader.load_from_file("/nonexistent/dinghook.toml").await;
        assert!(matches!(
            result,
            Err(DingHookError::Config(ConfigError::FileNotFound { .. }))
        ));
    }

    #[test]
    fn test_substitute_env_vars_disabled() {
        let loader = TomlConfigLoader::new(false);
        let content = "test ${VAR} content";
        let result = loader.substitute_env_vars(content).unwrap();
        assert_eq!(result, content);
    }

    #[test]
    fn test_get_default_config_path() {
        let path = get_default_config_path();
        assert!(path.to_string_lossy().contains("dinghook"));
    }
}
