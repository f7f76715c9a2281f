//! 环境变量配置加载

use std::env;
use std::time::Duration;
use tracing::warn;

use crate::domain::Platform;

/// 环境配置
#[derive(Clone, Debug)]
pub struct EnvConfig {
    /// 监听地址
    pub bind: String,
    /// 服务监听端口
    pub port: u16,
    /// 单条命令超时
    pub command_timeout: Duration,
    /// 平台（启动时确定一次）
    pub platform: Platform,
    /// 批量成员操作的最大并发数
    pub bulk_concurrency: usize,
    /// 创建用户时未指定 shell 的默认值
    pub default_shell: String,
    /// 默认 home 目录的父目录
    pub home_base: String,
}

impl EnvConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Self {
        let bind = env::var("IDENTITY_AGENT_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());

        // Port - 支持通用名称兼容
        let port = load_with_fallback("IDENTITY_AGENT_PORT", "PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(constants::DEFAULT_PORT);

        let command_timeout = env::var("COMMAND_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(constants::DEFAULT_COMMAND_TIMEOUT_SECS));

        let platform = match env::var("IDENTITY_PLATFORM") {
            Ok(name) => {
                let platform = Platform::from_os_name(&name);
                if platform == Platform::Unsupported {
                    warn!(value = %name, "IDENTITY_PLATFORM is not a supported platform");
                }
                platform
            }
            Err(_) => Platform::detect(),
        };

        let bulk_concurrency = env::var("BULK_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(constants::DEFAULT_BULK_CONCURRENCY);

        let default_shell = env::var("DEFAULT_SHELL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "/bin/bash".to_string());

        let home_base = env::var("HOME_BASE")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "/home".to_string());

        Self {
            bind,
            port,
            command_timeout,
            platform,
            bulk_concurrency,
            default_shell,
            home_base,
        }
    }

    /// 用户的默认 home 目录
    pub fn default_home_dir(&self, username: &str) -> String {
        format!("{}/{}", self.home_base.trim_end_matches('/'), username)
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: constants::DEFAULT_PORT,
            command_timeout: Duration::from_secs(constants::DEFAULT_COMMAND_TIMEOUT_SECS),
            platform: Platform::detect(),
            bulk_concurrency: constants::DEFAULT_BULK_CONCURRENCY,
            default_shell: "/bin/bash".to_string(),
            home_base: "/home".to_string(),
        }
    }
}

/// 加载环境变量，支持 fallback
fn load_with_fallback(primary: &str, fallback: &str) -> Option<String> {
    env::var(primary).ok().or_else(|| env::var(fallback).ok())
}

/// 常量
pub mod constants {
    /// 默认监听端口
    pub const DEFAULT_PORT: u16 = 9877;

    /// 单条命令默认超时（秒）
    pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 15;

    /// 批量成员操作默认并发数
    pub const DEFAULT_BULK_CONCURRENCY: usize = 4;

    /// 版本号
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_with_fallback() {
        env::set_var("IDENTITY_TEST_PRIMARY", "primary_value");
        env::set_var("IDENTITY_TEST_FALLBACK", "fallback_value");

        assert_eq!(
            load_with_fallback("IDENTITY_TEST_PRIMARY", "IDENTITY_TEST_FALLBACK"),
            Some("primary_value".to_string())
        );

        env::remove_var("IDENTITY_TEST_PRIMARY");
        assert_eq!(
            load_with_fallback("IDENTITY_TEST_PRIMARY", "IDENTITY_TEST_FALLBACK"),
            Some("fallback_value".to_string())
        );

        env::remove_var("IDENTITY_TEST_FALLBACK");
        assert_eq!(
            load_with_fallback("IDENTITY_TEST_PRIMARY", "IDENTITY_TEST_FALLBACK"),
            None
        );
    }

    #[test]
    fn test_default_home_dir() {
        let mut config = EnvConfig::default();
        assert_eq!(config.default_home_dir("alice"), "/home/alice");

        config.home_base = "/srv/users/".to_string();
        assert_eq!(config.default_home_dir("bob"), "/srv/users/bob");
    }
}
