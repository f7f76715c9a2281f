//! XJP Identity Agent - 主机账户与用户组管理代理
//!
//! 通过 shell 命令（POSIX 工具或 PowerShell）管理本机用户、用户组与组成员，
//! 并以 HTTP API 对外提供

pub mod error;
pub mod infra;
pub mod domain;
pub mod config;
pub mod state;
pub mod api;
pub mod services;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;

use crate::config::EnvConfig;
use crate::domain::Platform;
use crate::state::AppState;

/// 命令行传入的运行时配置
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    /// 覆盖监听端口
    pub port_override: Option<u16>,
}

/// 初始化并运行代理
pub async fn init_and_run_agent_with_config(runtime: RuntimeConfig) -> anyhow::Result<()> {
    let mut config = EnvConfig::from_env();
    if let Some(port) = runtime.port_override {
        config.port = port;
    }

    tracing::info!(
        version = crate::config::env::constants::VERSION,
        platform = %config.platform,
        timeout_secs = config.command_timeout.as_secs(),
        bulk_concurrency = config.bulk_concurrency,
        "Starting identity agent"
    );
    if config.platform == Platform::Unsupported {
        tracing::warn!("No command set for this platform; identity operations will be rejected");
    }

    let addr: SocketAddr = format!("{}:{}", config.bind, config.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.bind, config.port))?;

    let state = Arc::new(AppState::new(config));
    let shutdown = state.shutdown.clone();
    tokio::spawn(watch_signals(state.clone()));
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("HTTP server error")?;

    tracing::info!("Identity agent stopped");
    Ok(())
}

/// 等待 Ctrl+C 或 SIGTERM，收到后取消关闭令牌
///
/// 令牌已被其他路径取消时直接退出
async fn watch_signals(state: Arc<AppState>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => state.trigger_shutdown(),
        _ = terminate => state.trigger_shutdown(),
        _ = state.shutdown.cancelled() => {},
    }
}
