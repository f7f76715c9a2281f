//! 应用状态

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::EnvConfig;
use crate::domain::Platform;
use crate::infra::{CommandRunner, Executor};
use crate::services::{
    Backend, GroupService, LoginProbe, MembershipService, ProcessTable, UserService,
};

/// 应用状态
///
/// 平台在构造时确定一次，通过 `Backend` 传给各个服务
pub struct AppState {
    /// 环境配置
    pub config: EnvConfig,
    /// 服务启动时间
    pub started_at: DateTime<Utc>,
    /// 用户服务
    pub users: UserService,
    /// 用户组服务
    pub groups: GroupService,
    /// 组成员服务
    pub membership: MembershipService,
    /// 关闭信号
    pub shutdown: CancellationToken,
}

impl AppState {
    /// 使用真实命令执行器和进程表创建状态
    pub fn new(config: EnvConfig) -> Self {
        Self::with_parts(config, Arc::new(CommandRunner::new()), Arc::new(ProcessTable))
    }

    /// 使用指定的执行器与登录探测器创建状态
    pub fn with_parts(
        config: EnvConfig,
        executor: Arc<dyn Executor>,
        probe: Arc<dyn LoginProbe>,
    ) -> Self {
        let backend = Backend::new(executor, config.platform, config.command_timeout);
        let membership = MembershipService::new(backend.clone(), config.bulk_concurrency);
        let users = UserService::new(backend.clone(), probe);
        let groups = GroupService::new(backend, membership.clone());

        Self {
            config,
            started_at: Utc::now(),
            users,
            groups,
            membership,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn platform(&self) -> Platform {
        self.config.platform
    }

    /// 触发优雅关闭，HTTP 服务在处理完进行中的请求后退出
    pub fn trigger_shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            tracing::info!("Graceful shutdown initiated");
            self.shutdown.cancel();
        }
    }
}
