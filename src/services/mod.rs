//! 业务服务模块
//!
//! 用户、用户组、组成员管理，全部经由 `Backend` 调用系统命令

pub mod groups;
pub mod membership;
pub mod platform;
pub mod session;
pub mod users;
pub mod validation;

pub use groups::GroupService;
pub use membership::MembershipService;
pub use platform::{Backend, CommandSet, ShellCommand, ShellKind};
pub use session::{LoginProbe, ProcessTable};
pub use users::{NewUser, UserService, UserUpdate};

use crate::domain::{OperationOutcome, STATUS_EXECUTOR_FAULT, STATUS_FAILED, STATUS_OK};
use crate::infra::CommandResult;

/// 将命令结果转换为写操作结果
///
/// 退出码 0 → 200；执行器失败 → 501；其余 → 500
pub(crate) fn outcome_from(
    result: CommandResult,
    success_message: String,
    failure_message: String,
) -> OperationOutcome {
    let (status, message) = if result.is_success() {
        (STATUS_OK, success_message)
    } else if result.is_fault() {
        (STATUS_EXECUTOR_FAULT, failure_message)
    } else {
        (STATUS_FAILED, failure_message)
    };
    OperationOutcome::new(status, message, result.stdout, result.stderr)
}

#[cfg(test)]
pub(crate) mod testing {
    //! 服务层测试替身

    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::platform::Backend;
    use super::session::LoginProbe;
    use crate::domain::Platform;
    use crate::infra::{CommandResult, Executor};

    /// 脚本化执行器：按子串匹配返回预设结果，未匹配的命令成功且无输出
    #[derive(Default)]
    pub struct ScriptedExecutor {
        rules: Vec<(String, CommandResult)>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn on(mut self, needle: &str, result: CommandResult) -> Self {
            self.rules.push((needle.to_string(), result));
            self
        }

        /// 已执行的命令（按调用顺序）
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn respond(&self, command: &str) -> CommandResult {
            self.calls.lock().unwrap().push(command.to_string());
            self.rules
                .iter()
                .find(|(needle, _)| command.contains(needle.as_str()))
                .map(|(_, result)| result.clone())
                .unwrap_or_else(|| CommandResult::completed("", "", 0))
        }
    }

    #[async_trait]
    impl Executor for ScriptedExecutor {
        async fn execute(&self, command: &str, _timeout: Duration) -> CommandResult {
            self.respond(command)
        }

        async fn execute_powershell(&self, command: &str, _timeout: Duration) -> CommandResult {
            self.respond(command)
        }
    }

    /// 固定进程所有者
    pub struct FixedOwners(pub Vec<Option<String>>);

    impl LoginProbe for FixedOwners {
        fn process_owners(&self) -> Vec<Option<String>> {
            self.0.clone()
        }
    }

    pub fn backend(executor: Arc<ScriptedExecutor>, platform: Platform) -> Backend {
        Backend::new(executor, platform, Duration::from_secs(1))
    }
}
