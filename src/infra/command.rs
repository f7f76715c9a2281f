//! 命令执行器
//!
//! 提供统一的命令执行接口，支持：
//! - 超时控制（超时后杀掉子进程）
//! - stdout/stderr 分离
//! - 所有失败都收敛为 `CommandResult`，不向调用方抛错
//!
//! 退出码 `-1` 保留给执行器自身的失败（超时、无法启动），
//! 这类结果同时带有 `ExecFault` 以区分具体原因

use async_trait::async_trait;
use serde::Serialize;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error, warn};

/// 超时时写入 stderr 的固定文案
pub const TIMEOUT_MESSAGE: &str = "Command execution timed out";

/// 执行器失败时使用的退出码
pub const FAULT_EXIT_STATUS: i32 = -1;

/// 执行器层面的失败原因
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecFault {
    /// 命令超时
    Timeout,
    /// 命令启动失败（找不到程序、权限不足、进程表耗尽等）
    Spawn,
    /// 等待命令完成失败
    Wait,
}

/// 命令执行结果
#[derive(Clone, Debug, PartialEq)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    /// 退出码，执行器失败时为 -1
    pub exit_status: i32,
    /// 执行器失败原因，命令正常结束时为 None
    pub fault: Option<ExecFault>,
}

impl CommandResult {
    /// 命令正常结束（无论退出码）
    pub fn completed(stdout: impl Into<String>, stderr: impl Into<String>, exit_status: i32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_status,
            fault: None,
        }
    }

    /// 命令超时
    pub fn timed_out() -> Self {
        Self::fault(ExecFault::Timeout, TIMEOUT_MESSAGE)
    }

    /// 执行器失败
    pub fn fault(kind: ExecFault, message: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: message.into(),
            exit_status: FAULT_EXIT_STATUS,
            fault: Some(kind),
        }
    }

    pub fn is_success(&self) -> bool {
        self.fault.is_none() && self.exit_status == 0
    }

    /// 命令是否根本没有跑完（超时 / 启动失败）
    pub fn is_fault(&self) -> bool {
        self.fault.is_some()
    }

    pub fn is_timeout(&self) -> bool {
        self.fault == Some(ExecFault::Timeout)
    }
}

/// 命令执行抽象
///
/// 服务层只通过该 trait 调用系统命令，测试中可替换为脚本化实现
#[async_trait]
pub trait Executor: Send + Sync {
    /// 通过平台 shell 执行命令
    async fn execute(&self, command: &str, timeout: Duration) -> CommandResult;

    /// 通过 PowerShell 包装后执行命令
    async fn execute_powershell(&self, command: &str, timeout: Duration) -> CommandResult;
}

/// 基于 tokio::process 的命令执行器
#[derive(Clone, Copy, Debug, Default)]
pub struct CommandRunner;

impl CommandRunner {
    pub fn new() -> Self {
        Self
    }

    /// 执行 shell 命令
    ///
    /// 命令中的 `^` 会被替换为空格后再执行（旧调用方用它转义空白）
    pub async fn run_shell(command: &str, timeout: Duration) -> CommandResult {
        let command = normalize_caret(command);
        let (shell, flag) = platform_shell();
        Self::run(shell, &[flag, &command], timeout).await
    }

    /// 执行 PowerShell 命令
    ///
    /// 使用 `powershell -Command "..."` 包装后交给平台 shell
    pub async fn run_powershell(command: &str, timeout: Duration) -> CommandResult {
        let wrapped = wrap_powershell(command);
        let (shell, flag) = platform_shell();
        Self::run(shell, &[flag, &wrapped], timeout).await
    }

    /// 执行程序并收集输出
    ///
    /// 超时或调用方放弃等待时，`kill_on_drop` 保证子进程被杀掉
    pub(crate) async fn run(program: &str, args: &[&str], timeout: Duration) -> CommandResult {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => {
                error!(program = %program, error = %e, "Failed to spawn command");
                return CommandResult::fault(ExecFault::Spawn, e.to_string());
            }
        };

        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let exit_status = exit_code(&output.status);
                debug!(program = %program, exit_status, "Command completed");
                CommandResult::completed(
                    String::from_utf8_lossy(&output.stdout).trim(),
                    String::from_utf8_lossy(&output.stderr).trim(),
                    exit_status,
                )
            }
            Ok(Err(e)) => {
                error!(program = %program, error = %e, "Failed to wait for command");
                CommandResult::fault(ExecFault::Wait, e.to_string())
            }
            Err(_) => {
                warn!(program = %program, timeout = ?timeout, "Command timed out, process killed");
                CommandResult::timed_out()
            }
        }
    }
}

#[async_trait]
impl Executor for CommandRunner {
    async fn execute(&self, command: &str, timeout: Duration) -> CommandResult {
        Self::run_shell(command, timeout).await
    }

    async fn execute_powershell(&self, command: &str, timeout: Duration) -> CommandResult {
        Self::run_powershell(command, timeout).await
    }
}

/// `^` 视为空白转义
pub fn normalize_caret(command: &str) -> String {
    command.replace('^', " ")
}

/// 用 PowerShell 包装命令文本
pub fn wrap_powershell(command: &str) -> String {
    format!(
        "powershell -NoProfile -NonInteractive -Command \"{}\"",
        command.replace('"', "\\\"")
    )
}

/// 当前平台的 shell 及其执行命令字符串的参数
fn platform_shell() -> (&'static str, &'static str) {
    if cfg!(windows) {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    }
}

/// 退出码；被信号终止时按 shell 约定返回 128 + 信号值，避免与 -1 冲突
fn exit_code(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}
