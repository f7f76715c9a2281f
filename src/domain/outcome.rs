//! 写操作结果模型

use serde::{Deserialize, Serialize};

/// 命令成功
pub const STATUS_OK: u16 = 200;
/// 命令已执行但退出码非零
pub const STATUS_FAILED: u16 = 500;
/// 命令未能执行（超时、无法启动等）
pub const STATUS_EXECUTOR_FAULT: u16 = 501;

/// 单个写操作的结果
///
/// `status_code == 200` 当且仅当底层命令退出码为 0
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OperationOutcome {
    #[serde(rename = "status")]
    pub status_code: u16,
    pub message: String,
    pub stdout: String,
    #[serde(rename = "error")]
    pub stderr: String,
}

impl OperationOutcome {
    pub fn new(
        status_code: u16,
        message: impl Into<String>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self {
            status_code,
            message: message.into(),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == STATUS_OK
    }
}

/// 创建/更新用户的结果
///
/// 账户命令与密码设置是两个独立步骤，这里分别给出子状态，
/// 顶层 `outcome` 只有两步都成功时才为 200
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AccountOutcome {
    #[serde(flatten)]
    pub outcome: OperationOutcome,
    /// 账户命令（useradd / usermod）是否成功
    pub account_changed: bool,
    /// 密码是否设置成功；未提供密码时为 None
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_assigned: Option<bool>,
}

impl AccountOutcome {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

/// 成员操作类型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipAction {
    Add,
    Remove,
}

impl MembershipAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipAction::Add => "add",
            MembershipAction::Remove => "remove",
        }
    }
}

/// 批量成员操作结果
///
/// 每个输入用户名恰好出现在 `success_users` 或 `failed_users` 之一中
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BulkMembershipResult {
    #[serde(rename = "status")]
    pub status_code: u16,
    pub message: String,
    pub success_users: Vec<String>,
    pub failed_users: Vec<String>,
}

impl BulkMembershipResult {
    /// 根据分组结果生成汇总状态与固定文案
    pub fn from_partition(
        group: &str,
        action: MembershipAction,
        success_users: Vec<String>,
        failed_users: Vec<String>,
    ) -> Self {
        let (status_code, message) = if failed_users.is_empty() {
            let message = match action {
                MembershipAction::Add => {
                    format!("All users were successfully added to group {}", group)
                }
                MembershipAction::Remove => {
                    format!("All users were successfully removed from group {}", group)
                }
            };
            (STATUS_OK, message)
        } else {
            let message = match action {
                MembershipAction::Add => format!("Not all users were added to group {}", group),
                MembershipAction::Remove => {
                    format!("Not all users were removed from group {}", group)
                }
            };
            (STATUS_FAILED, message)
        };

        Self {
            status_code,
            message,
            success_users,
            failed_users,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == STATUS_OK
    }
}
