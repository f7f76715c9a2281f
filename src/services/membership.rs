//! 组成员操作
//!
//! 单个成员的添加/移除各对应一次命令；批量操作对每个用户调用一次单成员操作，
//! 全部完成后再汇总成功/失败列表

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use super::outcome_from;
use super::platform::Backend;
use super::validation::validate_name;
use crate::domain::{BulkMembershipResult, MembershipAction, OperationOutcome};
use crate::error::IdentityResult;

/// 组成员服务
#[derive(Clone)]
pub struct MembershipService {
    backend: Backend,
    concurrency: usize,
}

impl MembershipService {
    pub fn new(backend: Backend, concurrency: usize) -> Self {
        Self {
            backend,
            concurrency: concurrency.max(1),
        }
    }

    /// 将用户加入组
    pub async fn add_member(&self, group: &str, username: &str) -> IdentityResult<OperationOutcome> {
        self.apply(group, username, MembershipAction::Add).await
    }

    /// 将用户移出组
    pub async fn remove_member(
        &self,
        group: &str,
        username: &str,
    ) -> IdentityResult<OperationOutcome> {
        self.apply(group, username, MembershipAction::Remove).await
    }

    /// 单成员操作
    pub async fn apply(
        &self,
        group: &str,
        username: &str,
        action: MembershipAction,
    ) -> IdentityResult<OperationOutcome> {
        validate_name("group name", group)?;
        validate_name("username", username)?;
        let commands = self.backend.commands()?;

        let command = match action {
            MembershipAction::Add => commands.add_member(group, username),
            MembershipAction::Remove => commands.remove_member(group, username),
        };
        let result = self.backend.run(&command).await;

        let (success, failure) = match action {
            MembershipAction::Add => (
                format!(
                    "The user {} was successfully added to the group {}.",
                    username, group
                ),
                format!("Failed to add the user {} to the group {}.", username, group),
            ),
            MembershipAction::Remove => (
                format!(
                    "The user {} was successfully removed from the group {}.",
                    username, group
                ),
                format!(
                    "Failed to remove the user {} from the group {}.",
                    username, group
                ),
            ),
        };

        let outcome = outcome_from(result, success, failure);
        if !outcome.is_success() {
            warn!(
                group = %group,
                username = %username,
                action = action.as_str(),
                status = outcome.status_code,
                stderr = %outcome.stderr,
                "Membership change failed"
            );
        }
        Ok(outcome)
    }

    /// 查询组成员
    ///
    /// 组不存在、查询失败或记录格式不符时都返回空列表
    pub async fn get_members(&self, group: &str) -> Vec<String> {
        if validate_name("group name", group).is_err() {
            return Vec::new();
        }
        let Ok(commands) = self.backend.commands() else {
            return Vec::new();
        };

        let result = self.backend.run(&commands.get_members(group)).await;
        if !result.is_success() {
            warn!(group = %group, stderr = %result.stderr, "Group member lookup failed");
            return Vec::new();
        }
        commands.parse_members(&result.stdout)
    }

    /// 批量添加/移除成员
    ///
    /// 每个用户独立执行，最多 `concurrency` 个并发；
    /// 结果列表保持输入顺序，重复用户名只处理一次
    pub async fn bulk_apply(
        &self,
        group: &str,
        users: &[String],
        action: MembershipAction,
    ) -> IdentityResult<BulkMembershipResult> {
        validate_name("group name", group)?;
        self.backend.commands()?;

        let mut unique: Vec<&String> = Vec::with_capacity(users.len());
        for user in users {
            if !unique.contains(&user) {
                unique.push(user);
            }
        }

        let results: Vec<(String, bool)> = stream::iter(unique.into_iter().cloned())
            .map(|user: String| async move {
                let ok = match self.apply(group, &user, action).await {
                    Ok(outcome) => outcome.is_success(),
                    Err(e) => {
                        warn!(group = %group, username = %user, error = %e, "Membership change rejected");
                        false
                    }
                };
                (user, ok)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut success_users = Vec::new();
        let mut failed_users = Vec::new();
        for (user, ok) in results {
            if ok {
                success_users.push(user);
            } else {
                failed_users.push(user);
            }
        }

        info!(
            group = %group,
            action = action.as_str(),
            succeeded = success_users.len(),
            failed = failed_users.len(),
            "Bulk membership change finished"
        );

        Ok(BulkMembershipResult::from_partition(
            group,
            action,
            success_users,
            failed_users,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Platform, STATUS_EXECUTOR_FAULT, STATUS_FAILED, STATUS_OK};
    use crate::error::IdentityError;
    use crate::infra::CommandResult;
    use crate::services::testing::{backend, ScriptedExecutor};
    use std::sync::Arc;

    fn service(executor: Arc<ScriptedExecutor>) -> MembershipService {
        MembershipService::new(backend(executor, Platform::Posix), 4)
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_add_member_success() {
        let executor = Arc::new(ScriptedExecutor::new());
        let outcome = service(executor.clone()).add_member("devs", "alice").await.unwrap();

        assert_eq!(outcome.status_code, STATUS_OK);
        assert_eq!(executor.calls(), vec!["usermod -aG 'devs' 'alice'"]);
    }

    #[tokio::test]
    async fn test_remove_member_timeout_is_executor_fault() {
        let executor = Arc::new(ScriptedExecutor::new().on("gpasswd", CommandResult::timed_out()));
        let outcome = service(executor).remove_member("devs", "alice").await.unwrap();

        assert_eq!(outcome.status_code, STATUS_EXECUTOR_FAULT);
        assert_eq!(outcome.stderr, "Command execution timed out");
    }

    #[tokio::test]
    async fn test_bulk_partial_failure() {
        let executor = Arc::new(ScriptedExecutor::new().on(
            "usermod -aG 'devs' 'bob'",
            CommandResult::completed("", "usermod: user 'bob' does not exist", 6),
        ));
        let result = service(executor)
            .bulk_apply("devs", &names(&["alice", "bob"]), MembershipAction::Add)
            .await
            .unwrap();

        assert_eq!(result.status_code, STATUS_FAILED);
        assert_eq!(result.success_users, vec!["alice"]);
        assert_eq!(result.failed_users, vec!["bob"]);
        assert_eq!(result.message, "Not all users were added to group devs");
    }

    #[tokio::test]
    async fn test_bulk_every_user_accounted_once() {
        let executor = Arc::new(
            ScriptedExecutor::new()
                .on("'carol'", CommandResult::completed("", "no such user", 3))
                .on("'erin'", CommandResult::timed_out()),
        );
        let input = names(&["alice", "bob", "carol", "dave", "erin", "bob", "bad:name"]);
        let result = service(executor.clone())
            .bulk_apply("devs", &input, MembershipAction::Remove)
            .await
            .unwrap();

        let mut all: Vec<String> = result
            .success_users
            .iter()
            .chain(result.failed_users.iter())
            .cloned()
            .collect();
        all.sort();
        assert_eq!(all, names(&["alice", "bad:name", "bob", "carol", "dave", "erin"]));
        assert_eq!(result.success_users, vec!["alice", "bob", "dave"]);
        assert_eq!(result.failed_users, vec!["carol", "erin", "bad:name"]);
        assert!(!result.is_success());
        // 非法用户名不执行命令，重复的 bob 只执行一次
        assert_eq!(executor.calls().len(), 5);
    }

    #[tokio::test]
    async fn test_bulk_all_success() {
        let executor = Arc::new(ScriptedExecutor::new());
        let result = service(executor)
            .bulk_apply("devs", &names(&["alice", "bob"]), MembershipAction::Add)
            .await
            .unwrap();

        assert_eq!(result.status_code, STATUS_OK);
        assert!(result.failed_users.is_empty());
        assert_eq!(result.message, "All users were successfully added to group devs");
    }

    #[tokio::test]
    async fn test_bulk_requires_group() {
        let executor = Arc::new(ScriptedExecutor::new());
        let err = service(executor.clone())
            .bulk_apply("", &names(&["alice"]), MembershipAction::Add)
            .await
            .unwrap_err();

        assert!(matches!(err, IdentityError::MalformedInput(_)));
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_get_members_empty_field() {
        let executor = Arc::new(
            ScriptedExecutor::new().on("getent group", CommandResult::completed("devs:x:2000:", "", 0)),
        );
        assert!(service(executor).get_members("devs").await.is_empty());
    }

    #[tokio::test]
    async fn test_get_members_missing_group() {
        let executor = Arc::new(
            ScriptedExecutor::new().on("getent group", CommandResult::completed("", "", 2)),
        );
        assert!(service(executor).get_members("ghosts").await.is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_platform_runs_nothing() {
        let executor = Arc::new(ScriptedExecutor::new());
        let svc = MembershipService::new(backend(executor.clone(), Platform::Unsupported), 4);

        let err = svc.add_member("devs", "alice").await.unwrap_err();
        assert!(matches!(err, IdentityError::UnsupportedPlatform(_)));
        assert!(svc.get_members("devs").await.is_empty());
        assert!(executor.calls().is_empty());
    }
}
