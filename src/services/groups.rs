//! 用户组服务

use std::collections::BTreeMap;

use tracing::{info, warn};

use super::membership::MembershipService;
use super::outcome_from;
use super::platform::Backend;
use super::validation::validate_name;
use crate::domain::{GroupRecord, OperationOutcome};
use crate::error::{IdentityError, IdentityResult};

/// 用户组服务
#[derive(Clone)]
pub struct GroupService {
    backend: Backend,
    membership: MembershipService,
}

impl GroupService {
    pub fn new(backend: Backend, membership: MembershipService) -> Self {
        Self {
            backend,
            membership,
        }
    }

    /// 列出全部用户组
    ///
    /// 成员列以组数据库为准；Windows 列表形态不含成员
    pub async fn list_groups(&self) -> IdentityResult<BTreeMap<String, GroupRecord>> {
        let commands = self.backend.commands()?;

        let result = self.backend.run(&commands.list_groups()).await;
        if !result.is_success() {
            warn!(exit_status = result.exit_status, stderr = %result.stderr, "Failed to list groups");
            return Err(IdentityError::from_command(&result));
        }
        Ok(commands.parse_groups(&result.stdout))
    }

    /// 查询单个用户组
    ///
    /// 成员通过单独的成员查询获得，不依赖列表格式中的成员列
    pub async fn get_group(&self, name: &str) -> IdentityResult<GroupRecord> {
        validate_name("group name", name)?;
        let commands = self.backend.commands()?;

        let result = self.backend.run(&commands.get_group(name)).await;
        if !result.is_success() {
            if commands.is_missing(&result) {
                return Err(IdentityError::NotFound(format!("Group '{}'", name)));
            }
            return Err(IdentityError::from_command(&result));
        }

        let group = commands
            .parse_group(&result.stdout)
            .ok_or_else(|| IdentityError::NotFound(format!("Group '{}'", name)))?;
        let members = self.membership.get_members(name).await;
        Ok(group.with_members(members))
    }

    /// 创建用户组
    pub async fn create_group(&self, name: &str) -> IdentityResult<OperationOutcome> {
        validate_name("group name", name)?;
        let commands = self.backend.commands()?;

        let result = self.backend.run(&commands.create_group(name)).await;
        let outcome = outcome_from(
            result,
            format!("The group {} was successfully created.", name),
            format!("Failed to create the group {}.", name),
        );
        info!(group = %name, status = outcome.status_code, "Create group");
        Ok(outcome)
    }

    /// 删除用户组
    pub async fn delete_group(&self, name: &str) -> IdentityResult<OperationOutcome> {
        validate_name("group name", name)?;
        let commands = self.backend.commands()?;

        let result = self.backend.run(&commands.delete_group(name)).await;
        let outcome = outcome_from(
            result,
            format!("The group {} was successfully deleted.", name),
            format!("Failed to delete the group {}.", name),
        );
        info!(group = %name, status = outcome.status_code, "Delete group");
        Ok(outcome)
    }

    /// 将用户加入组
    pub async fn add_member(&self, group: &str, username: &str) -> IdentityResult<OperationOutcome> {
        self.membership.add_member(group, username).await
    }

    /// 将用户移出组
    pub async fn remove_member(
        &self,
        group: &str,
        username: &str,
    ) -> IdentityResult<OperationOutcome> {
        self.membership.remove_member(group, username).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Platform, STATUS_FAILED, STATUS_OK};
    use crate::infra::CommandResult;
    use crate::services::testing::{backend, ScriptedExecutor};
    use std::sync::Arc;

    fn service(executor: Arc<ScriptedExecutor>, platform: Platform) -> GroupService {
        let backend = backend(executor, platform);
        GroupService::new(backend.clone(), MembershipService::new(backend, 2))
    }

    #[tokio::test]
    async fn test_list_groups_posix() {
        let executor = Arc::new(ScriptedExecutor::new().on(
            "cat /etc/group",
            CommandResult::completed("root:x:0:\nwheel:x:10:alice\ndevs:x:2000:alice,bob\n:::", "", 0),
        ));
        let groups = service(executor, Platform::Posix).list_groups().await.unwrap();

        assert_eq!(groups.len(), 3);
        assert_eq!(groups["root"].members(), Some(&[][..]));
        assert_eq!(
            groups["devs"].members().unwrap(),
            &["alice".to_string(), "bob".to_string()]
        );
    }

    #[tokio::test]
    async fn test_list_groups_failure() {
        let executor =
            Arc::new(ScriptedExecutor::new().on("cat /etc/group", CommandResult::timed_out()));
        let err = service(executor, Platform::Posix)
            .list_groups()
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::ExecutorFault { .. }));
    }

    #[tokio::test]
    async fn test_get_group_resolves_members_separately() {
        let executor = Arc::new(ScriptedExecutor::new().on(
            "getent group 'devs'",
            CommandResult::completed("devs:x:2000:alice,bob", "", 0),
        ));
        let group = service(executor.clone(), Platform::Posix)
            .get_group("devs")
            .await
            .unwrap();

        assert_eq!(group.name(), "devs");
        assert_eq!(group.members().unwrap().len(), 2);
        assert_eq!(executor.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_get_group_not_found() {
        let executor = Arc::new(
            ScriptedExecutor::new().on("getent group", CommandResult::completed("", "", 2)),
        );
        let err = service(executor, Platform::Posix)
            .get_group("ghosts")
            .await
            .unwrap_err();
        assert_eq!(err, IdentityError::NotFound("Group 'ghosts'".to_string()));
    }

    #[tokio::test]
    async fn test_get_group_windows_listing_gets_members() {
        let executor = Arc::new(
            ScriptedExecutor::new()
                .on(
                    "Get-LocalGroupMember",
                    CommandResult::completed("HOST\\alice\r\nHOST\\bob", "", 0),
                )
                .on(
                    "Get-LocalGroup -Name",
                    CommandResult::completed(
                        "Name  Description GroupCategory SID\n----  ----------- ------------- ---\nDevs  Developers  Security      S-1-5-21-9-1010",
                        "",
                        0,
                    ),
                ),
        );
        let group = service(executor, Platform::Windows)
            .get_group("Devs")
            .await
            .unwrap();

        match group {
            GroupRecord::Listing { sid, members, .. } => {
                assert_eq!(sid, "S-1-5-21-9-1010");
                assert_eq!(
                    members,
                    Some(vec!["HOST\\alice".to_string(), "HOST\\bob".to_string()])
                );
            }
            other => panic!("unexpected record: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_and_delete_group() {
        let executor = Arc::new(ScriptedExecutor::new().on(
            "groupdel",
            CommandResult::completed("", "groupdel: cannot remove the primary group of user 'alice'", 8),
        ));
        let svc = service(executor.clone(), Platform::Posix);

        let created = svc.create_group("devs").await.unwrap();
        assert_eq!(created.status_code, STATUS_OK);
        assert_eq!(created.message, "The group devs was successfully created.");

        let deleted = svc.delete_group("devs").await.unwrap();
        assert_eq!(deleted.status_code, STATUS_FAILED);
        assert_eq!(deleted.message, "Failed to delete the group devs.");

        assert_eq!(executor.calls(), vec!["groupadd 'devs'", "groupdel 'devs'"]);
    }

    #[tokio::test]
    async fn test_member_delegation() {
        let executor = Arc::new(ScriptedExecutor::new());
        let svc = service(executor.clone(), Platform::Posix);

        assert!(svc.add_member("devs", "alice").await.unwrap().is_success());
        assert!(svc.remove_member("devs", "alice").await.unwrap().is_success());
        assert_eq!(
            executor.calls(),
            vec!["usermod -aG 'devs' 'alice'", "gpasswd -d 'alice' 'devs'"]
        );
    }
}
