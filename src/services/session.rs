//! 登录状态检测
//!
//! 通过进程表判断用户是否在线：存在该用户拥有的进程即视为已登录。
//! 无法读取所有者的进程（权限不足、扫描期间退出）按不匹配处理，继续扫描

use std::collections::HashSet;

use sysinfo::{ProcessRefreshKind, RefreshKind, System, UpdateKind, Users};

/// 进程所有者来源
pub trait LoginProbe: Send + Sync {
    /// 当前所有进程的所有者，无法检查的进程为 None
    fn process_owners(&self) -> Vec<Option<String>>;

    /// 用户是否拥有任一进程
    fn is_logged_in(&self, username: &str) -> bool {
        owner_matches(self.process_owners(), username)
    }

    /// 拥有进程的全部用户名（一次快照）
    fn logged_in_users(&self) -> HashSet<String> {
        self.process_owners().into_iter().flatten().collect()
    }
}

/// 扫描所有者序列，遇到无法检查的条目跳过而不是提前返回
pub fn owner_matches<I>(owners: I, username: &str) -> bool
where
    I: IntoIterator<Item = Option<String>>,
{
    owners
        .into_iter()
        .any(|owner| owner.as_deref() == Some(username))
}

/// 基于 sysinfo 的进程表
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessTable;

impl LoginProbe for ProcessTable {
    fn process_owners(&self) -> Vec<Option<String>> {
        let sys = System::new_with_specifics(
            RefreshKind::new()
                .with_processes(ProcessRefreshKind::new().with_user(UpdateKind::Always)),
        );
        let users = Users::new_with_refreshed_list();

        sys.processes()
            .values()
            .map(|process| {
                process
                    .user_id()
                    .and_then(|uid| users.get_user_by_id(uid))
                    .map(|user| user.name().to_string())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::FixedOwners;

    #[test]
    fn test_scan_continues_past_uninspectable_process() {
        let owners = vec![None, Some("root".to_string()), None, Some("alice".to_string())];
        assert!(owner_matches(owners.clone(), "alice"));
        assert!(!owner_matches(owners, "bob"));
    }

    #[test]
    fn test_logged_in_users_snapshot() {
        let probe = FixedOwners(vec![
            Some("root".to_string()),
            None,
            Some("alice".to_string()),
            Some("alice".to_string()),
        ]);
        let users = probe.logged_in_users();
        assert_eq!(users.len(), 2);
        assert!(users.contains("alice"));
        assert!(probe.is_logged_in("root"));
        assert!(!probe.is_logged_in("carol"));
    }

    #[test]
    fn test_process_table_sees_some_process() {
        // 当前测试进程自身就在进程表中
        let owners = ProcessTable.process_owners();
        assert!(!owners.is_empty());
    }
}
