//! 用户与用户组领域模型

use serde::{Deserialize, Serialize};

/// 用户账户记录
///
/// 每次查询都从系统账户数据库重新解析，不在本层持久化
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub uid: String,
    pub gid: String,
    pub full_name: String,
    pub home_dir: String,
    pub shell: String,
    /// 是否有该用户拥有的进程
    #[serde(default)]
    pub is_logged_in: bool,
}

/// 用户组记录
///
/// POSIX 组数据库与 Windows 组列表的列结构不同，两种形态共享 `name()` / `members()`
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupRecord {
    /// /etc/group 行
    Posix {
        name: String,
        gid: String,
        members: Vec<String>,
    },
    /// Get-LocalGroup 列表行（没有成员列，需单独查询）
    Listing {
        name: String,
        description: String,
        category: String,
        sid: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        members: Option<Vec<String>>,
    },
}

impl GroupRecord {
    pub fn name(&self) -> &str {
        match self {
            GroupRecord::Posix { name, .. } | GroupRecord::Listing { name, .. } => name,
        }
    }

    /// 成员列表（列表形态在未解析成员前为 None）
    pub fn members(&self) -> Option<&[String]> {
        match self {
            GroupRecord::Posix { members, .. } => Some(members),
            GroupRecord::Listing { members, .. } => members.as_deref(),
        }
    }

    /// 用单独查询得到的成员覆盖记录中的成员列
    pub fn with_members(self, resolved: Vec<String>) -> Self {
        match self {
            GroupRecord::Posix { name, gid, .. } => GroupRecord::Posix {
                name,
                gid,
                members: resolved,
            },
            GroupRecord::Listing {
                name,
                description,
                category,
                sid,
                ..
            } => GroupRecord::Listing {
                name,
                description,
                category,
                sid,
                members: Some(resolved),
            },
        }
    }
}
