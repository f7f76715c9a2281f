//! 平台命令集分发
//!
//! 启动时根据 `Platform` 选定一套命令（POSIX 或 Windows），在服务生命周期内不变。
//! 无法识别的平台不会执行任何命令，直接返回 `UnsupportedPlatform`

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::records::{
    parse_group_db, parse_group_line, parse_group_listing, parse_member_field,
    parse_member_lines, parse_passwd, parse_passwd_line, parse_user_listing,
    parse_user_listing_line,
};
use crate::domain::{GroupRecord, Platform, UserRecord};
use crate::error::{IdentityError, IdentityResult};
use crate::infra::{CommandResult, Executor};

/// 命令由哪个 shell 执行
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShellKind {
    /// 平台默认 shell（sh -c）
    Native,
    /// powershell -Command
    PowerShell,
}

/// 待执行的命令文本
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShellCommand {
    pub text: String,
    pub shell: ShellKind,
}

/// 具体命令集
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandSet {
    Posix,
    Windows,
}

impl CommandSet {
    /// 按平台选择命令集
    pub fn for_platform(platform: Platform) -> Option<Self> {
        match platform {
            Platform::Posix => Some(CommandSet::Posix),
            Platform::Windows => Some(CommandSet::Windows),
            Platform::Unsupported => None,
        }
    }

    fn command(&self, text: String) -> ShellCommand {
        let shell = match self {
            CommandSet::Posix => ShellKind::Native,
            CommandSet::Windows => ShellKind::PowerShell,
        };
        ShellCommand { text, shell }
    }

    fn quote(&self, value: &str) -> String {
        match self {
            CommandSet::Posix => sh_quote(value),
            CommandSet::Windows => ps_quote(value),
        }
    }

    // ========== 用户 ==========

    pub fn list_users(&self) -> ShellCommand {
        match self {
            CommandSet::Posix => self.command("cat /etc/passwd".to_string()),
            CommandSet::Windows => self.command(format!("Get-LocalUser | {}", USER_PROJECTION)),
        }
    }

    pub fn get_user(&self, username: &str) -> ShellCommand {
        let user = self.quote(username);
        match self {
            CommandSet::Posix => self.command(format!("getent passwd {}", user)),
            CommandSet::Windows => {
                self.command(format!("Get-LocalUser -Name {} | {}", user, USER_PROJECTION))
            }
        }
    }

    pub fn create_user(
        &self,
        username: &str,
        full_name: &str,
        home_dir: &str,
        shell: &str,
    ) -> ShellCommand {
        match self {
            CommandSet::Posix => self.command(format!(
                "useradd -m -s {} -c {} -d {} {}",
                self.quote(shell),
                self.quote(full_name),
                self.quote(home_dir),
                self.quote(username)
            )),
            CommandSet::Windows => self.command(format!(
                "New-LocalUser -Name {} -FullName {} -NoPassword",
                self.quote(username),
                self.quote(full_name)
            )),
        }
    }

    pub fn assign_password(&self, username: &str, password: &str) -> ShellCommand {
        match self {
            CommandSet::Posix => self.command(format!(
                "printf '%s\\n' {} | chpasswd",
                self.quote(&format!("{}:{}", username, password))
            )),
            CommandSet::Windows => self.command(format!(
                "Set-LocalUser -Name {} -Password (ConvertTo-SecureString {} -AsPlainText -Force)",
                self.quote(username),
                self.quote(password)
            )),
        }
    }

    pub fn delete_user(&self, username: &str) -> ShellCommand {
        let user = self.quote(username);
        match self {
            CommandSet::Posix => self.command(format!("userdel {}", user)),
            CommandSet::Windows => self.command(format!("Remove-LocalUser -Name {}", user)),
        }
    }

    /// 修改用户信息，home 与 shell 为空时不修改（Windows 不支持这两项）
    pub fn update_user(
        &self,
        username: &str,
        full_name: &str,
        home_dir: Option<&str>,
        shell: Option<&str>,
    ) -> ShellCommand {
        match self {
            CommandSet::Posix => {
                let mut command = format!("usermod -c {}", self.quote(full_name));
                if let Some(home) = home_dir.filter(|h| !h.is_empty()) {
                    command.push_str(&format!(" -d {}", self.quote(home)));
                }
                if let Some(shell) = shell.filter(|s| !s.is_empty()) {
                    command.push_str(&format!(" -s {}", self.quote(shell)));
                }
                command.push_str(&format!(" {}", self.quote(username)));
                self.command(command)
            }
            CommandSet::Windows => self.command(format!(
                "Set-LocalUser -Name {} -FullName {}",
                self.quote(username),
                self.quote(full_name)
            )),
        }
    }

    /// 解析用户列表输出
    pub fn parse_users(&self, output: &str) -> BTreeMap<String, UserRecord> {
        match self {
            CommandSet::Posix => parse_passwd(output),
            CommandSet::Windows => parse_user_listing(output),
        }
    }

    /// 解析单用户查询输出
    pub fn parse_user(&self, output: &str) -> Option<UserRecord> {
        let line = output.lines().find(|l| !l.trim().is_empty())?;
        match self {
            CommandSet::Posix => parse_passwd_line(line),
            CommandSet::Windows => parse_user_listing_line(line),
        }
    }

    // ========== 用户组 ==========

    pub fn list_groups(&self) -> ShellCommand {
        match self {
            CommandSet::Posix => self.command("cat /etc/group".to_string()),
            CommandSet::Windows => self.command(format!("Get-LocalGroup | {}", GROUP_PROJECTION)),
        }
    }

    pub fn get_group(&self, group: &str) -> ShellCommand {
        let group = self.quote(group);
        match self {
            CommandSet::Posix => self.command(format!("getent group {}", group)),
            CommandSet::Windows => {
                self.command(format!("Get-LocalGroup -Name {} | {}", group, GROUP_PROJECTION))
            }
        }
    }

    pub fn create_group(&self, group: &str) -> ShellCommand {
        let group = self.quote(group);
        match self {
            CommandSet::Posix => self.command(format!("groupadd {}", group)),
            CommandSet::Windows => self.command(format!("New-LocalGroup -Name {}", group)),
        }
    }

    pub fn delete_group(&self, group: &str) -> ShellCommand {
        let group = self.quote(group);
        match self {
            CommandSet::Posix => self.command(format!("groupdel {}", group)),
            CommandSet::Windows => self.command(format!("Remove-LocalGroup -Name {}", group)),
        }
    }

    /// 解析组列表输出
    pub fn parse_groups(&self, output: &str) -> BTreeMap<String, GroupRecord> {
        match self {
            CommandSet::Posix => parse_group_db(output),
            CommandSet::Windows => parse_group_listing(output),
        }
    }

    /// 解析单组查询输出
    pub fn parse_group(&self, output: &str) -> Option<GroupRecord> {
        match self {
            CommandSet::Posix => output
                .lines()
                .find(|l| !l.trim().is_empty())
                .and_then(parse_group_line),
            CommandSet::Windows => parse_group_listing(output).into_values().next(),
        }
    }

    // ========== 成员 ==========

    pub fn get_members(&self, group: &str) -> ShellCommand {
        let group = self.quote(group);
        match self {
            CommandSet::Posix => self.command(format!("getent group {}", group)),
            CommandSet::Windows => self.command(format!(
                "Get-LocalGroupMember -Group {} | ForEach-Object {{ $_.Name }}",
                group
            )),
        }
    }

    pub fn add_member(&self, group: &str, username: &str) -> ShellCommand {
        match self {
            CommandSet::Posix => self.command(format!(
                "usermod -aG {} {}",
                self.quote(group),
                self.quote(username)
            )),
            CommandSet::Windows => self.command(format!(
                "Add-LocalGroupMember -Group {} -Member {}",
                self.quote(group),
                self.quote(username)
            )),
        }
    }

    pub fn remove_member(&self, group: &str, username: &str) -> ShellCommand {
        match self {
            CommandSet::Posix => self.command(format!(
                "gpasswd -d {} {}",
                self.quote(username),
                self.quote(group)
            )),
            CommandSet::Windows => self.command(format!(
                "Remove-LocalGroupMember -Group {} -Member {}",
                self.quote(group),
                self.quote(username)
            )),
        }
    }

    /// 解析成员查询输出；格式不符时返回空列表
    pub fn parse_members(&self, output: &str) -> Vec<String> {
        match self {
            CommandSet::Posix => {
                let Some(line) = output.lines().find(|l| !l.trim().is_empty()) else {
                    return Vec::new();
                };
                let parts: Vec<&str> = line.split(':').collect();
                if parts.len() < 4 {
                    return Vec::new();
                }
                parse_member_field(parts[3])
            }
            CommandSet::Windows => parse_member_lines(output),
        }
    }

    /// 查询结果是否表示“记录不存在”
    ///
    /// getent 对不存在的键返回退出码 2
    pub fn is_missing(&self, result: &CommandResult) -> bool {
        if result.is_fault() {
            return false;
        }
        match self {
            CommandSet::Posix => result.exit_status == 2,
            CommandSet::Windows => {
                result.exit_status != 0 && result.stderr.to_lowercase().contains("was not found")
            }
        }
    }
}

/// Windows 用户投影为 `Name|SID|FullName`
const USER_PROJECTION: &str = "ForEach-Object { $_.Name + '|' + $_.SID + '|' + $_.FullName }";

/// Windows 组列表列
const GROUP_PROJECTION: &str = "Select-Object Name, Description, GroupCategory, SID";

/// POSIX shell 单引号转义
pub fn sh_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

/// PowerShell 单引号转义
pub fn ps_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// 命令执行后端
///
/// 组合执行器、平台命令集和超时，供各服务共享
#[derive(Clone)]
pub struct Backend {
    executor: Arc<dyn Executor>,
    platform: Platform,
    commands: Option<CommandSet>,
    timeout: Duration,
}

impl Backend {
    pub fn new(executor: Arc<dyn Executor>, platform: Platform, timeout: Duration) -> Self {
        Self {
            executor,
            platform,
            commands: CommandSet::for_platform(platform),
            timeout,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// 当前平台的命令集
    pub fn commands(&self) -> IdentityResult<CommandSet> {
        self.commands
            .ok_or_else(|| IdentityError::UnsupportedPlatform(self.platform.to_string()))
    }

    /// 执行命令，超时由配置决定
    pub async fn run(&self, command: &ShellCommand) -> CommandResult {
        match command.shell {
            ShellKind::Native => self.executor.execute(&command.text, self.timeout).await,
            ShellKind::PowerShell => {
                self.executor
                    .execute_powershell(&command.text, self.timeout)
                    .await
            }
        }
    }
}
