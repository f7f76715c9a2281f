//! 用户账户服务
//!
//! 查询、创建、删除、修改本地用户。账户数据库是唯一数据源，每次查询都重新读取

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use super::outcome_from;
use super::platform::Backend;
use super::session::LoginProbe;
use super::validation::{validate_field, validate_name, validate_password};
use crate::domain::{AccountOutcome, OperationOutcome, UserRecord};
use crate::error::{IdentityError, IdentityResult};

/// 创建用户请求
///
/// home 目录默认值由调用方填充
#[derive(Clone, Debug, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub full_name: String,
    pub home_dir: String,
    pub shell: String,
    #[serde(default)]
    pub password: Option<String>,
}

/// 修改用户请求，空字段不修改
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UserUpdate {
    pub username: String,
    pub full_name: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub home_dir: Option<String>,
    #[serde(default)]
    pub shell: Option<String>,
}

/// 用户服务
#[derive(Clone)]
pub struct UserService {
    backend: Backend,
    probe: Arc<dyn LoginProbe>,
}

impl UserService {
    pub fn new(backend: Backend, probe: Arc<dyn LoginProbe>) -> Self {
        Self { backend, probe }
    }

    /// 查询单个用户
    pub async fn get_user(&self, username: &str) -> IdentityResult<UserRecord> {
        validate_name("username", username)?;
        let commands = self.backend.commands()?;

        let result = self.backend.run(&commands.get_user(username)).await;
        if !result.is_success() {
            if commands.is_missing(&result) {
                return Err(IdentityError::NotFound(format!("User '{}'", username)));
            }
            return Err(IdentityError::from_command(&result));
        }

        let mut user = commands
            .parse_user(&result.stdout)
            .ok_or_else(|| IdentityError::NotFound(format!("User '{}'", username)))?;
        user.is_logged_in = self.is_logged_in(&user.username).await;
        Ok(user)
    }

    /// 列出全部用户
    ///
    /// 命令失败时返回错误，不返回部分结果
    pub async fn list_users(&self) -> IdentityResult<BTreeMap<String, UserRecord>> {
        let commands = self.backend.commands()?;

        let result = self.backend.run(&commands.list_users()).await;
        if !result.is_success() {
            warn!(exit_status = result.exit_status, stderr = %result.stderr, "Failed to list users");
            return Err(IdentityError::from_command(&result));
        }

        let mut users = commands.parse_users(&result.stdout);
        let online = self.logged_in_users().await;
        for user in users.values_mut() {
            user.is_logged_in = online.contains(&user.username);
        }
        Ok(users)
    }

    /// 创建用户账户（不含密码）
    pub async fn create_user(
        &self,
        username: &str,
        full_name: &str,
        home_dir: &str,
        shell: &str,
    ) -> IdentityResult<OperationOutcome> {
        validate_name("username", username)?;
        validate_field("full name", full_name)?;
        validate_field("home directory", home_dir)?;
        validate_field("shell", shell)?;
        let commands = self.backend.commands()?;

        let command = commands.create_user(username, full_name, home_dir, shell);
        let result = self.backend.run(&command).await;

        let summary = format!(
            "{}: full_name: {}, homedir: {}, shell: {}",
            username, full_name, home_dir, shell
        );
        let outcome = outcome_from(
            result,
            format!("User {} created successfully", summary),
            format!("User {} was not created", summary),
        );
        info!(username = %username, status = outcome.status_code, "Create user");
        Ok(outcome)
    }

    /// 创建用户并（可选）设置密码
    ///
    /// 两步互相独立：账户创建成功但密码失败时，账户不会回滚，
    /// 顶层状态取密码步骤的状态
    pub async fn create_account(&self, request: &NewUser) -> IdentityResult<AccountOutcome> {
        let password = request.password.as_deref().filter(|p| !p.is_empty());
        if let Some(password) = password {
            validate_password(password)?;
        }

        let created = self
            .create_user(
                &request.username,
                &request.full_name,
                &request.home_dir,
                &request.shell,
            )
            .await?;

        let Some(password) = password else {
            return Ok(AccountOutcome {
                account_changed: created.is_success(),
                outcome: created,
                password_assigned: None,
            });
        };

        // 账户未创建时不尝试设置密码
        if !created.is_success() {
            return Ok(AccountOutcome {
                outcome: created,
                account_changed: false,
                password_assigned: None,
            });
        }

        let assigned = self.assign_password(&request.username, password).await?;
        if assigned.is_success() {
            let outcome = OperationOutcome {
                message: format!("User {} created with password", request.username),
                ..created
            };
            return Ok(AccountOutcome {
                outcome,
                account_changed: true,
                password_assigned: Some(true),
            });
        }

        warn!(username = %request.username, "User created but password was not set");
        Ok(AccountOutcome {
            outcome: OperationOutcome::new(
                assigned.status_code,
                format!(
                    "User {} was created but the password was not set",
                    request.username
                ),
                created.stdout,
                assigned.stderr,
            ),
            account_changed: true,
            password_assigned: Some(false),
        })
    }

    /// 删除用户
    pub async fn delete_user(&self, username: &str) -> IdentityResult<OperationOutcome> {
        validate_name("username", username)?;
        let commands = self.backend.commands()?;

        let result = self.backend.run(&commands.delete_user(username)).await;
        let outcome = outcome_from(
            result,
            format!("User {} was deleted successfully", username),
            format!("User {} was not deleted", username),
        );
        info!(username = %username, status = outcome.status_code, "Delete user");
        Ok(outcome)
    }

    /// 修改用户信息
    ///
    /// 密码先单独设置，再执行账户修改命令；home / shell 为空时不修改
    pub async fn update_user(&self, request: &UserUpdate) -> IdentityResult<AccountOutcome> {
        let username = request.username.as_str();
        validate_name("username", username)?;
        validate_field("full name", &request.full_name)?;
        if let Some(home) = &request.home_dir {
            validate_field("home directory", home)?;
        }
        if let Some(shell) = &request.shell {
            validate_field("shell", shell)?;
        }
        let password = request.password.as_deref().filter(|p| !p.is_empty());
        if let Some(password) = password {
            validate_password(password)?;
        }
        let commands = self.backend.commands()?;

        let assigned = match password {
            Some(password) => Some(self.assign_password(username, password).await?),
            None => None,
        };

        let command = commands.update_user(
            username,
            &request.full_name,
            request.home_dir.as_deref(),
            request.shell.as_deref(),
        );
        let result = self.backend.run(&command).await;
        let updated = outcome_from(
            result,
            format!("User {} information updated successfully.", username),
            format!("Failed to update user {} information.", username),
        );
        info!(username = %username, status = updated.status_code, "Update user");

        let account_changed = updated.is_success();
        let password_assigned = assigned.as_ref().map(OperationOutcome::is_success);
        let outcome = match assigned {
            Some(assigned) if updated.is_success() && !assigned.is_success() => {
                OperationOutcome::new(
                    assigned.status_code,
                    format!(
                        "User {} information updated but the password was not changed.",
                        username
                    ),
                    updated.stdout,
                    assigned.stderr,
                )
            }
            _ => updated,
        };

        Ok(AccountOutcome {
            outcome,
            account_changed,
            password_assigned,
        })
    }

    /// 设置用户密码
    pub async fn assign_password(
        &self,
        username: &str,
        password: &str,
    ) -> IdentityResult<OperationOutcome> {
        validate_name("username", username)?;
        validate_password(password)?;
        let commands = self.backend.commands()?;

        let result = self
            .backend
            .run(&commands.assign_password(username, password))
            .await;
        let outcome = outcome_from(
            result,
            "The password was changed successfully".to_string(),
            "The password was not changed".to_string(),
        );
        info!(username = %username, status = outcome.status_code, "Assign password");
        Ok(outcome)
    }

    /// 用户是否有正在运行的进程
    pub async fn is_logged_in(&self, username: &str) -> bool {
        self.logged_in_users().await.contains(username)
    }

    /// 扫描进程表（阻塞操作放到 blocking 线程）
    async fn logged_in_users(&self) -> HashSet<String> {
        let probe = self.probe.clone();
        match tokio::task::spawn_blocking(move || probe.logged_in_users()).await {
            Ok(users) => users,
            Err(e) => {
                warn!(error = %e, "Process table scan failed");
                HashSet::new()
            }
        }
    }
}
