//! 用户管理 API
//!
//! 包含 /api/users, /api/user/* 端点

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::with_status;
use crate::domain::UserRecord;
use crate::error::{ApiError, ApiResult};
use crate::services::{NewUser, UserUpdate};
use crate::state::AppState;

/// 用户请求体
#[derive(Debug, Default, Deserialize)]
pub struct UserInfo {
    /// 全名
    #[serde(default)]
    pub fullname: String,
    /// 用户名（创建时必填）
    #[serde(default)]
    pub username: String,
    /// 密码（可选）
    #[serde(default)]
    pub passwd: String,
    /// home 目录，为空时使用默认值
    #[serde(default)]
    pub homedir: String,
    /// 登录 shell，为空时使用默认值
    #[serde(default)]
    pub shell: String,
}

/// 用户列表响应
#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: BTreeMap<String, UserRecord>,
}

/// 创建用户管理路由
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users", get(list_users))
        .route("/api/user/add", post(add_user))
        .route(
            "/api/user/:user",
            get(get_user).delete(delete_user).put(update_user),
        )
}

/// 列出全部用户
///
/// GET /api/users
async fn list_users(State(state): State<Arc<AppState>>) -> ApiResult<Json<UsersResponse>> {
    let users = state.users.list_users().await?;
    Ok(Json(UsersResponse { users }))
}

/// 查询单个用户
///
/// GET /api/user/:user
async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
) -> ApiResult<Json<UserRecord>> {
    let user = state.users.get_user(&user).await?;
    Ok(Json(user))
}

/// 创建用户
///
/// POST /api/user/add
async fn add_user(
    State(state): State<Arc<AppState>>,
    Json(info): Json<UserInfo>,
) -> ApiResult<Response> {
    if info.username.is_empty() {
        return Err(ApiError::bad_request("Please provide a username for the user."));
    }

    let request = build_new_user(&state, info);
    tracing::info!(username = %request.username, home_dir = %request.home_dir, "Creating user");

    let result = state.users.create_account(&request).await?;
    Ok(with_status(result.outcome.status_code, result))
}

/// 删除用户
///
/// DELETE /api/user/:user
async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let outcome = state.users.delete_user(&user).await?;
    Ok(with_status(outcome.status_code, outcome))
}

/// 修改用户
///
/// PUT /api/user/:user
async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
    Json(info): Json<UserInfo>,
) -> ApiResult<Response> {
    if info.fullname.is_empty() {
        return Err(ApiError::bad_request("Please provide a full name for the user."));
    }

    let request = UserUpdate {
        username: user,
        full_name: info.fullname,
        password: non_empty(info.passwd),
        home_dir: non_empty(info.homedir),
        shell: non_empty(info.shell),
    };
    let result = state.users.update_user(&request).await?;
    Ok(with_status(result.outcome.status_code, result))
}

/// 按配置填充默认 home 与 shell
fn build_new_user(state: &AppState, info: UserInfo) -> NewUser {
    let home_dir = if info.homedir.is_empty() {
        state.config.default_home_dir(&info.username)
    } else {
        info.homedir
    };
    let shell = if info.shell.is_empty() {
        state.config.default_shell.clone()
    } else {
        info.shell
    };

    NewUser {
        username: info.username,
        full_name: info.fullname,
        home_dir,
        shell,
        password: non_empty(info.passwd),
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvConfig;
    use crate::domain::Platform;
    use crate::infra::CommandRunner;
    use crate::services::ProcessTable;

    fn state() -> AppState {
        let config = EnvConfig {
            platform: Platform::Posix,
            ..EnvConfig::default()
        };
        AppState::with_parts(config, Arc::new(CommandRunner::new()), Arc::new(ProcessTable))
    }

    #[test]
    fn test_user_info_defaults() {
        let info: UserInfo = serde_json::from_str(r#"{"username": "alice"}"#).unwrap();
        assert_eq!(info.username, "alice");
        assert!(info.fullname.is_empty());
        assert!(info.passwd.is_empty());
    }

    #[test]
    fn test_build_new_user_fills_defaults() {
        let info = UserInfo {
            username: "alice".to_string(),
            fullname: "Alice A".to_string(),
            ..Default::default()
        };
        let request = build_new_user(&state(), info);

        assert_eq!(request.home_dir, "/home/alice");
        assert_eq!(request.shell, "/bin/bash");
        assert_eq!(request.password, None);
    }

    #[test]
    fn test_build_new_user_keeps_explicit_values() {
        let info = UserInfo {
            username: "bob".to_string(),
            homedir: "/srv/bob".to_string(),
            shell: "/bin/zsh".to_string(),
            passwd: "hunter2".to_string(),
            ..Default::default()
        };
        let request = build_new_user(&state(), info);

        assert_eq!(request.home_dir, "/srv/bob");
        assert_eq!(request.shell, "/bin/zsh");
        assert_eq!(request.password.as_deref(), Some("hunter2"));
    }
}
