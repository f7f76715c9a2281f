//! 用户组管理 API
//!
//! 包含 /api/groups, /api/group/* 端点

use axum::{
    extract::{Path, State},
    response::Response,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::with_status;
use crate::domain::GroupRecord;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// 用户组请求体
#[derive(Debug, Default, Deserialize)]
pub struct GroupInfo {
    /// 组名
    #[serde(default)]
    pub groupname: String,
}

/// 用户组列表响应
#[derive(Debug, Serialize)]
pub struct GroupsResponse {
    pub groups: BTreeMap<String, GroupRecord>,
}

/// 创建用户组管理路由
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/groups", get(list_groups))
        .route("/api/group/add", post(add_group))
        .route("/api/group/del", delete(delete_group))
        .route("/api/group/:group", get(get_group))
}

/// 列出全部用户组
///
/// GET /api/groups
async fn list_groups(State(state): State<Arc<AppState>>) -> ApiResult<Json<GroupsResponse>> {
    let groups = state.groups.list_groups().await?;
    Ok(Json(GroupsResponse { groups }))
}

/// 查询单个用户组（含成员）
///
/// GET /api/group/:group
async fn get_group(
    State(state): State<Arc<AppState>>,
    Path(group): Path<String>,
) -> ApiResult<Json<GroupRecord>> {
    let group = state.groups.get_group(&group).await?;
    Ok(Json(group))
}

/// 创建用户组
///
/// POST /api/group/add
async fn add_group(
    State(state): State<Arc<AppState>>,
    Json(info): Json<GroupInfo>,
) -> ApiResult<Response> {
    let groupname = require_groupname(&info)?;
    let outcome = state.groups.create_group(groupname).await?;
    Ok(with_status(outcome.status_code, outcome))
}

/// 删除用户组
///
/// DELETE /api/group/del
async fn delete_group(
    State(state): State<Arc<AppState>>,
    Json(info): Json<GroupInfo>,
) -> ApiResult<Response> {
    let groupname = require_groupname(&info)?;
    let outcome = state.groups.delete_group(groupname).await?;
    Ok(with_status(outcome.status_code, outcome))
}

fn require_groupname(info: &GroupInfo) -> ApiResult<&str> {
    if info.groupname.is_empty() {
        return Err(ApiError::bad_request("Please provide a groupname"));
    }
    Ok(&info.groupname)
}
