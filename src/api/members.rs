//! 组成员 API
//!
//! 包含 /api/member, /api/member/add, /api/member/del 端点

use axum::{
    extract::{Query, State},
    response::Response,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::with_status;
use crate::domain::MembershipAction;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// 成员查询参数
#[derive(Debug, Deserialize)]
pub struct MemberQuery {
    #[serde(default)]
    pub groupname: String,
}

/// 批量成员请求体
#[derive(Debug, Deserialize)]
pub struct MemberInfo {
    /// 组名
    #[serde(default)]
    pub groupname: String,
    /// 用户名列表
    #[serde(default)]
    pub users: Vec<String>,
}

/// 成员列表响应
#[derive(Debug, Serialize)]
pub struct MembersResponse {
    pub groupname: String,
    pub members: Vec<String>,
}

/// 创建组成员路由
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/member", get(get_members))
        .route("/api/member/add", post(add_members))
        .route("/api/member/del", delete(remove_members))
}

/// 查询组成员
///
/// GET /api/member?groupname=devs
async fn get_members(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MemberQuery>,
) -> ApiResult<Json<MembersResponse>> {
    if query.groupname.is_empty() {
        return Err(ApiError::bad_request(
            "Please provide a groupname for this group.",
        ));
    }

    let members = state.membership.get_members(&query.groupname).await;
    Ok(Json(MembersResponse {
        groupname: query.groupname,
        members,
    }))
}

/// 批量加入组
///
/// POST /api/member/add
async fn add_members(
    State(state): State<Arc<AppState>>,
    Json(info): Json<MemberInfo>,
) -> ApiResult<Response> {
    bulk(&state, info, MembershipAction::Add).await
}

/// 批量移出组
///
/// DELETE /api/member/del
async fn remove_members(
    State(state): State<Arc<AppState>>,
    Json(info): Json<MemberInfo>,
) -> ApiResult<Response> {
    bulk(&state, info, MembershipAction::Remove).await
}

async fn bulk(state: &AppState, info: MemberInfo, action: MembershipAction) -> ApiResult<Response> {
    if info.groupname.is_empty() {
        return Err(ApiError::bad_request(
            "Please provide a groupname for this group.",
        ));
    }

    tracing::info!(
        group = %info.groupname,
        action = action.as_str(),
        users = info.users.len(),
        "Bulk membership request"
    );
    let result = state
        .membership
        .bulk_apply(&info.groupname, &info.users, action)
        .await?;
    Ok(with_status(result.status_code, result))
}
