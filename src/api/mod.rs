//! API 模块
//!
//! HTTP handlers 和路由组装。只做参数校验与状态码映射，业务逻辑在 services 中

pub mod groups;
pub mod health;
pub mod members;
pub mod users;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// 构建完整的 API 路由
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health
        .merge(health::router())
        // Users
        .merge(users::router())
        // Groups
        .merge(groups::router())
        // Members
        .merge(members::router())
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// 以结果中的状态码作为 HTTP 状态返回
pub(crate) fn with_status<T: Serialize>(status_code: u16, body: T) -> Response {
    let status = StatusCode::from_u16(status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(body)).into_response()
}
