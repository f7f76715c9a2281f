//! 健康检查 API
//!
//! 包含 /health, /status 端点

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;

use crate::config::env::constants::VERSION;
use crate::domain::Platform;
use crate::state::AppState;

/// 健康检查响应
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    platform: Platform,
    timestamp: String,
    started_at: String,
    uptime: String,
    command_timeout_secs: u64,
}

/// 创建健康检查路由
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/status", get(health_check))
}

/// 健康检查 - 返回状态、版本、平台、运行时间
///
/// GET /health, GET /status
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let uptime_secs = (now - state.started_at).num_seconds();

    Json(HealthResponse {
        status: if state.platform() == Platform::Unsupported {
            "degraded"
        } else {
            "ok"
        },
        service: "xjp-identity-agent",
        version: VERSION,
        platform: state.platform(),
        timestamp: now.to_rfc3339(),
        started_at: state.started_at.to_rfc3339(),
        uptime: format_uptime(uptime_secs),
        command_timeout_secs: state.config.command_timeout.as_secs(),
    })
}

fn format_uptime(secs: i64) -> String {
    format!(
        "{}d {}h {}m {}s",
        secs / 86400,
        (secs % 86400) / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}
