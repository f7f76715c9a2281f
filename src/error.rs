//! 统一错误处理
//!
//! - `IdentityError`：服务层错误分类（未找到 / 命令失败 / 执行器失败 / 输入无效 / 平台不支持）
//! - `ApiError`：实现 `IntoResponse`，供 HTTP 层映射状态码

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::infra::CommandResult;

/// 服务层错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IdentityError {
    /// 查询没有匹配的记录
    #[error("{0} not found")]
    NotFound(String),

    /// 命令已执行但退出码非零，stderr 原样保留
    #[error("Command failed with exit status {exit_status}: {stderr}")]
    OperationalFailure { stderr: String, exit_status: i32 },

    /// 命令未能执行（超时、无法启动）
    #[error("Command could not be executed: {stderr}")]
    ExecutorFault { stderr: String },

    /// 调用方缺少必填字段或字段非法，未执行任何命令
    #[error("Invalid input: {0}")]
    MalformedInput(String),

    /// 当前平台没有对应的命令集
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),
}

impl IdentityError {
    /// 将失败的命令结果归类为执行器失败或命令失败
    pub fn from_command(result: &CommandResult) -> Self {
        if result.is_fault() {
            IdentityError::ExecutorFault {
                stderr: result.stderr.clone(),
            }
        } else {
            IdentityError::OperationalFailure {
                stderr: result.stderr.clone(),
                exit_status: result.exit_status,
            }
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        IdentityError::MalformedInput(message.into())
    }
}

/// API 错误响应结构
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// 统一 API 错误类型
#[derive(Debug)]
pub enum ApiError {
    /// 404 - 资源未找到
    NotFound(String),
    /// 400 - 请求无效
    BadRequest(String),
    /// 500 - 命令失败，携带 stderr
    Internal(String),
    /// 501 - 平台不支持
    NotImplemented(String),
    /// 503 - 命令无法执行，携带执行器的错误文本
    ServiceUnavailable(String),
}

impl ApiError {
    /// 创建请求无效错误
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::NotFound(resource) => ApiError::NotFound(resource),
            IdentityError::MalformedInput(msg) => ApiError::BadRequest(msg),
            IdentityError::OperationalFailure { stderr, .. } => ApiError::Internal(stderr),
            IdentityError::ExecutorFault { stderr } => ApiError::ServiceUnavailable(stderr),
            IdentityError::UnsupportedPlatform(platform) => {
                ApiError::NotImplemented(format!("Unsupported platform: {}", platform))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::NotFound(resource) => {
                ErrorResponse::new("not_found", format!("{} not found", resource))
            }
            ApiError::BadRequest(msg) => ErrorResponse::new("bad_request", msg),
            ApiError::NotImplemented(msg) => ErrorResponse::new("not_implemented", msg),
            // 命令失败时 stderr 放入 details
            ApiError::Internal(stderr) => {
                ErrorResponse::new("internal_error", "Command failed").with_details(stderr)
            }
            ApiError::ServiceUnavailable(stderr) => {
                ErrorResponse::new("service_unavailable", "Command could not be executed")
                    .with_details(stderr)
            }
        };

        (status, Json(body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::NotFound(r) => write!(f, "Not found: {}", r),
            ApiError::BadRequest(m) => write!(f, "Bad request: {}", m),
            ApiError::Internal(m) => write!(f, "Internal error: {}", m),
            ApiError::NotImplemented(m) => write!(f, "Not implemented: {}", m),
            ApiError::ServiceUnavailable(m) => write!(f, "Service unavailable: {}", m),
        }
    }
}

impl std::error::Error for ApiError {}

/// 便捷类型别名
pub type ApiResult<T> = Result<T, ApiError>;

/// 服务层结果别名
pub type IdentityResult<T> = Result<T, IdentityError>;
