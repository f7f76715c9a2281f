//! 领域模型模块
//!
//! 纯数据结构与文本解析，不依赖 axum/tokio

pub mod account;
pub mod outcome;
pub mod platform;
pub mod records;

// Re-exports for convenience
pub use account::{GroupRecord, UserRecord};
pub use outcome::{
    AccountOutcome, BulkMembershipResult, MembershipAction, OperationOutcome, STATUS_EXECUTOR_FAULT,
    STATUS_FAILED, STATUS_OK,
};
pub use platform::Platform;
