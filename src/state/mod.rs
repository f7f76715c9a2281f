//! 运行时状态模块
//!
//! 组装配置与各个服务

pub mod app_state;

pub use app_state::AppState;
