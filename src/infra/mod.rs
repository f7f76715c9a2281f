//! 基础设施模块
//!
//! 封装外部依赖（系统命令执行）

pub mod command;

pub use command::{CommandResult, CommandRunner, ExecFault, Executor};
