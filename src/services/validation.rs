//! 输入校验
//!
//! 在执行任何命令之前拒绝非法输入。
//! `^` 会被执行器当作空白处理，因此一律拒绝

use crate::error::{IdentityError, IdentityResult};

const MAX_NAME_LEN: usize = 256;

/// 用户名 / 组名
pub fn validate_name(kind: &str, value: &str) -> IdentityResult<()> {
    if value.trim().is_empty() {
        return Err(IdentityError::malformed(format!("{} is required", kind)));
    }
    if value.len() > MAX_NAME_LEN {
        return Err(IdentityError::malformed(format!("{} is too long", kind)));
    }
    if value.starts_with('-') {
        return Err(IdentityError::malformed(format!(
            "{} must not start with '-'",
            kind
        )));
    }
    if value
        .chars()
        .any(|c| c.is_control() || matches!(c, ':' | ',' | '^'))
    {
        return Err(IdentityError::malformed(format!(
            "{} contains forbidden characters",
            kind
        )));
    }
    Ok(())
}

/// 全名、home、shell 等写入账户数据库的自由文本字段
pub fn validate_field(kind: &str, value: &str) -> IdentityResult<()> {
    if value.chars().any(|c| c.is_control() || matches!(c, ':' | '^')) {
        return Err(IdentityError::malformed(format!(
            "{} contains forbidden characters",
            kind
        )));
    }
    Ok(())
}

pub fn validate_password(value: &str) -> IdentityResult<()> {
    if value.is_empty() {
        return Err(IdentityError::malformed("password must not be empty"));
    }
    if value.chars().any(|c| c.is_control() || c == '^') {
        return Err(IdentityError::malformed(
            "password contains forbidden characters",
        ));
    }
    Ok(())
}
