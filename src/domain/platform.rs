//! 平台标识

use serde::Serialize;

/// 操作系统平台
///
/// 启动时确定一次，之后以值的形式传给各个服务
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Linux / macOS 等 POSIX 系统
    Posix,
    /// Windows
    Windows,
    /// 无法识别的平台
    Unsupported,
}

impl Platform {
    /// 检测当前运行的平台
    pub fn detect() -> Self {
        Self::from_os_name(std::env::consts::OS)
    }

    /// 从操作系统名解析（兼容 `std::env::consts::OS` 与人工配置）
    pub fn from_os_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "linux" | "macos" | "darwin" | "posix" | "freebsd" | "netbsd" | "openbsd" => {
                Platform::Posix
            }
            "windows" | "win32" | "win" => Platform::Windows,
            _ => Platform::Unsupported,
        }
    }

    /// 转换为字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Posix => "posix",
            Platform::Windows => "windows",
            Platform::Unsupported => "unsupported",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
