//! 核心数据类型定义
//!
//! 定义应用程序中使用的所有核心数据结构和枚举

use chrono::Duration;
use std::fmt;

/// 窗口可见性
///
/// `Hidden` 意味着托盘图标正在接管交互
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowVisibility {
    /// 主窗口可见
    #[default]
    Visible,
    /// 主窗口已隐藏到托盘
    Hidden,
}

/// 关机动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownAction {
    /// 在指定秒数后关机
    Schedule { seconds: u64 },
    /// 取消待执行的关机
    Abort,
}

impl fmt::Display for ShutdownAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownAction::Schedule { seconds } => write!(f, "{}秒后关机", seconds),
            ShutdownAction::Abort => write!(f, "取消关机"),
        }
    }
}

/// 操作系统关机命令风格
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownFlavor {
    /// `shutdown /s /t <秒>` 与 `shutdown /a`
    Windows,
    /// `shutdown -h +<分钟>` 与 `shutdown -c`
    Linux,
    /// `shutdown -h +<分钟>` 与 `killall shutdown`
    MacOs,
}

impl ShutdownFlavor {
    /// 当前编译目标对应的命令风格
    pub fn current() -> Self {
        if cfg!(windows) {
            ShutdownFlavor::Windows
        } else if cfg!(target_os = "macos") {
            ShutdownFlavor::MacOs
        } else {
            ShutdownFlavor::Linux
        }
    }
}

/// 倒计时显示状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownDisplay {
    /// 没有活动的定时
    Inactive,
    /// 剩余时间（可能为负数，渲染时会截断为 0s）
    Remaining(Duration),
}

impl fmt::Display for CountdownDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountdownDisplay::Inactive => write!(f, "未设置定时"),
            CountdownDisplay::Remaining(remaining) => {
                if remaining.num_milliseconds() < 0 {
                    return write!(f, "0s");
                }

                let total_seconds = remaining.num_seconds();
                let hours = total_seconds / 3600;
                let minutes = (total_seconds % 3600) / 60;
                let seconds = total_seconds % 60;

                write!(f, "{}:{:02}:{:02}", hours, minutes, seconds)
            }
        }
    }
}

/// 托盘菜单动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayAction {
    /// 显示主窗口
    Open,
    /// 取消关机
    Cancel,
    /// 取消关机并退出
    Quit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown_display_formatting() {
        let display = CountdownDisplay::Remaining(Duration::seconds(5399));
        assert_eq!(display.to_string(), "1:29:59");

        let display = CountdownDisplay::Remaining(Duration::seconds(59));
        assert_eq!(display.to_string(), "0:00:59");

        // 超过一天不折叠
        let display = CountdownDisplay::Remaining(Duration::hours(25));
        assert_eq!(display.to_string(), "25:00:00");
    }

    #[test]
    fn test_negative_remaining_is_floored() {
        let display = CountdownDisplay::Remaining(Duration::milliseconds(-1));
        assert_eq!(display.to_string(), "0s");

        let display = CountdownDisplay::Remaining(Duration::hours(-3));
        assert_eq!(display.to_string(), "0s");
    }

    #[test]
    fn test_inactive_display() {
        assert_eq!(CountdownDisplay::Inactive.to_string(), "未设置定时");
    }

    #[test]
    fn test_current_flavor_matches_target() {
        let flavor = ShutdownFlavor::current();
        if cfg!(windows) {
            assert_eq!(flavor, ShutdownFlavor::Windows);
        } else {
            assert_ne!(flavor, ShutdownFlavor::Windows);
        }
    }
}
