//! 窗口/托盘呈现状态
//!
//! 管理“最小化到托盘”策略：置顶窗口视为用户正在关注，不自动隐藏；
//! 托盘图标只创建一次，之后一直保留到进程退出。

use log::info;

use crate::core::types::WindowVisibility;

/// 呈现状态变化
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationChange {
    /// 保持现状
    Unchanged,
    /// 隐藏窗口并显示托盘
    HideToTray { create_tray: bool },
    /// 托盘不可用时退化为普通最小化
    MinimizeWindow,
}

/// 呈现状态
#[derive(Debug, Clone)]
pub struct Presentation {
    visibility: WindowVisibility,
    always_on_top: bool,
    tray_available: bool,
    tray_created: bool,
}

impl Presentation {
    /// 创建呈现状态
    ///
    /// # 参数
    ///
    /// * `tray_available` - 当前平台是否支持托盘
    pub fn new(tray_available: bool) -> Self {
        Self {
            visibility: WindowVisibility::Visible,
            always_on_top: false,
            tray_available,
            tray_created: false,
        }
    }

    pub fn visibility(&self) -> WindowVisibility {
        self.visibility
    }

    pub fn always_on_top(&self) -> bool {
        self.always_on_top
    }

    pub fn tray_created(&self) -> bool {
        self.tray_created
    }

    /// 切换窗口置顶，不影响定时器
    pub fn set_always_on_top(&mut self, enabled: bool) {
        self.always_on_top = enabled;
    }

    /// 设置关机后的呈现策略
    pub fn after_schedule(&mut self) -> PresentationChange {
        if self.always_on_top {
            info!("窗口置顶中，不最小化到托盘");
            return PresentationChange::Unchanged;
        }
        self.minimize()
    }

    /// 隐藏到托盘（开机自启时直接调用）
    pub fn minimize(&mut self) -> PresentationChange {
        if !self.tray_available {
            return PresentationChange::MinimizeWindow;
        }

        self.visibility = WindowVisibility::Hidden;
        let create_tray = !self.tray_created;
        self.tray_created = true;
        PresentationChange::HideToTray { create_tray }
    }

    /// 托盘处理失败时回退为可见
    pub fn tray_failed(&mut self) {
        self.tray_available = false;
        self.tray_created = false;
        self.visibility = WindowVisibility::Visible;
    }

    /// 从托盘恢复窗口
    pub fn restore(&mut self) {
        self.visibility = WindowVisibility::Visible;
    }
}
