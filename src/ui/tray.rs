//! 系统托盘模块
//!
//! 第一次最小化时创建托盘图标，之后一直保留到程序退出。
//! 菜单：打开、取消关机、退出。

use log::{info, warn};
use thiserror::Error;

use crate::core::types::{CountdownDisplay, TrayAction};
use crate::ui::icon::{self, IconImage};

/// 托盘错误
#[derive(Debug, Clone, Error)]
pub enum TrayError {
    #[error("当前平台不支持系统托盘")]
    Unsupported,
    #[error("创建托盘图标失败: {0}")]
    Build(String),
}

/// 生成提示文本
pub fn tooltip_text(title: &str, display: &CountdownDisplay) -> String {
    format!("{} – {}", title, display)
}

#[cfg(any(windows, target_os = "macos"))]
mod platform {
    use tray_icon::{
        menu::{Menu, MenuEvent, MenuId, MenuItem, PredefinedMenuItem},
        Icon, MouseButton, MouseButtonState, TrayIcon, TrayIconBuilder, TrayIconEvent,
    };

    use super::TrayError;
    use crate::core::types::TrayAction;
    use crate::ui::icon::IconImage;

    pub const AVAILABLE: bool = true;

    /// 托盘图标及菜单项ID
    pub struct PlatformTray {
        tray_icon: TrayIcon,
        open_id: MenuId,
        cancel_id: MenuId,
        quit_id: MenuId,
    }

    impl PlatformTray {
        pub fn build(tooltip: &str, image: &IconImage) -> Result<Self, TrayError> {
            let build_err = |e: &dyn std::fmt::Display| TrayError::Build(e.to_string());

            let menu = Menu::new();
            let open_item = MenuItem::new("打开", true, None);
            let cancel_item = MenuItem::new("取消关机", true, None);
            let quit_item = MenuItem::new("退出", true, None);

            menu.append(&open_item).map_err(|e| build_err(&e))?;
            menu.append(&cancel_item).map_err(|e| build_err(&e))?;
            menu.append(&PredefinedMenuItem::separator()).map_err(|e| build_err(&e))?;
            menu.append(&quit_item).map_err(|e| build_err(&e))?;

            let icon = Icon::from_rgba(image.rgba.clone(), image.width, image.height)
                .map_err(|e| build_err(&e))?;

            let tray_icon = TrayIconBuilder::new()
                .with_menu(Box::new(menu))
                .with_tooltip(tooltip)
                .with_icon(icon)
                .build()
                .map_err(|e| build_err(&e))?;

            Ok(Self {
                tray_icon,
                open_id: open_item.id().clone(),
                cancel_id: cancel_item.id().clone(),
                quit_id: quit_item.id().clone(),
            })
        }

        pub fn set_tooltip(&self, text: &str) -> Result<(), TrayError> {
            self.tray_icon
                .set_tooltip(Some(text))
                .map_err(|e| TrayError::Build(e.to_string()))
        }

        /// 取出所有待处理的托盘事件
        pub fn drain_actions(&self) -> Vec<TrayAction> {
            let mut actions = Vec::new();

            while let Ok(event) = MenuEvent::receiver().try_recv() {
                if event.id == self.open_id {
                    actions.push(TrayAction::Open);
                } else if event.id == self.cancel_id {
                    actions.push(TrayAction::Cancel);
                } else if event.id == self.quit_id {
                    actions.push(TrayAction::Quit);
                }
            }

            // 左键单击等同于“打开”
            while let Ok(event) = TrayIconEvent::receiver().try_recv() {
                if let TrayIconEvent::Click {
                    button: MouseButton::Left,
                    button_state: MouseButtonState::Up,
                    ..
                } = event
                {
                    actions.push(TrayAction::Open);
                }
            }

            actions
        }
    }
}

#[cfg(not(any(windows, target_os = "macos")))]
mod platform {
    use super::TrayError;
    use crate::core::types::TrayAction;
    use crate::ui::icon::IconImage;

    pub const AVAILABLE: bool = false;

    pub struct PlatformTray;

    impl PlatformTray {
        pub fn build(_tooltip: &str, _image: &IconImage) -> Result<Self, TrayError> {
            Err(TrayError::Unsupported)
        }

        pub fn set_tooltip(&self, _text: &str) -> Result<(), TrayError> {
            Err(TrayError::Unsupported)
        }

        pub fn drain_actions(&self) -> Vec<TrayAction> {
            Vec::new()
        }
    }
}

/// 托盘图标管理器
pub struct TrayManager {
    /// 托盘图标
    tray: Option<platform::PlatformTray>,
    /// 提示文本前缀
    title: String,
    /// 上一次设置的提示文本
    last_tooltip: String,
}

impl TrayManager {
    /// 创建托盘管理器，此时尚未显示图标
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            tray: None,
            title: title.into(),
            last_tooltip: String::new(),
        }
    }

    /// 当前平台是否支持托盘
    pub fn is_supported() -> bool {
        platform::AVAILABLE
    }

    pub fn is_created(&self) -> bool {
        self.tray.is_some()
    }

    /// 指定倒计时对应的提示文本
    pub fn tooltip_for(&self, display: &CountdownDisplay) -> String {
        tooltip_text(&self.title, display)
    }

    /// 确保托盘图标存在，已存在时直接返回
    ///
    /// # 返回值
    ///
    /// 本次调用是否新建了图标
    pub fn ensure_created(&mut self, display: &CountdownDisplay) -> Result<bool, TrayError> {
        if self.tray.is_some() {
            return Ok(false);
        }

        info!("初始化系统托盘图标");
        let image = icon::load_app_icon().unwrap_or_else(IconImage::generated);
        let tooltip = self.tooltip_for(display);
        let tray = platform::PlatformTray::build(&tooltip, &image)?;

        self.tray = Some(tray);
        self.last_tooltip = tooltip;
        info!("系统托盘图标初始化成功");
        Ok(true)
    }

    /// 刷新提示文本
    pub fn update_tooltip(&mut self, display: &CountdownDisplay) {
        let Some(tray) = &self.tray else {
            return;
        };

        let tooltip = self.tooltip_for(display);
        if tooltip == self.last_tooltip {
            return;
        }

        if let Err(e) = tray.set_tooltip(&tooltip) {
            warn!("更新托盘提示失败: {}", e);
        }
        self.last_tooltip = tooltip;
    }

    /// 取出菜单和图标点击产生的动作
    pub fn poll_actions(&self) -> Vec<TrayAction> {
        self.tray
            .as_ref()
            .map(platform::PlatformTray::drain_actions)
            .unwrap_or_default()
    }

    /// 销毁托盘图标
    pub fn destroy(&mut self) {
        if self.tray.take().is_some() {
            info!("销毁系统托盘图标");
        }
    }
}

impl std::fmt::Debug for TrayManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrayManager")
            .field("title", &self.title)
            .field("created", &self.tray.is_some())
            .field("last_tooltip", &self.last_tooltip)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_tray_manager_creation() {
        let manager = TrayManager::new("定时关机");

        assert!(!manager.is_created());
        assert!(manager.poll_actions().is_empty());
    }

    #[test]
    fn test_tooltip_generation() {
        let idle = tooltip_text("定时关机", &CountdownDisplay::Inactive);
        assert_eq!(idle, "定时关机 – 未设置定时");

        let running = tooltip_text("定时关机", &CountdownDisplay::Remaining(Duration::seconds(3661)));
        assert_eq!(running, "定时关机 – 1:01:01");
    }

    #[test]
    fn test_tooltip_update_without_tray_is_noop() {
        let mut manager = TrayManager::new("定时关机");
        manager.update_tooltip(&CountdownDisplay::Inactive);
        assert!(manager.last_tooltip.is_empty());

        manager.destroy();
        assert!(!manager.is_created());
    }

    #[cfg(not(any(windows, target_os = "macos")))]
    #[test]
    fn test_unsupported_platform_reports_error() {
        let mut manager = TrayManager::new("定时关机");
        assert!(!TrayManager::is_supported());
        assert!(matches!(
            manager.ensure_created(&CountdownDisplay::Inactive),
            Err(TrayError::Unsupported)
        ));
        assert!(!manager.is_created());
    }
}
