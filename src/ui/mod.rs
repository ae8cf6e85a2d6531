//! 用户界面模块
//!
//! 包含主窗口、托盘图标和图标资源

pub mod icon;
pub mod manager;
pub mod tray;
