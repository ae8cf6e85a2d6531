//! 定时关机 - 轻量化桌面定时关机工具
//!
//! 选择一个时长后调用系统关机命令，倒计时显示在窗口和托盘提示中。

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use anyhow::Result;
use log::{info, warn};

mod app;
mod core;
mod ui;
mod utils;

use utils::{config::ConfigManager, logger::LoggerManager};

/// 应用程序入口点
///
/// 读取配置、初始化日志并启动GUI
fn main() -> Result<()> {
    let config_manager = ConfigManager::load();
    let config = config_manager.get_config().clone();

    let logger = LoggerManager::from_settings(&config.logging)?;
    logger.init();

    info!("定时关机 启动中...");
    config_manager.log_load_result();
    if let Err(e) = logger.cleanup_old_logs(7) {
        warn!("清理旧日志失败: {}", e);
    }

    app::App::new(config)?.run()
}
