//! 应用程序主模块
//!
//! 负责组装各个组件并启动界面

use anyhow::{anyhow, Result};
use log::{info, warn};

use crate::core::{
    autostart::{self, LoginItemStore},
    countdown::TimerState,
    shutdown::ShutdownExecutor,
};
use crate::ui::{
    manager::{self, UIFlags},
    tray::TrayManager,
};
use crate::utils::config::AppConfig;

/// 应用程序主结构体
pub struct App {
    /// 配置
    config: AppConfig,
    /// 关机执行器
    shutdown_executor: ShutdownExecutor,
    /// 登录项存储
    autostart: Option<Box<dyn LoginItemStore>>,
    /// 启动时登录项是否存在
    autostart_enabled: bool,
}

impl App {
    /// 创建新的应用实例
    ///
    /// # 参数
    ///
    /// * `config` - 已加载的配置
    pub fn new(config: AppConfig) -> Result<Self> {
        info!("初始化应用组件...");

        let timer = TimerState::new();
        let shutdown_executor = ShutdownExecutor::new(timer, config.shutdown.force_close_apps);

        let autostart = match autostart::default_store(&config.app.app_id) {
            Ok(store) => Some(store),
            Err(e) => {
                warn!("开机自启不可用: {}", e);
                None
            }
        };

        // 只在启动时读取一次
        let autostart_enabled = autostart.as_ref().map_or(false, |store| store.is_enabled());
        info!("开机自启: {}", autostart_enabled);

        Ok(Self {
            config,
            shutdown_executor,
            autostart,
            autostart_enabled,
        })
    }

    /// 运行应用程序，直到窗口关闭或从托盘退出
    pub fn run(self) -> Result<()> {
        let start_hidden = should_start_hidden(self.autostart_enabled, TrayManager::is_supported());
        info!("启动用户界面 (隐藏启动: {})", start_hidden);

        let flags = UIFlags {
            title: self.config.app.window_title,
            executor: self.shutdown_executor,
            autostart: self.autostart,
            autostart_enabled: self.autostart_enabled,
        };

        manager::run_with_params(flags, start_hidden).map_err(|e| anyhow!("界面运行失败: {}", e))?;

        info!("应用程序已退出");
        Ok(())
    }
}

/// 开机自启且托盘可用时直接隐藏到托盘
fn should_start_hidden(autostart_enabled: bool, tray_supported: bool) -> bool {
    autostart_enabled && tray_supported
}
