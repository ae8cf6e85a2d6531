//! 配置管理模块
//!
//! 从配置目录读取可选的 config.json。配置文件只读，程序从不写回。

use std::fs;
use std::path::{Path, PathBuf};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use dirs::config_dir;

/// 配置目录名
pub const CONFIG_DIR_NAME: &str = "ShutdownTimer";

/// 应用程序配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 应用程序设置
    pub app: AppSettings,
    /// 日志设置
    pub logging: LoggingSettings,
    /// 关机设置
    pub shutdown: ShutdownSettings,
}

/// 应用程序基本设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// 登录项名称
    pub app_id: String,
    /// 窗口标题，同时用作托盘提示前缀
    pub window_title: String,
}

/// 日志设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// 日志级别
    pub level: String,
    /// 同时写入日志文件
    pub log_to_file: bool,
}

/// 关机相关设置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShutdownSettings {
    /// 强制关闭应用程序（忽略未保存的工作）
    pub force_close_apps: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            app_id: "ShutdownTimer".to_string(),
            window_title: "定时关机".to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_to_file: false,
        }
    }
}

/// 配置加载结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// 从配置文件读取
    File,
    /// 配置文件不存在，使用默认配置
    Defaults,
    /// 配置文件不可用，已回退到默认配置
    Fallback,
}

/// 配置管理器
///
/// 加载发生在日志初始化之前，诊断信息先保存下来，由 `log_load_result` 输出
#[derive(Debug)]
pub struct ConfigManager {
    /// 配置文件路径
    config_path: Option<PathBuf>,
    /// 当前配置
    config: AppConfig,
    /// 配置来源
    source: ConfigSource,
    /// 加载过程中的警告
    warnings: Vec<String>,
}

impl ConfigManager {
    /// 从默认位置加载配置
    pub fn load() -> Self {
        match Self::get_config_file_path() {
            Some(path) => Self::load_from(&path),
            None => Self {
                config_path: None,
                config: AppConfig::default(),
                source: ConfigSource::Fallback,
                warnings: vec!["无法获取配置目录，使用默认配置".to_string()],
            },
        }
    }

    /// 从指定文件加载配置
    pub fn load_from(path: &Path) -> Self {
        let (config, source, warnings) = match Self::load_config(path) {
            Ok(Some(config)) => (config, ConfigSource::File, Vec::new()),
            Ok(None) => (AppConfig::default(), ConfigSource::Defaults, Vec::new()),
            Err(warning) => (AppConfig::default(), ConfigSource::Fallback, vec![warning]),
        };

        Self {
            config_path: Some(path.to_path_buf()),
            config,
            source,
            warnings,
        }
    }

    /// 获取配置文件路径
    fn get_config_file_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join("config.json"))
    }

    /// 读取配置文件
    ///
    /// 文件不存在时返回 `Ok(None)`；读取失败、格式错误或校验失败时返回警告文本
    fn load_config(path: &Path) -> Result<Option<AppConfig>, String> {
        if !path.exists() {
            return Ok(None);
        }

        let config_content = fs::read_to_string(path)
            .map_err(|e| format!("读取配置文件失败: {}, 使用默认配置", e))?;

        let config = serde_json::from_str::<AppConfig>(&config_content)
            .map_err(|e| format!("配置文件格式错误: {}, 使用默认配置", e))?;

        let (valid, errors) = ConfigValidator::validate(&config);
        if !valid {
            return Err(format!("配置无效: {}, 使用默认配置", errors.join("; ")));
        }

        Ok(Some(config))
    }

    /// 输出加载结果，需在日志系统初始化之后调用
    pub fn log_load_result(&self) {
        match (&self.source, &self.config_path) {
            (ConfigSource::File, Some(path)) => info!("配置文件加载成功: {:?}", path),
            (ConfigSource::Defaults, Some(path)) => info!("配置文件不存在，使用默认配置: {:?}", path),
            _ => {}
        }

        for warning in &self.warnings {
            warn!("{}", warning);
        }
    }

    /// 获取当前配置
    pub fn get_config(&self) -> &AppConfig {
        &self.config
    }

    /// 获取配置文件路径
    pub fn get_config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// 配置来源
    pub fn source(&self) -> &ConfigSource {
        &self.source
    }

    /// 加载过程中的警告
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

/// 配置验证器
pub struct ConfigValidator;

impl ConfigValidator {
    /// 验证全部配置
    ///
    /// # 返回值
    ///
    /// 验证结果和错误信息
    pub fn validate(config: &AppConfig) -> (bool, Vec<String>) {
        let mut errors = Vec::new();

        let app_id = config.app.app_id.trim();
        if app_id.is_empty() {
            errors.push("登录项名称不能为空".to_string());
        }
        if app_id.contains(['/', '\\']) {
            errors.push("登录项名称不能包含路径分隔符".to_string());
        }

        if config.app.window_title.trim().is_empty() {
            errors.push("窗口标题不能为空".to_string());
        }

        let valid_log_levels = ["off", "error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            errors.push("无效的日志级别".to_string());
        }

        (errors.is_empty(), errors)
    }
}
