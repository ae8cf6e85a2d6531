//! 日志管理模块
//!
//! 负责应用程序日志系统的初始化和管理

use std::path::{Path, PathBuf};
use std::fs;
use anyhow::{Context, Result};
use log::{info, warn, LevelFilter};
use env_logger::{Builder, Target};
use std::io::Write;
use std::sync::Once;
use chrono::{DateTime, Local};
use dirs::data_local_dir;

use crate::utils::config::{LoggingSettings, CONFIG_DIR_NAME};

static INIT: Once = Once::new();

/// 日志文件名前缀
const LOG_FILE_PREFIX: &str = "shutdown-timer_";

/// 日志管理器
///
/// 负责日志系统的配置和管理
#[derive(Debug)]
pub struct LoggerManager {
    /// 日志文件路径
    log_file_path: Option<PathBuf>,
    /// 当前日志级别
    log_level: LevelFilter,
}

impl LoggerManager {
    /// 根据配置创建日志管理器
    pub fn from_settings(settings: &LoggingSettings) -> Result<Self> {
        let log_dir = if settings.log_to_file {
            let data_dir = data_local_dir().context("无法获取本地数据目录")?;
            Some(data_dir.join(CONFIG_DIR_NAME).join("logs"))
        } else {
            None
        };

        Self::new(LogLevelConverter::from_string(&settings.level), log_dir)
    }

    /// 创建新的日志管理器
    ///
    /// # 参数
    ///
    /// * `log_level` - 日志级别
    /// * `log_dir` - 日志目录，为 None 时仅输出到控制台
    pub fn new(log_level: LevelFilter, log_dir: Option<PathBuf>) -> Result<Self> {
        let log_file_path = match log_dir {
            Some(dir) => Some(Self::create_log_file_path(&dir)?),
            None => None,
        };

        Ok(Self {
            log_file_path,
            log_level,
        })
    }

    /// 生成带日期的日志文件路径，并确保目录存在
    fn create_log_file_path(dir: &Path) -> Result<PathBuf> {
        if !dir.exists() {
            fs::create_dir_all(dir).with_context(|| format!("创建日志目录失败: {:?}", dir))?;
        }

        let log_filename = format!("{}{}.log", LOG_FILE_PREFIX, Local::now().format("%Y%m%d"));
        Ok(dir.join(log_filename))
    }

    /// 初始化日志系统
    ///
    /// 重复调用会被忽略；设置了 RUST_LOG 时以环境变量为准
    pub fn init(&self) {
        INIT.call_once(|| {
            if let Err(e) = self.init_internal() {
                eprintln!("Logger initialization error: {}", e);
            }
        });
    }

    /// 内部初始化方法
    fn init_internal(&self) -> Result<()> {
        let mut builder = Builder::new();

        builder.filter_level(self.log_level);
        if let Ok(filters) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filters);
        }

        builder.format(|buf, record| {
            let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
            writeln!(
                buf,
                "[{}] [{}] [{}:{}] {}",
                timestamp,
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        });

        match &self.log_file_path {
            Some(file_path) => {
                let file = fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(file_path)
                    .with_context(|| format!("打开日志文件失败: {:?}", file_path))?;

                builder.target(Target::Pipe(Box::new(file)));
                builder.try_init()?;

                info!("日志系统初始化完成 - 文件: {:?}", file_path);
            }
            None => {
                builder.target(Target::Stdout);
                builder.try_init()?;

                info!("日志系统初始化完成 - 控制台");
            }
        }

        Ok(())
    }

    /// 获取当前日志级别
    pub fn get_log_level(&self) -> LevelFilter {
        self.log_level
    }

    /// 获取日志文件路径
    pub fn get_log_file_path(&self) -> Option<&Path> {
        self.log_file_path.as_deref()
    }

    /// 清理旧日志文件
    ///
    /// # 参数
    ///
    /// * `days_to_keep` - 保留的天数
    ///
    /// # 返回值
    ///
    /// 删除的文件数量
    pub fn cleanup_old_logs(&self, days_to_keep: u32) -> Result<usize> {
        let Some(log_dir) = self.log_file_path.as_deref().and_then(Path::parent) else {
            return Ok(0);
        };

        if !log_dir.exists() {
            return Ok(0);
        }

        let cutoff_time = Local::now() - chrono::Duration::days(days_to_keep as i64);
        let mut cleaned_count = 0;

        for entry in fs::read_dir(log_dir)? {
            let path = entry?.path();

            let is_our_log = path.is_file()
                && path.extension().map_or(false, |ext| ext == "log")
                && path
                    .file_name()
                    .map_or(false, |name| name.to_string_lossy().starts_with(LOG_FILE_PREFIX));
            if !is_our_log || Some(path.as_path()) == self.log_file_path.as_deref() {
                continue;
            }

            let modified_datetime: DateTime<Local> = fs::metadata(&path)?.modified()?.into();
            if modified_datetime < cutoff_time {
                match fs::remove_file(&path) {
                    Ok(_) => {
                        info!("删除旧日志文件: {:?}", path);
                        cleaned_count += 1;
                    }
                    Err(e) => {
                        warn!("删除日志文件失败 {:?}: {}", path, e);
                    }
                }
            }
        }

        Ok(cleaned_count)
    }
}

/// 日志级别转换工具
pub struct LogLevelConverter;

impl LogLevelConverter {
    /// 从字符串转换为日志级别，未知名称使用 Info
    pub fn from_string(level_str: &str) -> LevelFilter {
        match level_str.to_lowercase().as_str() {
            "error" => LevelFilter::Error,
            "warn" => LevelFilter::Warn,
            "info" => LevelFilter::Info,
            "debug" => LevelFilter::Debug,
            "trace" => LevelFilter::Trace,
            "off" => LevelFilter::Off,
            _ => LevelFilter::Info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_log_level_converter() {
        assert_eq!(LogLevelConverter::from_string("info"), LevelFilter::Info);
        assert_eq!(LogLevelConverter::from_string("DEBUG"), LevelFilter::Debug);
        assert_eq!(LogLevelConverter::from_string("off"), LevelFilter::Off);
        assert_eq!(LogLevelConverter::from_string("invalid"), LevelFilter::Info);
    }

    #[test]
    fn test_console_only_logger() {
        let logger = LoggerManager::new(LevelFilter::Info, None).unwrap();
        assert_eq!(logger.get_log_level(), LevelFilter::Info);
        assert!(logger.get_log_file_path().is_none());
        assert_eq!(logger.cleanup_old_logs(7).unwrap(), 0);
    }

    #[test]
    fn test_file_logger_creates_directory() {
        let dir = tempdir().unwrap();
        let log_dir = dir.path().join("logs");

        let logger = LoggerManager::new(LevelFilter::Debug, Some(log_dir.clone())).unwrap();
        assert!(log_dir.is_dir());

        let file_path = logger.get_log_file_path().unwrap();
        assert!(file_path.starts_with(&log_dir));
        assert!(file_path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(LOG_FILE_PREFIX));
    }

    #[test]
    fn test_cleanup_keeps_recent_and_foreign_files() {
        let dir = tempdir().unwrap();
        let logger = LoggerManager::new(LevelFilter::Info, Some(dir.path().to_path_buf())).unwrap();

        fs::write(dir.path().join("shutdown-timer_20000101.log"), "old").unwrap();
        fs::write(dir.path().join("other.log"), "foreign").unwrap();

        // 刚写入的文件不算旧文件
        assert_eq!(logger.cleanup_old_logs(1).unwrap(), 0);
        assert!(dir.path().join("shutdown-timer_20000101.log").exists());
        assert!(dir.path().join("other.log").exists());
    }
}
