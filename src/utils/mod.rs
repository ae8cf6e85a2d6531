//! 工具模块
//!
//! 配置读取与日志初始化

pub mod config;
pub mod logger;
