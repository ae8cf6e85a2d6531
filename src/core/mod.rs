//! 核心业务逻辑模块
//!
//! 包含与界面无关的定时关机功能实现

pub mod autostart;
pub mod countdown;
pub mod error;
pub mod presentation;
pub mod presets;
pub mod shutdown;
pub mod time_parser;
pub mod types;
