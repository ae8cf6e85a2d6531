//! 错误类型定义
//!
//! 关机命令、开机自启与时间输入三类错误

use thiserror::Error;

/// 关机命令错误
///
/// 需要随 iced 消息传递，因此只保存字符串信息
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShutdownError {
    /// 命令无法启动
    #[error("无法执行 {program}: {reason}")]
    Spawn { program: String, reason: String },
    /// 命令返回非零退出码
    #[error("{program} 执行失败 (退出码 {code:?}): {stderr}")]
    CommandFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
    /// 延迟必须大于 0
    #[error("无效的关机延迟: {0}秒")]
    InvalidDelay(u64),
}

/// 开机自启错误
#[derive(Debug, Error)]
pub enum AutostartError {
    /// 文件读写失败
    #[error("自启动项读写失败: {0}")]
    Io(#[from] std::io::Error),
    /// 注册表操作失败
    #[error("注册表操作失败 (错误码 {code})")]
    Registry { code: u32 },
    /// 无法获取当前可执行文件路径
    #[error("无法获取程序路径")]
    ExecutablePath,
}

/// 时间输入错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("请输入大于 0 的时间")]
    Empty,
    #[error("{field}不是有效数字: {value}")]
    NotANumber { field: &'static str, value: String },
    #[error("时间过长")]
    TooLarge,
}
