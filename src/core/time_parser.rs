//! 时间解析器模块
//!
//! 解析“小时 / 分钟”两个输入框的内容，空白视为 0

use log::debug;

use crate::core::error::InputError;

/// 单个字段允许的最大值，避免乘法溢出
const MAX_FIELD_VALUE: u64 = 100_000;

/// 总时长上限，与 Windows `shutdown /t` 的最大值一致（十年）
pub const MAX_TOTAL_SECONDS: u64 = 315_360_000;

/// 时间解析器
#[derive(Debug, Clone, Default)]
pub struct TimeParser;

impl TimeParser {
    /// 创建新的时间解析器
    pub fn new() -> Self {
        Self
    }

    /// 解析小时和分钟输入，返回总秒数
    ///
    /// # 参数
    ///
    /// * `hours` - 小时输入框内容
    /// * `minutes` - 分钟输入框内容
    ///
    /// # 返回值
    ///
    /// 总秒数必须大于 0，否则返回 `InputError::Empty`
    pub fn parse(&self, hours: &str, minutes: &str) -> Result<u64, InputError> {
        let h = Self::parse_field("小时", hours)?;
        let m = Self::parse_field("分钟", minutes)?;

        let seconds = h * 3600 + m * 60;
        debug!("解析输入: {}小时 {}分钟 -> {}秒", h, m, seconds);

        if seconds == 0 {
            return Err(InputError::Empty);
        }
        if seconds > MAX_TOTAL_SECONDS {
            return Err(InputError::TooLarge);
        }

        Ok(seconds)
    }

    /// 解析单个非负整数字段
    fn parse_field(field: &'static str, raw: &str) -> Result<u64, InputError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(0);
        }

        if !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(InputError::NotANumber {
                field,
                value: trimmed.to_string(),
            });
        }

        match trimmed.parse::<u64>() {
            Ok(value) if value <= MAX_FIELD_VALUE => Ok(value),
            _ => Err(InputError::TooLarge),
        }
    }
}
