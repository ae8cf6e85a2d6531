//! 倒计时状态模块
//!
//! 保存当前定时关机的绝对结束时间，供窗口刷新和托盘提示共同读取

use chrono::{DateTime, Duration, Local, TimeZone};
use log::{debug, info};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::core::types::CountdownDisplay;

/// 未设置定时的标记值
const NO_TIMER: i64 = i64::MIN;

/// 定时器状态
///
/// 单个原子时间戳（毫秒），克隆后共享同一份状态。
/// 写入只发生在关机执行器中，其余组件只读。
#[derive(Debug, Clone)]
pub struct TimerState {
    end_millis: Arc<AtomicI64>,
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerState {
    /// 创建一个空闲的定时器状态
    pub fn new() -> Self {
        Self {
            end_millis: Arc::new(AtomicI64::new(NO_TIMER)),
        }
    }

    /// 设置结束时间为 `now + seconds`
    ///
    /// 新的设置总是覆盖旧的设置
    pub fn set_after(&self, now: DateTime<Local>, seconds: u64) -> DateTime<Local> {
        let end = now + Duration::seconds(seconds as i64);
        self.end_millis.store(end.timestamp_millis(), Ordering::SeqCst);
        info!("定时结束时间: {}", end.format("%Y-%m-%d %H:%M:%S"));
        end
    }

    /// 清除结束时间
    pub fn clear(&self) {
        let previous = self.end_millis.swap(NO_TIMER, Ordering::SeqCst);
        if previous != NO_TIMER {
            debug!("定时器已清除");
        }
    }

    /// 是否存在活动的定时
    pub fn is_active(&self) -> bool {
        self.end_millis.load(Ordering::SeqCst) != NO_TIMER
    }

    /// 当前结束时间
    pub fn end_time(&self) -> Option<DateTime<Local>> {
        match self.end_millis.load(Ordering::SeqCst) {
            NO_TIMER => None,
            millis => Local.timestamp_millis_opt(millis).single(),
        }
    }

    /// 距离结束的剩余时间，可能为负
    pub fn remaining(&self, now: DateTime<Local>) -> Option<Duration> {
        self.end_time().map(|end| end - now)
    }

    /// 每次调用都重新读取最新状态
    pub fn display(&self, now: DateTime<Local>) -> CountdownDisplay {
        match self.remaining(now) {
            Some(remaining) => CountdownDisplay::Remaining(remaining),
            None => CountdownDisplay::Inactive,
        }
    }
}
