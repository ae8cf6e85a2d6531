//! 关机执行器模块
//!
//! 将“N 秒后关机 / 取消关机”翻译成系统 shutdown 命令，并维护定时器状态

use chrono::{DateTime, Local};
use log::{debug, error, info, warn};
use tokio::process::Command as AsyncCommand;

use crate::core::countdown::TimerState;
use crate::core::error::ShutdownError;
use crate::core::types::{ShutdownAction, ShutdownFlavor};

/// 一条待执行的系统命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl std::fmt::Display for CommandLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// 生成指定平台的关机命令
///
/// 只支持分钟粒度的平台向上取整，保证系统不会早于倒计时关机
pub fn command_line(action: ShutdownAction, flavor: ShutdownFlavor, force: bool) -> CommandLine {
    let (program, args): (&str, Vec<String>) = match (flavor, action) {
        (ShutdownFlavor::Windows, ShutdownAction::Schedule { seconds }) => {
            let mut args = vec!["/s".to_string(), "/t".to_string(), seconds.to_string()];
            if force {
                args.push("/f".to_string());
            }
            ("shutdown", args)
        }
        (ShutdownFlavor::Windows, ShutdownAction::Abort) => ("shutdown", vec!["/a".to_string()]),
        (ShutdownFlavor::Linux | ShutdownFlavor::MacOs, ShutdownAction::Schedule { seconds }) => {
            let minutes = seconds.div_ceil(60);
            ("shutdown", vec!["-h".to_string(), format!("+{}", minutes)])
        }
        (ShutdownFlavor::Linux, ShutdownAction::Abort) => ("shutdown", vec!["-c".to_string()]),
        (ShutdownFlavor::MacOs, ShutdownAction::Abort) => ("killall", vec!["shutdown".to_string()]),
    };

    CommandLine {
        program: program.to_string(),
        args,
    }
}

/// 关机执行器
///
/// 持有共享的定时器状态，命令成功后才更新状态
#[derive(Debug, Clone)]
pub struct ShutdownExecutor {
    /// 命令风格
    flavor: ShutdownFlavor,
    /// 是否强制关闭应用程序
    force: bool,
    /// 替换命令程序（测试使用）
    program_override: Option<String>,
    /// 定时器状态
    timer: TimerState,
}

impl ShutdownExecutor {
    /// 创建新的关机执行器
    ///
    /// # 参数
    ///
    /// * `timer` - 共享的定时器状态
    /// * `force` - 是否附加强制关闭参数
    pub fn new(timer: TimerState, force: bool) -> Self {
        let flavor = ShutdownFlavor::current();
        info!("关机执行器初始化完成，命令风格: {:?}", flavor);

        Self {
            flavor,
            force,
            program_override: None,
            timer,
        }
    }

    /// 使用其他程序代替系统命令
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program_override = Some(program.into());
        self
    }

    /// 指定命令风格
    pub fn with_flavor(mut self, flavor: ShutdownFlavor) -> Self {
        self.flavor = flavor;
        self
    }

    /// 共享的定时器状态
    pub fn timer(&self) -> &TimerState {
        &self.timer
    }

    /// 在指定秒数后关机
    ///
    /// 重复调用会覆盖系统中已有的关机计划
    pub async fn schedule(&self, seconds: u64) -> Result<DateTime<Local>, ShutdownError> {
        if seconds == 0 {
            return Err(ShutdownError::InvalidDelay(seconds));
        }

        // Windows 在已有计划时拒绝新的 /s，先撤销旧计划
        if self.flavor == ShutdownFlavor::Windows && self.timer.is_active() {
            if let Err(e) = self.run(ShutdownAction::Abort).await {
                warn!("撤销旧的关机计划失败: {}", e);
            }
        }

        let requested_at = Local::now();
        self.run(ShutdownAction::Schedule { seconds }).await?;

        Ok(self.timer.set_after(requested_at, seconds))
    }

    /// 取消关机
    ///
    /// 没有待执行关机时命令失败视为正常
    pub async fn abort(&self) -> Result<(), ShutdownError> {
        let was_active = self.timer.is_active();

        match self.run(ShutdownAction::Abort).await {
            Ok(()) => {
                self.timer.clear();
                Ok(())
            }
            Err(e) if !was_active => {
                debug!("没有待执行的关机，忽略取消失败: {}", e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// 执行一条关机命令并检查退出码
    async fn run(&self, action: ShutdownAction) -> Result<(), ShutdownError> {
        let mut line = command_line(action, self.flavor, self.force);
        if let Some(program) = &self.program_override {
            line.program = program.clone();
        }

        info!("{}: {}", action, line);

        let output = AsyncCommand::new(&line.program)
            .args(&line.args)
            .output()
            .await
            .map_err(|e| {
                error!("执行 {} 失败: {}", line.program, e);
                ShutdownError::Spawn {
                    program: line.program.clone(),
                    reason: e.to_string(),
                }
            })?;

        if output.status.success() {
            info!("{} 执行成功", line);
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!("{} 退出状态: {}, {}", line, output.status, stderr);
            Err(ShutdownError::CommandFailed {
                program: line.program,
                code: output.status.code(),
                stderr,
            })
        }
    }
}
