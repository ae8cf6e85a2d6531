//! UI管理器模块
//!
//! 主窗口：时间输入、预设按钮、取消按钮、窗口置顶与开机自启开关。
//! 使用iced框架实现，托盘在同一线程上由订阅驱动。

use chrono::{DateTime, Local};
use iced::{
    widget::{button, checkbox, column, container, row, text, text_input, Row, Space},
    Alignment, Application, Command, Element, Font, Length, Settings, Subscription,
    Theme as IcedTheme, executor, time, window,
};
use log::{error, info, trace, warn};
use std::future::Future;
use std::time::Duration;

use crate::core::{
    autostart::LoginItemStore,
    countdown::TimerState,
    error::ShutdownError,
    presentation::{Presentation, PresentationChange},
    presets::{preset_rows, PresetDelay},
    shutdown::ShutdownExecutor,
    time_parser::TimeParser,
    types::{CountdownDisplay, TrayAction, WindowVisibility},
};
use crate::ui::{icon, tray::TrayManager};

/// 取消后的提示
const CANCELLED_TEXT: &str = "关机已取消";

/// 倒计时刷新周期
const REFRESH_PERIOD: Duration = Duration::from_secs(1);

/// 托盘事件轮询周期
const TRAY_POLL_PERIOD: Duration = Duration::from_millis(200);

/// 应用程序消息类型
#[derive(Debug, Clone)]
pub enum Message {
    /// 窗口倒计时刷新
    Tick,
    /// 托盘提示刷新
    TrayTick,
    /// 轮询托盘事件
    PollTray,
    /// 小时输入改变
    HoursChanged(String),
    /// 分钟输入改变
    MinutesChanged(String),
    /// 按自定义时间开始
    StartCustom,
    /// 按预设时间开始
    StartPreset(PresetDelay),
    /// 关机命令已返回
    Scheduled(Result<DateTime<Local>, ShutdownError>),
    /// 取消关机
    Cancel,
    /// 取消命令已返回
    Cancelled(Result<(), ShutdownError>),
    /// 切换窗口置顶
    AlwaysOnTopToggled(bool),
    /// 切换开机自启
    AutostartToggled(bool),
    /// 事件循环启动后直接隐藏到托盘
    HideAtStartup,
    /// 退出前的取消命令已返回
    QuitAfterAbort(Result<(), ShutdownError>),
}

/// 启动参数
pub struct UIFlags {
    /// 窗口标题
    pub title: String,
    /// 关机执行器
    pub executor: ShutdownExecutor,
    /// 登录项存储（不可用时为 None）
    pub autostart: Option<Box<dyn LoginItemStore>>,
    /// 启动时登录项是否已存在
    pub autostart_enabled: bool,
}

/// UI管理器应用程序状态
pub struct UIManager {
    /// 窗口标题
    title: String,
    /// 小时输入
    hours_input: String,
    /// 分钟输入
    minutes_input: String,
    /// 状态栏文本
    status_text: String,
    /// 状态栏是否显示一次性提示
    notice_active: bool,
    /// 时间解析器
    time_parser: TimeParser,
    /// 关机执行器
    executor: ShutdownExecutor,
    /// 共享的定时器状态
    timer: TimerState,
    /// 登录项存储
    autostart: Option<Box<dyn LoginItemStore>>,
    /// 开机自启开关状态
    autostart_enabled: bool,
    /// 窗口/托盘呈现状态
    presentation: Presentation,
    /// 托盘管理器
    tray: TrayManager,
}

impl UIManager {
    /// 创建UI管理器
    ///
    /// # 参数
    ///
    /// * `flags` - 启动参数
    /// * `tray_supported` - 是否可以使用托盘
    pub fn from_flags(flags: UIFlags, tray_supported: bool) -> Self {
        let timer = flags.executor.timer().clone();
        let status_text = CountdownDisplay::Inactive.to_string();

        Self {
            tray: TrayManager::new(flags.title.clone()),
            title: flags.title,
            hours_input: String::new(),
            minutes_input: String::new(),
            status_text,
            notice_active: false,
            time_parser: TimeParser::new(),
            executor: flags.executor,
            timer,
            autostart: flags.autostart,
            autostart_enabled: flags.autostart_enabled,
            presentation: Presentation::new(tray_supported),
        }
    }

    /// 当前显示的倒计时
    fn countdown(&self) -> CountdownDisplay {
        self.countdown_at(Local::now())
    }

    fn countdown_at(&self, now: DateTime<Local>) -> CountdownDisplay {
        self.timer.display(now)
    }

    /// 定时活动时显示剩余时间；没有定时时保留一次性提示
    fn refresh_status(&mut self) {
        self.refresh_status_at(Local::now());
    }

    fn refresh_status_at(&mut self, now: DateTime<Local>) {
        let display = self.countdown_at(now);
        match display {
            CountdownDisplay::Remaining(_) => {
                self.status_text = format!("剩余: {}", display);
                self.notice_active = false;
            }
            CountdownDisplay::Inactive if !self.notice_active => {
                self.status_text = display.to_string();
            }
            CountdownDisplay::Inactive => {}
        }
    }

    /// 显示一次性提示
    fn show_notice(&mut self, notice: impl Into<String>) {
        self.status_text = notice.into();
        self.notice_active = true;
    }

    /// 发起关机计划
    fn schedule(&self, seconds: u64) -> Command<Message> {
        info!("请求 {} 秒后关机", seconds);
        let executor = self.executor.clone();
        Command::perform(async move { executor.schedule(seconds).await }, Message::Scheduled)
    }

    /// 取消关机的异步任务
    fn abort_task(&self) -> impl Future<Output = Result<(), ShutdownError>> + Send + 'static {
        let executor = self.executor.clone();
        async move { executor.abort().await }
    }

    /// 发起取消
    fn abort<F>(&self, on_done: F) -> Command<Message>
    where
        F: FnOnce(Result<(), ShutdownError>) -> Message + Send + 'static,
    {
        Command::perform(self.abort_task(), on_done)
    }

    /// 开机自启时隐藏到托盘；托盘不可用时退化为最小化窗口
    fn hide_at_startup(&mut self) -> Command<Message> {
        info!("开机自启模式，直接最小化到托盘");
        let change = self.presentation.minimize();
        let command = self.apply_presentation(change);
        if self.presentation.visibility() == WindowVisibility::Visible {
            Command::batch(vec![
                window::change_mode(window::Id::MAIN, window::Mode::Windowed),
                command,
            ])
        } else {
            command
        }
    }

    /// 执行呈现状态变化
    fn apply_presentation(&mut self, change: PresentationChange) -> Command<Message> {
        match change {
            PresentationChange::Unchanged => Command::none(),
            PresentationChange::MinimizeWindow => window::minimize(window::Id::MAIN, true),
            PresentationChange::HideToTray { create_tray } => {
                if create_tray {
                    let display = self.countdown();
                    if let Err(e) = self.tray.ensure_created(&display) {
                        error!("{}", e);
                        self.presentation.tray_failed();
                        return window::minimize(window::Id::MAIN, true);
                    }
                }
                info!("最小化到托盘");
                window::change_mode(window::Id::MAIN, window::Mode::Hidden)
            }
        }
    }

    /// 从托盘恢复窗口
    fn restore_window(&mut self) -> Command<Message> {
        info!("从托盘恢复");
        self.presentation.restore();
        Command::batch(vec![
            window::change_mode(window::Id::MAIN, window::Mode::Windowed),
            window::gain_focus(window::Id::MAIN),
        ])
    }

    /// 切换开机自启，开关始终反映实际登记状态
    fn toggle_autostart(&mut self, enable: bool) {
        let Some(store) = &self.autostart else {
            warn!("开机自启不可用");
            return;
        };

        let result = if enable { store.enable() } else { store.disable() };
        self.autostart_enabled = store.is_enabled();

        match result {
            Ok(()) => info!("开机自启: {}", self.autostart_enabled),
            Err(e) => {
                error!("切换开机自启失败: {}", e);
                self.show_notice(e.to_string());
            }
        }
    }

    fn handle_tray_action(&mut self, action: TrayAction) -> Command<Message> {
        info!("托盘动作: {:?}", action);
        match action {
            TrayAction::Open => self.restore_window(),
            TrayAction::Cancel => self.abort(Message::Cancelled),
            TrayAction::Quit => self.abort(Message::QuitAfterAbort),
        }
    }

    /// 预设按钮网格
    fn preset_grid(&self) -> Element<'_, Message> {
        let mut grid = column![].spacing(4);
        for presets in preset_rows() {
            let mut line = Row::new().spacing(4);
            for preset in presets {
                line = line.push(
                    button(text(preset.label))
                        .width(Length::Fixed(72.0))
                        .on_press(Message::StartPreset(*preset)),
                );
            }
            grid = grid.push(line);
        }
        grid.into()
    }
}

/// 运行UI应用程序
///
/// # 参数
///
/// * `flags` - 启动参数
/// * `start_hidden` - 是否直接隐藏到托盘启动
pub fn run_with_params(flags: UIFlags, start_hidden: bool) -> iced::Result {
    let window_icon = icon::load_app_icon().as_ref().and_then(icon::window_icon);

    let settings = Settings {
        id: None,
        window: window::Settings {
            size: iced::Size::new(340.0, 400.0),
            resizable: false,
            visible: !start_hidden,
            icon: window_icon,
            exit_on_close_request: true,
            ..Default::default()
        },
        flags: (flags, start_hidden),
        fonts: vec![],
        default_font: Font::with_name("Microsoft YaHei"),
        default_text_size: iced::Pixels(14.0),
        antialiasing: false,
    };
    UIManager::run(settings)
}

impl Application for UIManager {
    type Message = Message;
    type Theme = IcedTheme;
    type Executor = executor::Default;
    type Flags = (UIFlags, bool);

    /// 订阅外部事件
    fn subscription(&self) -> Subscription<Self::Message> {
        let mut subscriptions = vec![time::every(REFRESH_PERIOD).map(|_| Message::Tick)];

        // 托盘创建后，提示刷新和事件轮询一直运行到程序退出
        if self.tray.is_created() {
            subscriptions.push(time::every(REFRESH_PERIOD).map(|_| Message::TrayTick));
            subscriptions.push(time::every(TRAY_POLL_PERIOD).map(|_| Message::PollTray));
        }

        Subscription::batch(subscriptions)
    }

    /// 创建应用程序实例
    fn new(flags: Self::Flags) -> (Self, Command<Self::Message>) {
        let (flags, start_hidden) = flags;
        let ui_manager = Self::from_flags(flags, TrayManager::is_supported());

        // macOS 要求托盘图标在事件循环运行后创建
        let command = if start_hidden {
            Command::perform(async {}, |()| Message::HideAtStartup)
        } else {
            Command::none()
        };

        (ui_manager, command)
    }

    /// 应用程序标题
    fn title(&self) -> String {
        self.title.clone()
    }

    /// 处理消息更新
    fn update(&mut self, message: Self::Message) -> Command<Self::Message> {
        match message {
            Message::Tick => {
                trace!("倒计时刷新");
                self.refresh_status();
                Command::none()
            }
            Message::TrayTick => {
                let display = self.countdown();
                self.tray.update_tooltip(&display);
                Command::none()
            }
            Message::PollTray => {
                let commands: Vec<_> = self
                    .tray
                    .poll_actions()
                    .into_iter()
                    .map(|action| self.handle_tray_action(action))
                    .collect();
                Command::batch(commands)
            }
            Message::HoursChanged(value) => {
                self.hours_input = value;
                Command::none()
            }
            Message::MinutesChanged(value) => {
                self.minutes_input = value;
                Command::none()
            }
            Message::StartCustom => {
                match self.time_parser.parse(&self.hours_input, &self.minutes_input) {
                    Ok(seconds) => self.schedule(seconds),
                    Err(e) => {
                        warn!("输入无效: {}", e);
                        self.show_notice(e.to_string());
                        Command::none()
                    }
                }
            }
            Message::StartPreset(preset) => {
                info!("预设: {}", preset.label);
                self.schedule(preset.seconds)
            }
            Message::Scheduled(Ok(end)) => {
                info!("关机计划已设置: {}", end.format("%H:%M:%S"));
                self.notice_active = false;
                self.refresh_status();
                let change = self.presentation.after_schedule();
                self.apply_presentation(change)
            }
            Message::Scheduled(Err(e)) => {
                error!("设置关机失败: {}", e);
                self.show_notice(format!("关机命令失败: {}", e));
                Command::none()
            }
            Message::Cancel => {
                info!("用户请求取消关机");
                self.abort(Message::Cancelled)
            }
            Message::Cancelled(Ok(())) => {
                self.show_notice(CANCELLED_TEXT);
                Command::none()
            }
            Message::Cancelled(Err(e)) => {
                error!("取消关机失败: {}", e);
                self.show_notice(format!("取消失败: {}", e));
                Command::none()
            }
            Message::AlwaysOnTopToggled(enabled) => {
                self.presentation.set_always_on_top(enabled);
                let level = if enabled {
                    window::Level::AlwaysOnTop
                } else {
                    window::Level::Normal
                };
                window::change_level(window::Id::MAIN, level)
            }
            Message::AutostartToggled(enabled) => {
                self.toggle_autostart(enabled);
                Command::none()
            }
            Message::HideAtStartup => self.hide_at_startup(),
            Message::QuitAfterAbort(result) => {
                if let Err(e) = result {
                    warn!("退出前取消关机失败: {}", e);
                }
                info!("退出应用程序");
                self.tray.destroy();
                window::close(window::Id::MAIN)
            }
        }
    }

    /// 构建用户界面
    fn view(&self) -> Element<Self::Message> {
        let always_on_top = checkbox("窗口置顶", self.presentation.always_on_top())
            .on_toggle(Message::AlwaysOnTopToggled);

        let mut autostart = checkbox("开机自动启动", self.autostart_enabled);
        if self.autostart.is_some() {
            autostart = autostart.on_toggle(Message::AutostartToggled);
        }

        let options = row![always_on_top, Space::with_width(Length::Fill), autostart]
            .align_items(Alignment::Center);

        let inputs = row![
            text("小时"),
            text_input("0", &self.hours_input)
                .on_input(Message::HoursChanged)
                .on_submit(Message::StartCustom)
                .width(Length::Fixed(60.0)),
            Space::with_width(Length::Fixed(10.0)),
            text("分钟"),
            text_input("0", &self.minutes_input)
                .on_input(Message::MinutesChanged)
                .on_submit(Message::StartCustom)
                .width(Length::Fixed(60.0)),
        ]
        .spacing(6)
        .align_items(Alignment::Center);

        let start_button = button("开始").on_press(Message::StartCustom).padding(8);
        let cancel_button = button("取消关机").on_press(Message::Cancel).padding(8);

        let content = column![
            options,
            inputs,
            start_button,
            self.preset_grid(),
            cancel_button,
            text(&self.status_text).size(18),
        ]
        .spacing(12)
        .padding(16)
        .align_items(Alignment::Center);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x()
            .into()
    }

    /// 应用程序主题
    fn theme(&self) -> Self::Theme {
        IcedTheme::Light
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::autostart::XdgAutostart;
    use std::path::PathBuf;
    use tempfile::{tempdir, TempDir};

    fn test_manager(with_autostart: bool) -> (UIManager, TempDir) {
        let dir = tempdir().unwrap();
        let autostart: Option<Box<dyn LoginItemStore>> = if with_autostart {
            Some(Box::new(XdgAutostart::new(
                dir.path(),
                "ShutdownTimer",
                PathBuf::from("/usr/bin/shutdown-timer"),
            )))
        } else {
            None
        };

        let flags = UIFlags {
            title: "定时关机".to_string(),
            executor: ShutdownExecutor::new(TimerState::new(), false).with_program("true"),
            autostart,
            autostart_enabled: false,
        };
        (UIManager::from_flags(flags, false), dir)
    }

    #[test]
    fn test_initial_state() {
        let (ui_manager, _dir) = test_manager(true);
        assert_eq!(ui_manager.status_text, "未设置定时");
        assert_eq!(ui_manager.title(), "定时关机");
        assert!(!ui_manager.presentation.always_on_top());
        assert!(!ui_manager.tray.is_created());
    }

    #[test]
    fn test_empty_input_shows_validation_notice() {
        let (mut ui_manager, _dir) = test_manager(false);

        let _command = ui_manager.update(Message::StartCustom);
        assert_eq!(ui_manager.status_text, "请输入大于 0 的时间");
        assert!(!ui_manager.timer.is_active());

        // 没有定时时，刷新不会覆盖提示
        let _command = ui_manager.update(Message::Tick);
        assert_eq!(ui_manager.status_text, "请输入大于 0 的时间");
    }

    #[test]
    fn test_input_messages() {
        let (mut ui_manager, _dir) = test_manager(false);

        let _command = ui_manager.update(Message::HoursChanged("1".to_string()));
        let _command = ui_manager.update(Message::MinutesChanged("30".to_string()));
        assert_eq!(ui_manager.hours_input, "1");
        assert_eq!(ui_manager.minutes_input, "30");
    }

    #[test]
    fn test_scheduled_updates_status_on_tick() {
        let (mut ui_manager, _dir) = test_manager(false);

        let end = ui_manager.timer.set_after(Local::now(), 5400);
        let _command = ui_manager.update(Message::Scheduled(Ok(end)));
        assert!(ui_manager.status_text.starts_with("剩余: 1:"));

        // 托盘不可用，窗口保持可见
        assert_eq!(ui_manager.presentation.visibility(), WindowVisibility::Visible);
    }

    #[test]
    fn test_cancel_notice_survives_ticks() {
        let (mut ui_manager, _dir) = test_manager(false);

        let _command = ui_manager.update(Message::Cancelled(Ok(())));
        assert_eq!(ui_manager.status_text, CANCELLED_TEXT);

        let _command = ui_manager.update(Message::Tick);
        assert_eq!(ui_manager.status_text, CANCELLED_TEXT);

        // 新的定时开始后由刷新接管
        ui_manager.timer.set_after(Local::now(), 60);
        let _command = ui_manager.update(Message::Tick);
        assert!(ui_manager.status_text.starts_with("剩余: 0:0"));
    }

    #[test]
    fn test_failed_schedule_is_reported() {
        let (mut ui_manager, _dir) = test_manager(false);

        let error = ShutdownError::CommandFailed {
            program: "shutdown".to_string(),
            code: Some(5),
            stderr: "拒绝访问".to_string(),
        };
        let _command = ui_manager.update(Message::Scheduled(Err(error)));
        assert!(ui_manager.status_text.starts_with("关机命令失败"));
        assert!(ui_manager.status_text.contains("拒绝访问"));
        assert!(!ui_manager.timer.is_active());
    }

    #[test]
    fn test_always_on_top_toggle() {
        let (mut ui_manager, _dir) = test_manager(false);

        let _command = ui_manager.update(Message::AlwaysOnTopToggled(true));
        assert!(ui_manager.presentation.always_on_top());

        let end = ui_manager.timer.set_after(Local::now(), 60);
        let _command = ui_manager.update(Message::Scheduled(Ok(end)));
        assert_eq!(ui_manager.presentation.visibility(), WindowVisibility::Visible);
        assert!(!ui_manager.tray.is_created());

        let _command = ui_manager.update(Message::AlwaysOnTopToggled(false));
        assert!(!ui_manager.presentation.always_on_top());
    }

    #[test]
    fn test_autostart_toggle_mirrors_store() {
        let (mut ui_manager, dir) = test_manager(true);

        let _command = ui_manager.update(Message::AutostartToggled(true));
        assert!(ui_manager.autostart_enabled);
        assert!(dir.path().join("ShutdownTimer.desktop").is_file());

        let _command = ui_manager.update(Message::AutostartToggled(false));
        assert!(!ui_manager.autostart_enabled);
        assert!(!dir.path().join("ShutdownTimer.desktop").exists());
    }

    #[test]
    fn test_autostart_toggle_without_store_is_ignored() {
        let (mut ui_manager, _dir) = test_manager(false);

        let _command = ui_manager.update(Message::AutostartToggled(true));
        assert!(!ui_manager.autostart_enabled);
    }

    #[test]
    fn test_tray_open_restores_window() {
        let (mut ui_manager, _dir) = test_manager(false);

        let _command = ui_manager.handle_tray_action(TrayAction::Open);
        assert_eq!(ui_manager.presentation.visibility(), WindowVisibility::Visible);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_tray_quit_aborts_then_drops_tray() {
        let (mut ui_manager, _dir) = test_manager(false);
        ui_manager.timer.set_after(Local::now(), 600);

        let _command = ui_manager.handle_tray_action(TrayAction::Quit);

        // 与 Quit 派发的命令相同的取消任务
        let result = ui_manager.abort_task().await;
        assert!(result.is_ok());
        assert!(!ui_manager.timer.is_active());

        let _command = ui_manager.update(Message::QuitAfterAbort(result));
        assert!(!ui_manager.tray.is_created());
    }

    #[test]
    fn test_quit_proceeds_when_abort_fails() {
        let (mut ui_manager, _dir) = test_manager(false);

        let error = ShutdownError::Spawn {
            program: "shutdown".to_string(),
            reason: "not found".to_string(),
        };
        let _command = ui_manager.update(Message::QuitAfterAbort(Err(error)));
        assert!(!ui_manager.tray.is_created());
    }

    #[test]
    fn test_tray_tooltip_mirrors_window_label() {
        let (mut ui_manager, _dir) = test_manager(false);
        let now = Local::now();
        ui_manager.timer.set_after(now, 5400);

        ui_manager.refresh_status_at(now);
        let tooltip = ui_manager.tray.tooltip_for(&ui_manager.countdown_at(now));

        let label_time = ui_manager.status_text.strip_prefix("剩余: ").unwrap();
        let tooltip_time = tooltip.strip_prefix("定时关机 – ").unwrap();
        assert_eq!(label_time, tooltip_time);
        assert!(label_time.starts_with("1:"));

        // 托盘尚未创建时刷新提示不产生副作用
        let _command = ui_manager.update(Message::TrayTick);
        assert!(!ui_manager.tray.is_created());
    }

    #[test]
    fn test_hide_at_startup_without_tray_keeps_window_reachable() {
        let (mut ui_manager, _dir) = test_manager(false);

        let _command = ui_manager.update(Message::HideAtStartup);
        assert_eq!(ui_manager.presentation.visibility(), WindowVisibility::Visible);
        assert!(!ui_manager.tray.is_created());
    }
}
