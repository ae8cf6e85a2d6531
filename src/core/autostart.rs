//! 开机自启模块
//!
//! 在系统登录项中登记/移除本程序。Windows 使用注册表 Run 键，
//! 其他平台使用 XDG autostart 桌面文件。

use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::AutostartError;

/// 登录项存储
///
/// 找不到登录项一律视为“未启用”，不是错误
pub trait LoginItemStore: Send {
    /// 写入指向当前程序的登录项
    fn enable(&self) -> Result<(), AutostartError>;
    /// 删除登录项，不存在时直接返回成功
    fn disable(&self) -> Result<(), AutostartError>;
    /// 登录项是否存在
    fn is_enabled(&self) -> bool;
}

/// 当前可执行文件路径
fn current_executable() -> Result<PathBuf, AutostartError> {
    std::env::current_exe().map_err(|_| AutostartError::ExecutablePath)
}

/// 根据平台创建默认的登录项存储
///
/// # 参数
///
/// * `app_id` - 登录项名称
pub fn default_store(app_id: &str) -> Result<Box<dyn LoginItemStore>, AutostartError> {
    #[cfg(windows)]
    {
        Ok(Box::new(RegistryRunKey::new(app_id)))
    }

    #[cfg(not(windows))]
    {
        let dir = dirs::config_dir()
            .ok_or(AutostartError::ExecutablePath)?
            .join("autostart");
        Ok(Box::new(XdgAutostart::new(dir, app_id, current_executable()?)))
    }
}

/// XDG autostart 桌面文件
#[derive(Debug, Clone)]
pub struct XdgAutostart {
    /// 桌面文件完整路径
    entry_path: PathBuf,
    /// 登录后要启动的程序
    executable: PathBuf,
    /// 显示名称
    name: String,
}

impl XdgAutostart {
    /// 创建 XDG 登录项
    ///
    /// # 参数
    ///
    /// * `dir` - autostart 目录
    /// * `app_id` - 登录项名称，同时作为文件名
    /// * `executable` - 程序路径
    pub fn new<P: AsRef<Path>>(dir: P, app_id: &str, executable: PathBuf) -> Self {
        Self {
            entry_path: dir.as_ref().join(format!("{}.desktop", app_id)),
            executable,
            name: app_id.to_string(),
        }
    }

    /// 桌面文件路径
    pub fn entry_path(&self) -> &Path {
        &self.entry_path
    }

    fn render_entry(&self) -> String {
        format!(
            "[Desktop Entry]\nType=Application\nName={}\nExec=\"{}\"\nX-GNOME-Autostart-enabled=true\n",
            self.name,
            self.executable.display()
        )
    }
}

impl LoginItemStore for XdgAutostart {
    fn enable(&self) -> Result<(), AutostartError> {
        if let Some(parent) = self.entry_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.entry_path, self.render_entry())?;
        info!("已写入开机自启项: {:?}", self.entry_path);
        Ok(())
    }

    fn disable(&self) -> Result<(), AutostartError> {
        match fs::remove_file(&self.entry_path) {
            Ok(()) => {
                info!("已移除开机自启项: {:?}", self.entry_path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("开机自启项不存在: {:?}", self.entry_path);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn is_enabled(&self) -> bool {
        self.entry_path.is_file()
    }
}

/// Run 键的值是一条命令行，路径可能含空格，必须加引号
#[cfg(any(windows, test))]
pub fn run_key_command(executable: &Path) -> String {
    format!("\"{}\"", executable.display())
}

/// `HKCU\Software\Microsoft\Windows\CurrentVersion\Run` 下的一个值
#[cfg(windows)]
#[derive(Debug, Clone)]
pub struct RegistryRunKey {
    value_name: String,
}

#[cfg(windows)]
mod registry {
    use windows::core::PCWSTR;
    use windows::Win32::Foundation::ERROR_FILE_NOT_FOUND;
    use windows::Win32::System::Registry::*;

    pub const RUN_KEY_PATH: &str = r"Software\Microsoft\Windows\CurrentVersion\Run";

    pub fn wide_str(s: &str) -> Vec<u16> {
        s.encode_utf16().chain(std::iter::once(0)).collect()
    }

    /// 打开 Run 键
    pub fn open_run_key(access: REG_SAM_FLAGS) -> Result<HKEY, u32> {
        let path = wide_str(RUN_KEY_PATH);
        let mut hkey = HKEY::default();
        let result = unsafe {
            RegOpenKeyExW(
                HKEY_CURRENT_USER,
                PCWSTR::from_raw(path.as_ptr()),
                0,
                access,
                &mut hkey,
            )
        };
        if result.is_err() {
            return Err(result.0);
        }
        Ok(hkey)
    }

    pub fn value_exists(name: &str) -> bool {
        let Ok(hkey) = open_run_key(KEY_READ) else {
            return false;
        };
        let key_name = wide_str(name);
        let mut data_size: u32 = 0;
        unsafe {
            let result = RegQueryValueExW(
                hkey,
                PCWSTR::from_raw(key_name.as_ptr()),
                None,
                None,
                None,
                Some(&mut data_size),
            );
            let _ = RegCloseKey(hkey);
            result.is_ok()
        }
    }

    pub fn set_string(name: &str, value: &str) -> Result<(), u32> {
        let hkey = open_run_key(KEY_SET_VALUE)?;
        let key_name = wide_str(name);
        let data = wide_str(value);
        unsafe {
            let result = RegSetValueExW(
                hkey,
                PCWSTR::from_raw(key_name.as_ptr()),
                0,
                REG_SZ,
                Some(std::slice::from_raw_parts(
                    data.as_ptr() as *const u8,
                    data.len() * 2,
                )),
            );
            let _ = RegCloseKey(hkey);
            if result.is_err() {
                return Err(result.0);
            }
        }
        Ok(())
    }

    pub fn delete_value(name: &str) -> Result<(), u32> {
        let hkey = match open_run_key(KEY_SET_VALUE) {
            Ok(hkey) => hkey,
            Err(code) if code == ERROR_FILE_NOT_FOUND.0 => return Ok(()),
            Err(code) => return Err(code),
        };
        let key_name = wide_str(name);
        unsafe {
            let result = RegDeleteValueW(hkey, PCWSTR::from_raw(key_name.as_ptr()));
            let _ = RegCloseKey(hkey);
            if result.is_err() && result != ERROR_FILE_NOT_FOUND {
                return Err(result.0);
            }
        }
        Ok(())
    }
}

#[cfg(windows)]
impl RegistryRunKey {
    pub fn new(app_id: &str) -> Self {
        Self {
            value_name: app_id.to_string(),
        }
    }
}

#[cfg(windows)]
impl LoginItemStore for RegistryRunKey {
    fn enable(&self) -> Result<(), AutostartError> {
        let command = run_key_command(&current_executable()?);
        registry::set_string(&self.value_name, &command)
            .map_err(|code| AutostartError::Registry { code })?;
        info!("已写入注册表自启项: {} = {}", self.value_name, command);
        Ok(())
    }

    fn disable(&self) -> Result<(), AutostartError> {
        registry::delete_value(&self.value_name).map_err(|code| AutostartError::Registry { code })?;
        info!("已移除注册表自启项: {}", self.value_name);
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        registry::value_exists(&self.value_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tokio_test::assert_ok;

    fn store_in(dir: &Path) -> XdgAutostart {
        XdgAutostart::new(dir, "ShutdownTimer", PathBuf::from("/opt/shutdown-timer/shutdown-timer"))
    }

    #[test]
    fn test_enable_then_disable() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        assert!(!store.is_enabled());

        assert_ok!(store.enable());
        assert!(store.is_enabled());

        assert_ok!(store.disable());
        assert!(!store.is_enabled());
    }

    #[test]
    fn test_disable_twice_is_not_an_error() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        assert_ok!(store.enable());
        assert_ok!(store.disable());
        assert_ok!(store.disable());
        assert!(!store.is_enabled());
    }

    #[test]
    fn test_entry_points_at_executable() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir.path().join("nested").join("autostart"));

        assert_ok!(store.enable());

        let content = fs::read_to_string(store.entry_path()).unwrap();
        assert!(content.starts_with("[Desktop Entry]"));
        assert!(content.contains("Exec=\"/opt/shutdown-timer/shutdown-timer\""));
        assert!(content.contains("Name=ShutdownTimer"));
        assert!(store.entry_path().ends_with("ShutdownTimer.desktop"));
    }

    #[test]
    fn test_run_key_command_is_quoted() {
        let command = run_key_command(Path::new(r"C:\Program Files\ShutdownTimer\shutdown-timer.exe"));
        assert_eq!(command, r#""C:\Program Files\ShutdownTimer\shutdown-timer.exe""#);
    }

    #[test]
    fn test_enable_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        assert_ok!(store.enable());
        assert_ok!(store.enable());
        assert!(store.is_enabled());
    }
}
