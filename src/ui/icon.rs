//! 图标资源
//!
//! 查找并解码 icon.ico；找不到时窗口不设置图标，托盘使用生成的默认图标

use log::{debug, warn};
use std::path::{Path, PathBuf};

/// 图标文件名
pub const ICON_FILE_NAME: &str = "icon.ico";

/// 默认托盘图标边长
const DEFAULT_ICON_SIZE: u32 = 64;

/// RGBA 图标数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconImage {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl IconImage {
    /// 从文件解码
    pub fn load(path: &Path) -> Option<Self> {
        match image::open(path) {
            Ok(img) => {
                let rgba = img.to_rgba8();
                let (width, height) = rgba.dimensions();
                debug!("已加载图标 {:?} ({}x{})", path, width, height);
                Some(Self {
                    rgba: rgba.into_raw(),
                    width,
                    height,
                })
            }
            Err(e) => {
                warn!("解码图标失败 {:?}: {}", path, e);
                None
            }
        }
    }

    /// 生成默认图标：黑色底，中间白色方块
    pub fn generated() -> Self {
        let size = DEFAULT_ICON_SIZE;
        let inner = (size / 4)..=(size * 3 / 4);
        let mut rgba = Vec::with_capacity((size * size * 4) as usize);

        for y in 0..size {
            for x in 0..size {
                if inner.contains(&x) && inner.contains(&y) {
                    rgba.extend_from_slice(&[255, 255, 255, 255]);
                } else {
                    rgba.extend_from_slice(&[0, 0, 0, 255]);
                }
            }
        }

        Self {
            rgba,
            width: size,
            height: size,
        }
    }
}

/// 图标候选路径：程序所在目录优先，其次是开发目录下的 assets
fn icon_candidates(file_name: &str) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        candidates.push(exe_dir.join(file_name));
    }

    candidates.push(Path::new(env!("CARGO_MANIFEST_DIR")).join("assets").join(file_name));
    candidates
}

/// 查找第一个存在的图标文件
pub fn resolve_icon_path(file_name: &str) -> Option<PathBuf> {
    icon_candidates(file_name).into_iter().find(|path| path.is_file())
}

/// 加载程序图标，找不到时返回 None
pub fn load_app_icon() -> Option<IconImage> {
    match resolve_icon_path(ICON_FILE_NAME) {
        Some(path) => IconImage::load(&path),
        None => {
            debug!("未找到 {}，不设置自定义图标", ICON_FILE_NAME);
            None
        }
    }
}

/// 转换为窗口图标
pub fn window_icon(image: &IconImage) -> Option<iced::window::Icon> {
    iced::window::icon::from_rgba(image.rgba.clone(), image.width, image.height)
        .map_err(|e| warn!("窗口图标无效: {}", e))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_icon_layout() {
        let icon = IconImage::generated();
        assert_eq!(icon.rgba.len(), 64 * 64 * 4);

        // 角落是黑色，中心是白色
        assert_eq!(&icon.rgba[0..4], &[0, 0, 0, 255]);
        let center = ((32 * 64 + 32) * 4) as usize;
        assert_eq!(&icon.rgba[center..center + 4], &[255, 255, 255, 255]);
    }

    #[test]
    fn test_missing_icon_is_tolerated() {
        assert!(resolve_icon_path("no-such-icon-file.ico").is_none());
        assert!(IconImage::load(Path::new("no-such-icon-file.ico")).is_none());
    }

    #[test]
    fn test_candidates_prefer_executable_dir() {
        let candidates = icon_candidates(ICON_FILE_NAME);
        assert!(candidates.len() >= 1);
        assert!(candidates.last().unwrap().ends_with("assets/icon.ico"));
    }
}
