//! 预设时长
//!
//! 固定的快捷关机时长，按声明顺序每行四个排布

/// 每行按钮数量
pub const PRESET_COLUMNS: usize = 4;

/// 预设时长（标签，秒数）
///
/// 每个按钮在创建时绑定自己的预设值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetDelay {
    pub label: &'static str,
    pub seconds: u64,
}

impl PresetDelay {
    const fn new(label: &'static str, seconds: u64) -> Self {
        Self { label, seconds }
    }
}

pub const PRESETS: [PresetDelay; 11] = [
    PresetDelay::new("1 min", 60),
    PresetDelay::new("5 min", 300),
    PresetDelay::new("10 min", 600),
    PresetDelay::new("15 min", 900),
    PresetDelay::new("30 min", 1800),
    PresetDelay::new("1h", 3600),
    PresetDelay::new("1h30", 5400),
    PresetDelay::new("2h", 7200),
    PresetDelay::new("3h", 10800),
    PresetDelay::new("4h", 14400),
    PresetDelay::new("5h", 18000),
];

/// 按网格行切分预设
pub fn preset_rows() -> impl Iterator<Item = &'static [PresetDelay]> {
    PRESETS.chunks(PRESET_COLUMNS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_table_is_fixed() {
        let seconds: Vec<u64> = PRESETS.iter().map(|p| p.seconds).collect();
        assert_eq!(
            seconds,
            vec![60, 300, 600, 900, 1800, 3600, 5400, 7200, 10800, 14400, 18000]
        );

        let labels: Vec<&str> = PRESETS.iter().map(|p| p.label).collect();
        assert_eq!(
            labels,
            vec!["1 min", "5 min", "10 min", "15 min", "30 min", "1h", "1h30", "2h", "3h", "4h", "5h"]
        );
    }

    #[test]
    fn test_preset_grid_layout() {
        let rows: Vec<&[PresetDelay]> = preset_rows().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].len(), 4);
        assert_eq!(rows[1].len(), 4);
        assert_eq!(rows[2].len(), 3);
        assert_eq!(rows[1][0].label, "30 min");
        assert_eq!(rows[2][2].label, "5h");
    }
}
