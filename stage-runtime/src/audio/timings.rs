//! # Timings 模块
//!
//! 音频渐变时长配置。

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 默认淡入时长
pub const DEFAULT_FADE_IN: Duration = Duration::from_millis(1000);
/// 默认淡出时长
pub const DEFAULT_FADE_OUT: Duration = Duration::from_millis(500);
/// 默认平滑调音时长
pub const DEFAULT_VOLUME_RAMP: Duration = Duration::from_millis(300);

/// 渐变时长配置
///
/// 可由宿主从配置加载覆盖；测试中常用极短时长。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FadeTimings {
    /// 淡入时长
    pub fade_in: Duration,
    /// 淡出时长
    pub fade_out: Duration,
    /// 平滑调音时长
    pub volume_ramp: Duration,
}

impl Default for FadeTimings {
    fn default() -> Self {
        Self {
            fade_in: DEFAULT_FADE_IN,
            fade_out: DEFAULT_FADE_OUT,
            volume_ramp: DEFAULT_VOLUME_RAMP,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let timings = FadeTimings::default();
        assert_eq!(timings.fade_in, Duration::from_millis(1000));
        assert_eq!(timings.fade_out, Duration::from_millis(500));
        assert_eq!(timings.volume_ramp, Duration::from_millis(300));
    }

    #[test]
    fn test_serialization() {
        let timings = FadeTimings::default();
        let json = serde_json::to_string(&timings).unwrap();
        let back: FadeTimings = serde_json::from_str(&json).unwrap();
        assert_eq!(timings, back);
    }
}
