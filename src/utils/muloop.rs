use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 循环模式枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopMode {
    /// 按次数循环
    Count(u64),
    /// 按时间循环（毫秒）
    Duration(u64),
    /// 持续循环直到手动停止
    #[default]
    Continuous,
}

impl LoopMode {
    /// 已执行 `ticks` 次、历时 `elapsed` 后是否还应继续
    pub fn should_continue(&self, ticks: u64, elapsed: Duration) -> bool {
        match *self {
            LoopMode::Count(count) => ticks < count,
            LoopMode::Duration(duration_ms) => elapsed < Duration::from_millis(duration_ms),
            LoopMode::Continuous => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_mode() {
        let mode = LoopMode::Count(3);
        assert!(mode.should_continue(2, Duration::ZERO));
        assert!(!mode.should_continue(3, Duration::ZERO));
    }

    #[test]
    fn test_duration_mode() {
        let mode = LoopMode::Duration(1000);
        assert!(mode.should_continue(100, Duration::from_millis(999)));
        assert!(!mode.should_continue(1, Duration::from_millis(1000)));
    }

    #[test]
    fn test_continuous_never_ends() {
        assert!(LoopMode::Continuous.should_continue(u64::MAX, Duration::MAX));
    }

    #[test]
    fn test_json_form() {
        assert_eq!(serde_json::to_string(&LoopMode::Continuous).unwrap(), r#""continuous""#);
        assert_eq!(serde_json::from_str::<LoopMode>(r#"{"count":3}"#).unwrap(), LoopMode::Count(3));
    }
}
