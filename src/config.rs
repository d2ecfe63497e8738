use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::source::SourceConfig;
use crate::utils::muloop::LoopMode;

pub const STREAM_CAPACITY: usize = 16;  // 帧队列容量

// 检测超参数默认值
pub const DEFAULT_STEP: u32 = 20;
pub const DEFAULT_RADIUS: u32 = 15;
pub const DEFAULT_SAMPLE_COUNT: u32 = 16;
pub const DEFAULT_EDGE_THRESHOLD: f32 = 30.0;   // 亮度尺度 0-255
pub const DEFAULT_EDGE_FRACTION: f32 = 10.0 / 16.0;

// 调度与采集默认值
pub const DEFAULT_INTERVAL_MS: u64 = 500;
pub const DEFAULT_FRAME_WIDTH: u32 = 640;
pub const DEFAULT_FRAME_HEIGHT: u32 = 480;

/// 单次检测的参数
///
/// 所有字段都有默认值，JSON 中缺省的字段会回落到默认值。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// 候选网格步长（像素）
    pub step: u32,
    /// 采样圆半径（像素）
    pub radius: u32,
    /// 圆周采样点数
    pub sample_count: u32,
    /// 判定为边缘的亮度差阈值
    pub edge_threshold: f32,
    /// 触发检测所需的边缘点比例
    pub edge_fraction: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            step: DEFAULT_STEP,
            radius: DEFAULT_RADIUS,
            sample_count: DEFAULT_SAMPLE_COUNT,
            edge_threshold: DEFAULT_EDGE_THRESHOLD,
            edge_fraction: DEFAULT_EDGE_FRACTION,
        }
    }
}

/// 一次检测会话的完整配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// 两次检测之间的间隔（毫秒）
    pub interval_ms: u64,
    /// 循环模式
    pub mode: LoopMode,
    /// 帧源请求参数
    pub source: SourceConfig,
    /// 检测参数
    pub detector: DetectorConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
            mode: LoopMode::Continuous,
            source: SourceConfig::default(),
            detector: DetectorConfig::default(),
        }
    }
}

impl SessionConfig {
    /// 从 JSON 文件加载配置
    ///
    /// # 参数
    /// * `path` - 配置文件路径
    ///
    /// # 错误处理
    /// 文件无法读取或内容不是合法 JSON 时返回Err
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("配置文件格式错误: {}", path.display()))?;
        tracing::info!(path = %path.display(), "已加载配置");
        Ok(config)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}
