use std::time::Instant;

use crate::cap::bounds::DetectionSet;
use crate::cap::buffer::PixelBuffer;
use crate::cap::detect::CircleDetector;
use crate::cap::posts::suppress;
use crate::error::CaptureError;
use crate::source::FrameHandle;

/// 一次检测的结果
#[derive(Debug, Clone, PartialEq)]
pub struct PassResult {
    /// 抑制后的检测结果（缓冲区坐标）
    pub detections: DetectionSet,
    /// 抑制前的候选数量
    pub candidates: usize,
    /// 帧宽度
    pub width: u32,
    /// 帧高度
    pub height: u32,
}

/// 检测流程的核心结构
///
/// 把一次检测串起来：采集当前帧、网格检测、重叠抑制。不持有跨帧状态。
#[derive(Debug, Clone, Default)]
pub struct CapPass {
    detector: CircleDetector,
}

impl CapPass {
    pub fn new(detector: CircleDetector) -> Self {
        Self { detector }
    }

    pub fn detector(&self) -> &CircleDetector {
        &self.detector
    }

    /// 对已采集的帧执行检测和抑制
    pub fn process(&self, buffer: &PixelBuffer) -> PassResult {
        let candidates = self.detector.detect(buffer);
        let detections = suppress(&candidates);
        PassResult {
            candidates: candidates.len(),
            detections,
            width: buffer.width(),
            height: buffer.height(),
        }
    }

    /// 执行一次完整的检测
    ///
    /// 该方法会：
    /// 1. 从帧源采集当前帧
    /// 2. 执行网格检测
    /// 3. 去除重叠结果
    ///
    /// 采集失败时原样返回错误，由调用方决定跳过本次还是结束会话。
    pub fn act<H: FrameHandle>(&self, handle: &mut H) -> Result<PassResult, CaptureError> {
        let buffer = handle.capture_frame()?;
        if buffer.is_empty() {
            return Err(CaptureError::FrameNotReady);
        }

        let start_time = Instant::now();
        let result = self.process(&buffer);
        tracing::debug!(
            width = result.width,
            height = result.height,
            candidates = result.candidates,
            kept = result.detections.len(),
            elapsed = ?start_time.elapsed(),
            "检测完成"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{FrameFeed, FrameSource, QueuedFrameSource, SourceConfig};

    fn two_close_discs() -> PixelBuffer {
        let mut buffer = PixelBuffer::filled(200, 200, [220, 220, 220]);
        for (cx, cy) in [(95u32, 95u32), (105, 95)] {
            for y in cy - 6..=cy + 6 {
                for x in cx - 6..=cx + 6 {
                    let (dx, dy) = (x as i64 - cx as i64, y as i64 - cy as i64);
                    if dx * dx + dy * dy <= 36 {
                        buffer.set_rgb(x, y, [20, 20, 20]);
                    }
                }
            }
        }
        buffer
    }

    #[test]
    fn test_process_suppresses_later_candidate() {
        let pass = CapPass::new(CircleDetector::new().with_step(10));
        let result = pass.process(&two_close_discs());
        assert_eq!(result.candidates, 2);
        assert_eq!(result.detections.len(), 1);
        let kept = result.detections.as_slice()[0];
        assert_eq!((kept.x, kept.y), (95, 95));
        assert_eq!((result.width, result.height), (200, 200));
    }

    #[test]
    fn test_act_reports_capture_errors() {
        let feed = FrameFeed::new();
        let mut handle = QueuedFrameSource::new(feed.clone())
            .acquire(&SourceConfig::default())
            .unwrap();
        let pass = CapPass::default();
        assert_eq!(pass.act(&mut handle), Err(CaptureError::FrameNotReady));

        feed.push(PixelBuffer::filled(640, 480, [90, 90, 90])).unwrap();
        let result = pass.act(&mut handle).unwrap();
        assert!(result.detections.is_empty());
        assert_eq!(result.candidates, 0);
    }
}
