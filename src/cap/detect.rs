use std::f64::consts::PI;

use crate::cap::bounds::Detection;
use crate::cap::buffer::PixelBuffer;
use crate::config::DetectorConfig;

/// 圆形瓶盖检测器
///
/// 在规则网格上逐点测试"中心与半径圆周之间的亮度突变"，是一种粗粒度的单遍检测，
/// 足够便宜，可以每个周期对整帧运行一次。对边界对比强烈的瓶盖效果较好，
/// 低对比背景或尺寸明显偏离 `radius` 的瓶盖容易漏检。
///
/// # 示例
///
/// ```
/// use capscan::{CircleDetector, PixelBuffer};
///
/// let detector = CircleDetector::new()
///     .with_step(20)
///     .with_radius(15);
/// let gray = PixelBuffer::filled(640, 480, [128, 128, 128]);
/// assert!(detector.detect(&gray).is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CircleDetector {
    config: DetectorConfig,
}

impl CircleDetector {
    /// 使用默认参数创建检测器
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// 设置网格步长
    pub fn with_step(mut self, step: u32) -> Self {
        self.config.step = step;
        self
    }

    /// 设置采样半径
    pub fn with_radius(mut self, radius: u32) -> Self {
        self.config.radius = radius;
        self
    }

    /// 设置圆周采样点数
    pub fn with_sample_count(mut self, sample_count: u32) -> Self {
        self.config.sample_count = sample_count;
        self
    }

    /// 设置边缘亮度差阈值
    pub fn with_edge_threshold(mut self, threshold: f32) -> Self {
        self.config.edge_threshold = threshold;
        self
    }

    /// 设置触发检测的边缘比例
    pub fn with_edge_fraction(mut self, fraction: f32) -> Self {
        self.config.edge_fraction = fraction;
        self
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// 对一帧执行检测，返回未经抑制的候选结果（扫描顺序）
    pub fn detect(&self, buffer: &PixelBuffer) -> Vec<Detection> {
        let c = &self.config;
        detect(buffer, c.step, c.radius, c.sample_count, c.edge_threshold, c.edge_fraction)
    }
}

/// 圆周上各采样点相对中心的偏移，第 k 个点的角度为 k·2π/n
fn ring_offsets(radius: u32, sample_count: u32) -> Vec<(f64, f64)> {
    let angle_step = 2.0 * PI / sample_count as f64;
    (0..sample_count)
        .map(|k| {
            let angle = k as f64 * angle_step;
            (angle.cos() * radius as f64, angle.sin() * radius as f64)
        })
        .collect()
}

/// 以 (x, y) 为中心、取整到最近像素的圆周采样坐标
///
/// 中心满足 `radius <= x < W - radius` 时，所有坐标都落在帧内。
pub fn ring_points(x: u32, y: u32, radius: u32, sample_count: u32) -> Vec<(u32, u32)> {
    ring_offsets(radius, sample_count)
        .into_iter()
        .map(|offset| round_point(x, y, offset))
        .collect()
}

fn round_point(x: u32, y: u32, (dx, dy): (f64, f64)) -> (u32, u32) {
    let sx = (x as f64 + dx).round();
    let sy = (y as f64 + dy).round();
    (sx as u32, sy as u32)
}

/// 执行一次完整的网格检测
///
/// # 参数
/// * `buffer` - 待检测的帧
/// * `step` - 网格步长
/// * `radius` - 采样圆半径
/// * `sample_count` - 圆周采样点数
/// * `edge_threshold` - 采样点与中心亮度差超过此值即计为边缘
/// * `edge_fraction` - 边缘点数达到 `edge_fraction * sample_count` 时输出检测
///
/// # 返回值
/// 按行优先扫描顺序排列的候选结果。参数非法或帧小于 `2 * radius` 时返回空列表。
pub fn detect(
    buffer: &PixelBuffer,
    step: u32,
    radius: u32,
    sample_count: u32,
    edge_threshold: f32,
    edge_fraction: f32,
) -> Vec<Detection> {
    let (width, height) = (buffer.width(), buffer.height());
    if step == 0 || radius == 0 || sample_count == 0 {
        return Vec::new();
    }
    // 等价于 2 * radius >= min(W, H)，避免超大半径相乘溢出
    let shorter = width.min(height);
    if radius >= shorter / 2 + shorter % 2 {
        tracing::trace!(width, height, radius, "帧小于两倍半径, 跳过检测");
        return Vec::new();
    }

    let offsets = ring_offsets(radius, sample_count);
    let required = edge_fraction * sample_count as f32;
    let mut detected = Vec::new();

    for y in (radius..height - radius).step_by(step as usize) {
        for x in (radius..width - radius).step_by(step as usize) {
            let center_brightness = buffer.brightness(x, y);

            let mut edge_count = 0u32;
            for offset in &offsets {
                let (sx, sy) = round_point(x, y, *offset);
                debug_assert!(sx < width && sy < height);
                if (buffer.brightness(sx, sy) - center_brightness).abs() > edge_threshold {
                    edge_count += 1;
                }
            }

            if edge_count as f32 >= required {
                detected.push(Detection::new(x, y, radius, edge_count as f32 / sample_count as f32));
            }
        }
    }

    detected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disc(buffer: &mut PixelBuffer, cx: u32, cy: u32, r: u32, rgb: [u8; 3]) {
        let r2 = (r * r) as i64;
        for y in 0..buffer.height() {
            for x in 0..buffer.width() {
                let dx = x as i64 - cx as i64;
                let dy = y as i64 - cy as i64;
                if dx * dx + dy * dy <= r2 {
                    buffer.set_rgb(x, y, rgb);
                }
            }
        }
    }

    #[test]
    fn test_uniform_frame_has_no_detections() {
        let buffer = PixelBuffer::filled(640, 480, [128, 128, 128]);
        assert!(CircleDetector::new().detect(&buffer).is_empty());
    }

    #[test]
    fn test_small_frame_returns_empty() {
        // 2 * radius == min(W, H)
        let mut buffer = PixelBuffer::filled(30, 100, [255, 255, 255]);
        disc(&mut buffer, 15, 50, 5, [0, 0, 0]);
        assert!(CircleDetector::new().detect(&buffer).is_empty());
        assert!(CircleDetector::new().detect(&PixelBuffer::filled(0, 0, [0, 0, 0])).is_empty());
    }

    #[test]
    fn test_oversized_radius_returns_empty() {
        let buffer = PixelBuffer::filled(640, 480, [128, 128, 128]);
        assert!(detect(&buffer, 20, u32::MAX, 16, 30.0, 0.625).is_empty());
        let config: DetectorConfig = serde_json::from_str(r#"{"radius": 2147483648}"#).unwrap();
        assert!(CircleDetector::from_config(config).detect(&buffer).is_empty());

        // 奇数短边：2 * 15 < 31，仍然扫描
        let mut odd = PixelBuffer::filled(31, 31, [200, 200, 200]);
        disc(&mut odd, 15, 15, 10, [20, 20, 20]);
        assert_eq!(CircleDetector::new().detect(&odd).len(), 1);
        assert!(CircleDetector::new().with_radius(16).detect(&odd).is_empty());
    }

    #[test]
    fn test_degenerate_parameters_return_empty() {
        let mut buffer = PixelBuffer::filled(200, 200, [200, 200, 200]);
        disc(&mut buffer, 95, 95, 15, [40, 40, 40]);
        assert!(detect(&buffer, 0, 15, 16, 30.0, 0.625).is_empty());
        assert!(detect(&buffer, 20, 0, 16, 30.0, 0.625).is_empty());
        assert!(detect(&buffer, 20, 15, 0, 30.0, 0.625).is_empty());
    }

    #[test]
    fn test_disc_on_default_grid() {
        let mut buffer = PixelBuffer::filled(200, 200, [200, 200, 200]);
        disc(&mut buffer, 95, 95, 15, [40, 40, 40]);
        let detections = CircleDetector::new().detect(&buffer);
        assert_eq!(detections.len(), 1);
        let d = detections[0];
        assert_eq!((d.x, d.y, d.radius), (95, 95, 15));
        // 四个轴向采样点恰好落在圆盘边界上，不计为边缘
        assert_eq!(d.confidence, 12.0 / 16.0);
    }

    #[test]
    fn test_smaller_disc_scores_full_confidence() {
        let mut buffer = PixelBuffer::filled(200, 200, [30, 30, 30]);
        disc(&mut buffer, 55, 75, 10, [250, 240, 230]);
        let detections = CircleDetector::new().detect(&buffer);
        assert_eq!(detections, vec![Detection::new(55, 75, 15, 1.0)]);
    }

    #[test]
    fn test_threshold_is_strict() {
        // 中心与背景的亮度差恰好等于阈值
        let mut buffer = PixelBuffer::filled(100, 100, [100, 100, 100]);
        disc(&mut buffer, 35, 35, 8, [130, 130, 130]);
        assert!(CircleDetector::new().detect(&buffer).is_empty());
        assert_eq!(CircleDetector::new().with_edge_threshold(29.0).detect(&buffer).len(), 1);
    }

    #[test]
    fn test_edge_fraction_gates_emission() {
        let mut buffer = PixelBuffer::filled(200, 200, [200, 200, 200]);
        disc(&mut buffer, 95, 95, 15, [40, 40, 40]);
        let strict = CircleDetector::new().with_edge_fraction(13.0 / 16.0);
        assert!(strict.detect(&buffer).is_empty());
        let loose = CircleDetector::new().with_edge_fraction(12.0 / 16.0);
        assert_eq!(loose.detect(&buffer).len(), 1);
    }

    #[test]
    fn test_scan_order_is_row_major() {
        let mut buffer = PixelBuffer::filled(200, 200, [0, 0, 0]);
        for (cx, cy) in [(135, 55), (55, 135), (55, 55), (135, 135)] {
            disc(&mut buffer, cx, cy, 8, [255, 255, 255]);
        }
        let centers: Vec<_> = CircleDetector::new()
            .detect(&buffer)
            .iter()
            .map(|d| (d.x, d.y))
            .collect();
        assert_eq!(centers, vec![(55, 55), (135, 55), (55, 135), (135, 135)]);
    }

    #[test]
    fn test_ring_points_stay_inside_margin() {
        let (w, h, r) = (64u32, 48u32, 15u32);
        for n in [4, 7, 16, 33] {
            for y in r..h - r {
                for x in r..w - r {
                    for (sx, sy) in ring_points(x, y, r, n) {
                        assert!(sx < w && sy < h, "({sx}, {sy}) out of frame for n={n}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_ring_points_default_layout() {
        let points = ring_points(100, 100, 15, 16);
        assert_eq!(points.len(), 16);
        assert_eq!(points[0], (115, 100));
        assert_eq!(points[2], (111, 111));
        assert_eq!(points[4], (100, 115));
        assert_eq!(points[8], (85, 100));
        assert_eq!(points[12], (100, 85));
    }
}
