use crate::cap::bounds::{Detection, DisplayDetection};

/// 缓冲区坐标到显示坐标的映射
///
/// 半径只按水平缩放系数换算。显示区域宽高比与帧不一致时，绘制出的圆在纵向上会失真，
/// 这与叠加层的既有表现保持一致，未做修正。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    scale_x: f32,
    scale_y: f32,
}

impl CoordinateMapper {
    /// 根据帧尺寸和显示尺寸计算缩放系数
    ///
    /// 帧尺寸为零（画面尚未加载）时对应方向的系数取 1。
    pub fn new(buffer_w: u32, buffer_h: u32, display_w: f32, display_h: f32) -> Self {
        let scale = |display: f32, buffer: u32| {
            if buffer == 0 { 1.0 } else { display / buffer as f32 }
        };
        Self {
            scale_x: scale(display_w, buffer_w),
            scale_y: scale(display_h, buffer_h),
        }
    }

    pub fn scale(&self) -> (f32, f32) {
        (self.scale_x, self.scale_y)
    }

    pub fn map(&self, detection: &Detection) -> DisplayDetection {
        DisplayDetection {
            cx: detection.x as f32 * self.scale_x,
            cy: detection.y as f32 * self.scale_y,
            r: detection.radius as f32 * self.scale_x,
        }
    }

    pub fn map_all<'a>(&self, detections: impl IntoIterator<Item = &'a Detection>) -> Vec<DisplayDetection> {
        detections.into_iter().map(|d| self.map(d)).collect()
    }
}

/// 单个检测结果的映射
pub fn map(
    detection: &Detection,
    buffer_w: u32,
    buffer_h: u32,
    display_w: f32,
    display_h: f32,
) -> DisplayDetection {
    CoordinateMapper::new(buffer_w, buffer_h, display_w, display_h).map(detection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_scale() {
        let d = Detection::new(95, 55, 15, 1.0);
        assert_eq!(map(&d, 640, 480, 640.0, 480.0), DisplayDetection { cx: 95.0, cy: 55.0, r: 15.0 });
    }

    #[test]
    fn test_radius_follows_horizontal_scale_only() {
        let d = Detection::new(100, 100, 15, 1.0);
        let mapped = map(&d, 640, 480, 1280.0, 480.0);
        assert_eq!(mapped.cx, 200.0);
        assert_eq!(mapped.cy, 100.0);
        assert_eq!(mapped.r, 30.0);
    }

    #[test]
    fn test_zero_buffer_falls_back_to_unit_scale() {
        let mapper = CoordinateMapper::new(0, 0, 800.0, 600.0);
        assert_eq!(mapper.scale(), (1.0, 1.0));
    }

    #[test]
    fn test_map_all_keeps_order() {
        let mapper = CoordinateMapper::new(320, 240, 640.0, 480.0);
        let detections = [Detection::new(15, 15, 15, 1.0), Detection::new(55, 15, 15, 0.75)];
        let mapped = mapper.map_all(detections.iter());
        assert_eq!(mapped.len(), 2);
        assert_eq!(mapped[1], DisplayDetection { cx: 110.0, cy: 30.0, r: 30.0 });
    }
}
