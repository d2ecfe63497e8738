use image::{DynamicImage, GenericImageView};
use raqote::{DrawOptions, DrawTarget, PathBuilder, SolidSource, Source, StrokeStyle};
use std::f32::consts::PI;

use crate::cap::bounds::DisplayDetection;

/// 叠加层颜色 (#10b981)
const OVERLAY_COLOR: SolidSource = SolidSource { r: 0x10, g: 0xB9, b: 0x81, a: 0xFF };
const RING_WIDTH: f32 = 3.0;
const DOT_RADIUS: f32 = 4.0;

/// 在图像上绘制检测结果
///
/// 每个结果画一个空心圆环和一个实心中心点。检测结果应已映射到 `image` 的坐标系。
///
/// # 参数
/// * `image` - 底图（显示尺寸）
/// * `detections` - 显示坐标下的检测结果
///
/// # 返回值
/// 返回绘制了叠加层的新图像
pub fn draw_detections(image: &DynamicImage, detections: &[DisplayDetection]) -> DynamicImage {
    let (img_width, img_height) = image.dimensions();
    let mut dt = DrawTarget::new(img_width as i32, img_height as i32);

    let rgba_image = image.to_rgba8();
    let image_data: Vec<u32> = rgba_image
        .chunks(4)
        .map(|pixel| u32::from_le_bytes([pixel[2], pixel[1], pixel[0], pixel[3]]))
        .collect();
    let img = raqote::Image {
        width: img_width as i32,
        height: img_height as i32,
        data: &image_data,
    };
    dt.draw_image_at(0.0, 0.0, &img, &DrawOptions::new());

    let source = Source::Solid(OVERLAY_COLOR);
    for detection in detections {
        let mut pb = PathBuilder::new();
        pb.arc(detection.cx, detection.cy, detection.r, 0.0, 2.0 * PI);
        pb.close();
        dt.stroke(
            &pb.finish(),
            &source,
            &StrokeStyle { width: RING_WIDTH, ..StrokeStyle::default() },
            &DrawOptions::new(),
        );

        let mut pb = PathBuilder::new();
        pb.arc(detection.cx, detection.cy, DOT_RADIUS, 0.0, 2.0 * PI);
        pb.close();
        dt.fill(&pb.finish(), &source, &DrawOptions::new());
    }

    let pixels: Vec<u8> = dt
        .get_data()
        .iter()
        .flat_map(|&pixel| {
            let bytes = pixel.to_le_bytes();
            [bytes[2], bytes[1], bytes[0], bytes[3]] // BGRA -> RGBA
        })
        .collect();

    image::RgbaImage::from_raw(img_width, img_height, pixels)
        .map(DynamicImage::ImageRgba8)
        .unwrap_or_else(|| image.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_marks_center_and_ring() {
        let base = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(64, 64, image::Rgb([0, 0, 0])));
        let out = draw_detections(&base, &[DisplayDetection { cx: 32.0, cy: 32.0, r: 15.0 }]);
        assert_eq!(out.dimensions(), (64, 64));

        let center = out.get_pixel(32, 32).0;
        assert_eq!(&center[..3], &[0x10, 0xB9, 0x81]);
        let on_ring = out.get_pixel(47, 32).0;
        assert!(on_ring[1] > 0x80);
        // 圆环与中心点之间保持原样
        assert_eq!(&out.get_pixel(42, 32).0[..3], &[0, 0, 0]);
    }

    #[test]
    fn test_no_detections_leaves_image_untouched() {
        let base = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(8, 8, image::Rgb([12, 34, 56])));
        let out = draw_detections(&base, &[]);
        let pixel = out.get_pixel(3, 3).0;
        for (got, want) in pixel.iter().zip([12u8, 34, 56, 255]) {
            assert!(got.abs_diff(want) <= 1, "{pixel:?}");
        }
    }
}
