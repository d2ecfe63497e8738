use image::{DynamicImage, imageops::FilterType};
use ndarray::Array3;
use std::path::Path;

use crate::error::BufferError;

/// 单帧像素数据
///
/// 以 (高, 宽, 通道) 的形状保存行优先的 8 位像素，通道为 RGB 或 RGBA，
/// 检测时只读取前三个通道。每帧独立拥有，检测器只读访问。
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    data: Array3<u8>,
}

impl PixelBuffer {
    /// 从原始字节构造缓冲区
    ///
    /// # 参数
    /// * `width` - 帧宽度
    /// * `height` - 帧高度
    /// * `channels` - 每像素通道数，3 或 4
    /// * `raw` - 行优先的像素数据，长度至少为 `width * height * channels`，多余部分被丢弃
    ///
    /// # 示例
    ///
    /// ```
    /// use capscan::PixelBuffer;
    ///
    /// let buffer = PixelBuffer::from_raw(2, 1, 4, vec![10, 20, 30, 255, 0, 0, 0, 255]).unwrap();
    /// assert_eq!(buffer.brightness(0, 0), 20.0);
    /// ```
    pub fn from_raw(width: u32, height: u32, channels: usize, mut raw: Vec<u8>) -> Result<Self, BufferError> {
        if channels != 3 && channels != 4 {
            return Err(BufferError::UnsupportedChannels(channels));
        }
        let (w, h) = (width as usize, height as usize);
        let expected = w * h * channels;
        if raw.len() < expected {
            return Err(BufferError::TooShort { expected, actual: raw.len() });
        }
        raw.truncate(expected);
        // 长度已校验，形状必然匹配
        let data = Array3::from_shape_vec((h, w, channels), raw)
            .map_err(|_| BufferError::TooShort { expected, actual: 0 })?;
        Ok(Self { data })
    }

    /// 从图像构造 RGB 缓冲区
    pub fn from_image(img: &DynamicImage) -> Self {
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        let data = Array3::from_shape_vec((height as usize, width as usize, 3), rgb.into_raw())
            .unwrap_or_else(|_| Array3::zeros((0, 0, 3)));
        Self { data }
    }

    /// 生成纯色缓冲区
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let mut data = Array3::zeros((height as usize, width as usize, 3));
        for (c, value) in rgb.iter().enumerate() {
            data.index_axis_mut(ndarray::Axis(2), c).fill(*value);
        }
        Self { data }
    }

    pub fn width(&self) -> u32 {
        self.data.dim().1 as u32
    }

    pub fn height(&self) -> u32 {
        self.data.dim().0 as u32
    }

    pub fn channels(&self) -> usize {
        self.data.dim().2
    }

    /// 宽或高为零的帧视为未就绪
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// 读取 (x, y) 处的 RGB 值，越界时返回 None
    pub fn rgb(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        Some([self.data[[y, x, 0]], self.data[[y, x, 1]], self.data[[y, x, 2]]])
    }

    /// (x, y) 处 R、G、B 的平均值
    ///
    /// 调用方需保证坐标在帧内，越界会 panic。
    pub fn brightness(&self, x: u32, y: u32) -> f32 {
        let (x, y) = (x as usize, y as usize);
        let sum = self.data[[y, x, 0]] as u32 + self.data[[y, x, 1]] as u32 + self.data[[y, x, 2]] as u32;
        sum as f32 / 3.0
    }

    /// 写入单个像素，越界写入被忽略
    pub fn set_rgb(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        if x >= self.width() || y >= self.height() {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        for (c, value) in rgb.iter().enumerate() {
            self.data[[y, x, c]] = *value;
        }
    }

    /// 转回 RGB 图像，用于保存或绘制叠加层
    pub fn to_image(&self) -> DynamicImage {
        let (w, h) = (self.width(), self.height());
        let mut raw = Vec::with_capacity((w * h * 3) as usize);
        for row in self.data.outer_iter() {
            for pixel in row.outer_iter() {
                raw.extend_from_slice(&[pixel[0], pixel[1], pixel[2]]);
            }
        }
        image::RgbImage::from_raw(w, h, raw)
            .map(DynamicImage::ImageRgb8)
            .unwrap_or_else(|| DynamicImage::new_rgb8(0, 0))
    }
}

impl From<&DynamicImage> for PixelBuffer {
    fn from(img: &DynamicImage) -> Self {
        Self::from_image(img)
    }
}

/// 加载图像文件
///
/// # 参数
/// * `path` - 图像文件路径
///
/// # 错误处理
/// 文件不存在或无法解码时返回Err
pub fn load_image(path: impl AsRef<Path>) -> Result<DynamicImage, Box<dyn std::error::Error + Send + Sync>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(format!("图像文件不存在: {:?}", path).into());
    }
    let img = image::open(path).map_err(|e| format!("无法加载图像: {}", e))?;
    Ok(img)
}

/// 调整图像大小
///
/// 使用CatmullRom插值算法将图像调整为指定尺寸，尺寸相同时直接复制。
pub fn resize_image(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    if img.width() == width && img.height() == height {
        return img.clone();
    }
    img.resize_exact(width, height, FilterType::CatmullRom)
}
