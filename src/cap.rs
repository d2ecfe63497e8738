//! 瓶盖检测模块
//!
//! 在整帧上按网格寻找"中心与周围一圈亮度明显不同"的位置，近似识别圆形瓶盖。
//! 这是一个刻意保持廉价的单遍检测，不做梯度计算或霍夫变换。
//!
//! # 主要组件
//!
//! - PixelBuffer：单帧像素数据
//! - CircleDetector：网格 + 径向边缘测试，输出候选结果
//! - suppress：按扫描顺序去除重叠候选
//! - CoordinateMapper：缓冲区坐标到显示坐标的换算
//! - draw_detections：把结果画回图像
//!
//! # 工作流程
//!
//! 1. 从帧源得到 PixelBuffer
//! 2. 调用 CircleDetector::detect 得到候选
//! 3. 调用 suppress 去除重叠
//! 4. 用 CoordinateMapper 换算到显示坐标后交给叠加层
//!
//! # 示例
//!
//! ```
//! use capscan::{CircleDetector, CoordinateMapper, PixelBuffer, suppress};
//!
//! let frame = PixelBuffer::filled(640, 480, [128, 128, 128]);
//! let candidates = CircleDetector::new().detect(&frame);
//! let kept = suppress(&candidates);
//! let mapper = CoordinateMapper::new(frame.width(), frame.height(), 1280.0, 960.0);
//! assert!(mapper.map_all(&kept).is_empty());
//! ```

pub mod bounds;
pub mod buffer;
pub mod core;
pub mod detect;
pub mod draw;
pub mod mapper;
pub mod posts;

// 重新导出常用类型和函数
pub use bounds::{Detection, DetectionSet, DisplayDetection};
pub use buffer::{PixelBuffer, load_image, resize_image};
pub use self::core::{CapPass, PassResult};
pub use detect::CircleDetector;
pub use draw::draw_detections;
pub use mapper::CoordinateMapper;
pub use posts::suppress;
