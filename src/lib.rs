pub mod cap;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod source;
pub mod utils;

// 重新导出cap模块中的常用类型和函数
pub use cap::{CircleDetector, CapPass, CoordinateMapper, Detection, DetectionSet, DisplayDetection, PixelBuffer};
pub use cap::{draw_detections, load_image, resize_image, suppress};
pub use config::{DetectorConfig, SessionConfig};
pub use error::{BufferError, CaptureError, SessionError};
pub use scheduler::{DetectionScheduler, SessionSnapshot};
pub use source::{FacingMode, FrameFeed, FrameHandle, FrameSource, ImageFileSource, QueuedFrameSource, SourceConfig};
pub use utils::muloop::LoopMode;
