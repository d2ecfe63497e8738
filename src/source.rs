//! 帧源
//!
//! 摄像头本身属于外部协作方，这里只定义检测调度需要的最小接口：
//! 申请设备、逐帧采集、释放设备。另外提供两个实现：
//! - [`ImageFileSource`]：循环读取静态图像，供命令行使用
//! - [`QueuedFrameSource`]：由宿主推送帧，供嵌入方和测试使用

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::cap::buffer::{PixelBuffer, load_image, resize_image};
use crate::config::{DEFAULT_FRAME_HEIGHT, DEFAULT_FRAME_WIDTH};
use crate::error::{CaptureError, SessionError};
use crate::utils::stream::Stream;

/// 摄像头朝向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// 后置摄像头
    #[default]
    Environment,
    /// 前置摄像头
    User,
}

/// 申请帧源时的请求参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub facing: FacingMode,
    pub width: u32,
    pub height: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            facing: FacingMode::Environment,
            width: DEFAULT_FRAME_WIDTH,
            height: DEFAULT_FRAME_HEIGHT,
        }
    }
}

/// 可申请的帧源
pub trait FrameSource {
    type Handle: FrameHandle;

    /// 申请设备，失败时返回 `PermissionDenied` 或 `DeviceUnavailable`
    fn acquire(&mut self, config: &SourceConfig) -> Result<Self::Handle, SessionError>;
}

/// 已申请到的帧源句柄
///
/// 句柄归调度器的工作任务所有，会话结束时由 [`FrameHandle::release`] 显式释放。
pub trait FrameHandle: Send + 'static {
    /// 采集当前帧
    fn capture_frame(&mut self) -> Result<PixelBuffer, CaptureError>;

    /// 释放设备
    fn release(self);
}

/// 循环读取一组图像文件的帧源
pub struct ImageFileSource {
    paths: Vec<PathBuf>,
}

impl ImageFileSource {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

impl FrameSource for ImageFileSource {
    type Handle = ImageFileHandle;

    fn acquire(&mut self, config: &SourceConfig) -> Result<Self::Handle, SessionError> {
        if self.paths.is_empty() {
            return Err(SessionError::DeviceUnavailable("没有可读取的图像".to_string()));
        }
        if let Some(missing) = self.paths.iter().find(|p| !p.exists()) {
            return Err(SessionError::DeviceUnavailable(format!("图像文件不存在: {}", missing.display())));
        }
        tracing::info!(frames = self.paths.len(), facing = ?config.facing, "已打开图像帧源");
        Ok(ImageFileHandle {
            paths: self.paths.clone(),
            next: 0,
            config: *config,
        })
    }
}

pub struct ImageFileHandle {
    paths: Vec<PathBuf>,
    next: usize,
    config: SourceConfig,
}

impl FrameHandle for ImageFileHandle {
    fn capture_frame(&mut self) -> Result<PixelBuffer, CaptureError> {
        let path = &self.paths[self.next % self.paths.len()];
        self.next = self.next.wrapping_add(1);

        // 单个文件读不出来只影响本帧，轮到其他文件时仍可继续
        let img = load_image(path).map_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "无法读取图像帧");
            CaptureError::FrameNotReady
        })?;
        // 按请求的分辨率输出，与摄像头行为一致
        let img = if self.config.width > 0 && self.config.height > 0 {
            resize_image(&img, self.config.width, self.config.height)
        } else {
            img
        };
        let buffer = PixelBuffer::from_image(&img);
        if buffer.is_empty() {
            return Err(CaptureError::FrameNotReady);
        }
        Ok(buffer)
    }

    fn release(self) {
        tracing::debug!(frames_read = self.next, "已释放图像帧源");
    }
}

struct FeedState {
    frames: Stream<PixelBuffer>,
    connected: bool,
    acquired: bool,
    acquisitions: usize,
    last_config: Option<SourceConfig>,
}

/// 宿主向帧源推送帧的入口，可克隆后在任意线程使用
#[derive(Clone)]
pub struct FrameFeed {
    state: Arc<Mutex<FeedState>>,
}

impl FrameFeed {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FeedState {
                frames: Stream::new(),
                connected: true,
                acquired: false,
                acquisitions: 0,
                last_config: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 推送一帧，队列已满时把帧交还
    pub fn push(&self, frame: PixelBuffer) -> Result<(), PixelBuffer> {
        self.lock().frames.write(frame)
    }

    /// 待采集的帧数
    pub fn pending(&self) -> usize {
        self.lock().frames.len()
    }

    /// 模拟设备断开，之后的采集会报告帧源丢失
    pub fn disconnect(&self) {
        self.lock().connected = false;
    }

    /// 设备当前是否被占用
    pub fn is_acquired(&self) -> bool {
        self.lock().acquired
    }

    /// 累计申请次数
    pub fn acquisitions(&self) -> usize {
        self.lock().acquisitions
    }

    /// 最近一次申请时的请求参数
    pub fn last_config(&self) -> Option<SourceConfig> {
        self.lock().last_config
    }
}

impl Default for FrameFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// 由 [`FrameFeed`] 供帧的帧源
pub struct QueuedFrameSource {
    feed: FrameFeed,
    permission_granted: bool,
}

impl QueuedFrameSource {
    pub fn new(feed: FrameFeed) -> Self {
        Self { feed, permission_granted: true }
    }

    /// 拒绝授权的帧源，申请总是失败
    pub fn denied(feed: FrameFeed) -> Self {
        Self { feed, permission_granted: false }
    }

    pub fn feed(&self) -> &FrameFeed {
        &self.feed
    }
}

impl FrameSource for QueuedFrameSource {
    type Handle = QueuedFrameHandle;

    fn acquire(&mut self, config: &SourceConfig) -> Result<Self::Handle, SessionError> {
        if !self.permission_granted {
            return Err(SessionError::PermissionDenied);
        }
        let mut state = self.feed.lock();
        if !state.connected {
            return Err(SessionError::DeviceUnavailable("设备已断开".to_string()));
        }
        if state.acquired {
            return Err(SessionError::DeviceUnavailable("设备已被占用".to_string()));
        }
        state.acquired = true;
        state.acquisitions += 1;
        state.last_config = Some(*config);
        Ok(QueuedFrameHandle { feed: self.feed.clone() })
    }
}

pub struct QueuedFrameHandle {
    feed: FrameFeed,
}

impl FrameHandle for QueuedFrameHandle {
    fn capture_frame(&mut self) -> Result<PixelBuffer, CaptureError> {
        let mut state = self.feed.lock();
        if !state.connected {
            return Err(CaptureError::SourceLost("设备已断开".to_string()));
        }
        match state.frames.read() {
            Some(frame) if !frame.is_empty() => Ok(frame),
            _ => Err(CaptureError::FrameNotReady),
        }
    }

    fn release(self) {
        self.feed.lock().acquired = false;
    }
}
