//! 错误类型
//!
//! 库内部只使用这里定义的错误枚举，二进制程序在边界处统一转为 `anyhow::Error`。

use std::fmt;

/// 构造像素缓冲区时的错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// 通道数既不是 3 (RGB) 也不是 4 (RGBA)
    UnsupportedChannels(usize),
    /// 数据长度不足 `width * height * channels`
    TooShort { expected: usize, actual: usize },
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedChannels(c) => write!(f, "不支持的通道数: {c}"),
            Self::TooShort { expected, actual } => {
                write!(f, "像素数据长度不足: 需要 {expected} 字节, 实际 {actual} 字节")
            }
        }
    }
}

impl std::error::Error for BufferError {}

/// 采集单帧时的错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// 帧尚未就绪（或尺寸为零），本次 tick 跳过
    FrameNotReady,
    /// 帧源已失效，会话随之结束
    SourceLost(String),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrameNotReady => write!(f, "帧尚未就绪"),
            Self::SourceLost(reason) => write!(f, "帧源已断开: {reason}"),
        }
    }
}

impl std::error::Error for CaptureError {}

/// 启动会话时的错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// 用户拒绝了摄像头权限
    PermissionDenied,
    /// 设备不存在或无法打开
    DeviceUnavailable(String),
    /// 会话已在运行
    AlreadyActive,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "无法访问摄像头, 请授予摄像头权限"),
            Self::DeviceUnavailable(reason) => write!(f, "摄像头不可用: {reason}"),
            Self::AlreadyActive => write!(f, "检测会话已在运行"),
        }
    }
}

impl std::error::Error for SessionError {}
