//! 检测调度
//!
//! 会话只有两种状态：空闲和运行中。运行中由一个独立的 tokio 工作任务按固定间隔执行检测，
//! 每次成功检测都发布一份新的不可变快照，读者通过 `watch` 通道拿到快照，互不干扰。
//! 检测不会重叠：一次检测耗时超过间隔时，下一次顺延。

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::cap::bounds::{DetectionSet, DisplayDetection};
use crate::cap::core::{CapPass, PassResult};
use crate::cap::detect::CircleDetector;
use crate::cap::mapper::CoordinateMapper;
use crate::config::SessionConfig;
use crate::error::{CaptureError, SessionError};
use crate::source::{FrameHandle, FrameSource};

/// 对外发布的会话状态
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    /// 会话是否运行中
    pub is_active: bool,
    /// 显示坐标下的检测结果
    pub detections: Vec<DisplayDetection>,
    /// 缓冲区坐标下的检测结果
    pub raw: DetectionSet,
    /// 产生这些结果的帧尺寸
    pub frame_size: (u32, u32),
    /// 本次会话已完成的检测次数
    pub tick: u64,
    /// 最近一次错误
    pub last_error: Option<String>,
}

struct Worker {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// 周期性检测调度器
///
/// # 示例
///
/// ```
/// use capscan::{DetectionScheduler, FrameFeed, QueuedFrameSource, SessionConfig};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let feed = FrameFeed::new();
/// let mut scheduler = DetectionScheduler::new(QueuedFrameSource::new(feed.clone()), SessionConfig::default());
/// scheduler.start().unwrap();
/// assert!(scheduler.is_active());
/// scheduler.stop().await;
/// assert!(!scheduler.is_active());
/// # }
/// ```
pub struct DetectionScheduler<S: FrameSource> {
    source: S,
    config: SessionConfig,
    state_tx: watch::Sender<Arc<SessionSnapshot>>,
    display_tx: watch::Sender<Option<(f32, f32)>>,
    worker: Option<Worker>,
}

impl<S: FrameSource> DetectionScheduler<S> {
    pub fn new(source: S, config: SessionConfig) -> Self {
        let (state_tx, _) = watch::channel(Arc::new(SessionSnapshot::default()));
        let (display_tx, _) = watch::channel(None);
        Self {
            source,
            config,
            state_tx,
            display_tx,
            worker: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// 设置叠加层的显示尺寸，未设置时按帧尺寸原样输出
    pub fn set_display_size(&self, width: f32, height: f32) {
        self.display_tx.send_replace(Some((width, height)));
    }

    /// 订阅状态快照
    pub fn subscribe(&self) -> watch::Receiver<Arc<SessionSnapshot>> {
        self.state_tx.subscribe()
    }

    /// 当前快照
    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        self.state_tx.borrow().clone()
    }

    pub fn is_active(&self) -> bool {
        self.state_tx.borrow().is_active
    }

    /// 启动检测会话
    ///
    /// 必须在 tokio 运行时中调用。申请帧源失败时保持空闲，错误同时记录到快照中。
    pub fn start(&mut self) -> Result<(), SessionError> {
        // 工作任务发布空闲状态前已释放帧源，此后只剩返回，可以直接回收
        if let Some(worker) = &self.worker {
            if !worker.handle.is_finished() && self.state_tx.borrow().is_active {
                return Err(SessionError::AlreadyActive);
            }
        }
        self.worker = None;

        let handle = match self.source.acquire(&self.config.source) {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(error = %e, "无法启动检测会话");
                self.state_tx.send_modify(|state| {
                    let mut next = (**state).clone();
                    next.is_active = false;
                    next.last_error = Some(e.to_string());
                    *state = Arc::new(next);
                });
                return Err(e);
            }
        };

        self.state_tx.send_replace(Arc::new(SessionSnapshot {
            is_active: true,
            ..SessionSnapshot::default()
        }));

        let (stop_tx, stop_rx) = watch::channel(false);
        let session = Session {
            pass: CapPass::new(CircleDetector::from_config(self.config.detector)),
            config: self.config.clone(),
            state_tx: self.state_tx.clone(),
            display_rx: self.display_tx.subscribe(),
        };
        let handle = tokio::spawn(session.run(handle, stop_rx));

        tracing::info!(interval_ms = self.config.interval_ms, mode = ?self.config.mode, "检测会话已启动");
        self.worker = Some(Worker { stop_tx, handle });
        Ok(())
    }

    /// 停止检测会话
    ///
    /// 返回时工作任务已退出、帧源已释放、已发布的检测结果已清空。空闲时调用无副作用。
    pub async fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        let _ = worker.stop_tx.send(true);
        if let Err(e) = worker.handle.await {
            tracing::warn!(error = %e, "检测任务异常退出");
        }

        self.state_tx.send_modify(|state| {
            *state = Arc::new(SessionSnapshot {
                is_active: false,
                last_error: state.last_error.clone(),
                ..SessionSnapshot::default()
            });
        });
        tracing::info!("检测会话已停止");
    }
}

impl<S: FrameSource> Drop for DetectionScheduler<S> {
    fn drop(&mut self) {
        if let Some(worker) = &self.worker {
            let _ = worker.stop_tx.send(true);
        }
    }
}

enum SessionEnd {
    Stopped,
    Finished,
    Lost(String),
}

/// 工作任务持有的会话数据
struct Session {
    pass: CapPass,
    config: SessionConfig,
    state_tx: watch::Sender<Arc<SessionSnapshot>>,
    display_rx: watch::Receiver<Option<(f32, f32)>>,
}

impl Session {
    async fn run<H: FrameHandle>(self, mut handle: H, mut stop_rx: watch::Receiver<bool>) {
        let mut ticker = time::interval(self.config.interval().max(time::Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // 第一次 tick 立即完成，首次检测在一个间隔之后
        ticker.tick().await;

        let started = Instant::now();
        let mut ticks = 0u64;

        let end = loop {
            tokio::select! {
                biased;
                _ = stop_rx.changed() => break SessionEnd::Stopped,
                _ = ticker.tick() => {}
            }
            if *stop_rx.borrow() {
                break SessionEnd::Stopped;
            }

            match self.pass.act(&mut handle) {
                Ok(result) => {
                    ticks += 1;
                    self.publish(result, ticks);
                }
                Err(CaptureError::FrameNotReady) => {
                    // 保留上一次发布的结果
                    tracing::debug!("帧未就绪, 跳过本次检测");
                }
                Err(CaptureError::SourceLost(reason)) => break SessionEnd::Lost(reason),
            }

            if !self.config.mode.should_continue(ticks, started.elapsed()) {
                break SessionEnd::Finished;
            }
        };

        handle.release();

        match end {
            // stop() 负责清空状态
            SessionEnd::Stopped => {}
            SessionEnd::Finished => {
                tracing::info!(ticks, "检测会话已完成");
                self.state_tx.send_modify(|state| {
                    let mut next = (**state).clone();
                    next.is_active = false;
                    *state = Arc::new(next);
                });
            }
            SessionEnd::Lost(reason) => {
                tracing::warn!(%reason, "帧源丢失, 检测会话结束");
                self.state_tx.send_replace(Arc::new(SessionSnapshot {
                    is_active: false,
                    last_error: Some(CaptureError::SourceLost(reason).to_string()),
                    ..SessionSnapshot::default()
                }));
            }
        }
    }

    fn publish(&self, result: PassResult, tick: u64) {
        let (display_w, display_h) = self
            .display_rx
            .borrow()
            .unwrap_or((result.width as f32, result.height as f32));
        let mapper = CoordinateMapper::new(result.width, result.height, display_w, display_h);

        self.state_tx.send_replace(Arc::new(SessionSnapshot {
            is_active: true,
            detections: mapper.map_all(&result.detections),
            raw: result.detections,
            frame_size: (result.width, result.height),
            tick,
            last_error: None,
        }));
    }
}
