use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use capscan::{
    CapPass, CircleDetector, CoordinateMapper, DetectionScheduler, ImageFileSource, LoopMode,
    PixelBuffer, SessionConfig, draw_detections, load_image, resize_image,
};

#[derive(Parser)]
#[command(name = "capscan", version, about = "基于网格采样的瓶盖检测工具", long_about = None)]
struct Cli {
    /// JSON 会话配置文件，缺省字段使用默认值
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 对单张图像执行一次检测
    Detect {
        /// 输入图像路径
        input: PathBuf,

        /// 输出绘制了检测结果的图像
        #[arg(short, long)]
        overlay: Option<PathBuf>,

        /// 叠加层的显示尺寸，例如 1280x960
        #[arg(long, value_parser = parse_size)]
        display: Option<(u32, u32)>,
    },

    /// 以给定图像轮流作为帧，运行定时检测会话
    Watch {
        /// 帧图像路径
        #[arg(required = true)]
        frames: Vec<PathBuf>,

        /// 检测间隔（毫秒）
        #[arg(long)]
        interval_ms: Option<u64>,

        /// 完成指定次数的检测后停止，默认持续运行直到 Ctrl-C
        #[arg(long)]
        ticks: Option<u64>,

        /// 检测结果映射到的显示尺寸，例如 1280x960
        #[arg(long, value_parser = parse_size)]
        display: Option<(u32, u32)>,
    },
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s.split_once(['x', 'X']).ok_or_else(|| format!("尺寸格式应为 WxH: {s:?}"))?;
    let w = w.trim().parse().map_err(|e| format!("宽度无效: {e}"))?;
    let h = h.trim().parse().map_err(|e| format!("高度无效: {e}"))?;
    Ok((w, h))
}

#[tokio::main]
async fn main() -> Result<()> {
    // 读取 RUST_LOG，默认 info
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };

    match cli.command {
        Commands::Detect { input, overlay, display } => cmd_detect(config, input, overlay, display),
        Commands::Watch { frames, interval_ms, ticks, display } => {
            cmd_watch(config, frames, interval_ms, ticks, display).await
        }
    }
}

fn cmd_detect(
    config: SessionConfig,
    input: PathBuf,
    overlay: Option<PathBuf>,
    display: Option<(u32, u32)>,
) -> Result<()> {
    let image = load_image(&input).map_err(|e| anyhow!(e)).context("无法加载输入图像")?;
    let buffer = PixelBuffer::from_image(&image);
    info!(width = buffer.width(), height = buffer.height(), "已加载 {}", input.display());

    let pass = CapPass::new(CircleDetector::from_config(config.detector));
    let result = pass.process(&buffer);
    println!("检测到 {} 个瓶盖（候选 {} 个）", result.detections.len(), result.candidates);
    for d in &result.detections {
        println!("  ({:>4}, {:>4})  r={}  置信度={:.3}", d.x, d.y, d.radius, d.confidence);
    }

    if let Some(path) = overlay {
        let (display_w, display_h) = display.unwrap_or((buffer.width(), buffer.height()));
        let mapper = CoordinateMapper::new(buffer.width(), buffer.height(), display_w as f32, display_h as f32);
        let base = resize_image(&image, display_w, display_h);
        let rendered = draw_detections(&base, &mapper.map_all(&result.detections));
        rendered
            .save(&path)
            .with_context(|| format!("无法写出叠加图像 {}", path.display()))?;
        info!("叠加图像已写入 {}", path.display());
    }
    Ok(())
}

async fn cmd_watch(
    mut config: SessionConfig,
    frames: Vec<PathBuf>,
    interval_ms: Option<u64>,
    ticks: Option<u64>,
    display: Option<(u32, u32)>,
) -> Result<()> {
    if let Some(ms) = interval_ms {
        config.interval_ms = ms;
    }
    if let Some(n) = ticks {
        if n == 0 {
            bail!("--ticks 至少为 1");
        }
        config.mode = LoopMode::Count(n);
    }

    let mut scheduler = DetectionScheduler::new(ImageFileSource::new(frames), config);
    if let Some((w, h)) = display {
        scheduler.set_display_size(w as f32, h as f32);
    }
    let mut updates = scheduler.subscribe();
    scheduler.start().context("无法启动检测会话")?;

    let mut last_tick = 0;
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                if snapshot.tick > last_tick {
                    last_tick = snapshot.tick;
                    println!("第 {:>4} 次: 检测到 {} 个瓶盖", snapshot.tick, snapshot.detections.len());
                    for d in &snapshot.detections {
                        println!("    cx={:.1} cy={:.1} r={:.1}", d.cx, d.cy, d.r);
                    }
                }
                if !snapshot.is_active {
                    if let Some(err) = &snapshot.last_error {
                        scheduler.stop().await;
                        bail!("检测会话已结束: {err}");
                    }
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("已中断");
                break;
            }
        }
    }

    scheduler.stop().await;
    Ok(())
}
