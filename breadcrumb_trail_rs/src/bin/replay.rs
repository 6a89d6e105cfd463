use std::cell::RefCell;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use clap::Parser;
use flate2::read::GzDecoder;
use futures::future::{self, LocalBoxFuture};
use futures::FutureExt;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc::UnboundedSender;

use breadcrumb_trail_rs::render::{MarkerHandle, MarkerStyle, SegmentHandle, SegmentStyle};
use breadcrumb_trail_rs::{
    AccelerationSample, DampingMode, MemoryRenderer, MotionPermission, Platform, PointerEvent,
    ReferenceSpace, ReferenceSpaceKind, RerunTrailRenderer, Subscription, TrailConfig, TrailError,
    TrailRenderer, TrailResult, TrailSession, Vector3,
};

/// Replay a recorded accelerometer log through dead reckoning and the
/// trail recorder, printing the resulting breadcrumbs as JSON.
#[derive(Parser, Debug)]
struct Args {
    /// Path to a samples *.json[.gz] log
    #[arg(long, conflicts_with = "log_dir")]
    log: Option<PathBuf>,

    /// Directory of logs to batch replay (processes *.json[.gz])
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Trail config JSON; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Simulated render frame period (ms)
    #[arg(long, default_value = "16.0")]
    tick_ms: f64,

    /// Minimum ms between position samples
    #[arg(long)]
    interval: Option<f64>,

    /// Minimum distance between markers
    #[arg(long)]
    min_distance: Option<f64>,

    /// Acceleration to velocity scale
    #[arg(long)]
    sensitivity: Option<f64>,

    /// Velocity damping factor in (0, 1]
    #[arg(long)]
    damping: Option<f64>,

    /// Treat damping as a per-second decay instead of per-sample
    #[arg(long, default_value_t = false)]
    time_scaled_damping: bool,

    /// Zero velocity after this many ms without accepted motion
    #[arg(long)]
    idle_timeout: Option<f64>,

    /// Write results here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Also stream the trail to a Rerun recording (.rrd, single log only)
    #[arg(long)]
    rerun: Option<PathBuf>,
}

#[derive(Deserialize)]
struct LogFile {
    samples: Vec<AccelerationSample>,
}

fn load_log(path: &Path) -> anyhow::Result<LogFile> {
    let file = File::open(path)?;
    if path.extension().map(|e| e == "gz").unwrap_or(false) {
        let gz = GzDecoder::new(file);
        let reader = BufReader::new(gz);
        Ok(serde_json::from_reader(reader)?)
    } else {
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

fn build_config(args: &Args) -> anyhow::Result<TrailConfig> {
    let mut config = match &args.config {
        Some(path) => TrailConfig::load(path)?,
        None => TrailConfig::default(),
    };
    if let Some(v) = args.interval {
        config.interval_ms = v;
    }
    if let Some(v) = args.min_distance {
        config.min_distance = v;
    }
    if let Some(v) = args.sensitivity {
        config.sensitivity = v;
    }
    if let Some(v) = args.damping {
        config.damping = v;
    }
    if args.time_scaled_damping {
        config.damping_mode = DampingMode::TimeScaled;
    }
    if args.idle_timeout.is_some() {
        config.idle_velocity_timeout_ms = args.idle_timeout;
    }
    config.validate()?;
    Ok(config)
}

/// A motion-sensing device with no spatial tracking whose accelerometer
/// plays back a recorded log.
struct ReplayPlatform {
    accel_tx: RefCell<Option<UnboundedSender<AccelerationSample>>>,
}

impl ReplayPlatform {
    fn new() -> Self {
        Self {
            accel_tx: RefCell::new(None),
        }
    }

    fn sensor(&self) -> anyhow::Result<UnboundedSender<AccelerationSample>> {
        self.accel_tx
            .borrow()
            .clone()
            .ok_or_else(|| anyhow::anyhow!("replay accelerometer was never subscribed"))
    }
}

impl Platform for ReplayPlatform {
    fn is_absolute_tracking_supported(&self) -> LocalBoxFuture<'_, bool> {
        future::ready(false).boxed_local()
    }

    fn request_reference_space(
        &self,
        kind: ReferenceSpaceKind,
    ) -> LocalBoxFuture<'_, TrailResult<Box<dyn ReferenceSpace>>> {
        future::ready(Err(TrailError::CapabilityUnavailable(format!(
            "{kind} not available during replay"
        ))))
        .boxed_local()
    }

    fn request_motion_permission(&self) -> LocalBoxFuture<'_, MotionPermission> {
        future::ready(MotionPermission::Granted).boxed_local()
    }

    fn has_motion_sensor(&self) -> bool {
        true
    }

    fn has_orientation_sensor(&self) -> bool {
        false
    }

    fn subscribe_acceleration(&self) -> Subscription<AccelerationSample> {
        let (tx, sub) = Subscription::channel();
        *self.accel_tx.borrow_mut() = Some(tx);
        sub
    }

    fn subscribe_pointer_drag(&self) -> Subscription<PointerEvent> {
        Subscription::inert()
    }
}

enum ReplayRenderer {
    Memory(MemoryRenderer),
    Rerun(RerunTrailRenderer),
}

impl ReplayRenderer {
    fn set_time(&self, now_ms: f64) {
        if let ReplayRenderer::Rerun(rerun) = self {
            rerun.set_time(now_ms);
        }
    }
}

impl TrailRenderer for ReplayRenderer {
    fn draw_marker(&mut self, position: &Vector3, style: &MarkerStyle) -> MarkerHandle {
        match self {
            ReplayRenderer::Memory(r) => r.draw_marker(position, style),
            ReplayRenderer::Rerun(r) => r.draw_marker(position, style),
        }
    }

    fn draw_segment(
        &mut self,
        from: &Vector3,
        to: &Vector3,
        style: &SegmentStyle,
    ) -> SegmentHandle {
        match self {
            ReplayRenderer::Memory(r) => r.draw_segment(from, to, style),
            ReplayRenderer::Rerun(r) => r.draw_segment(from, to, style),
        }
    }
}

/// Render frame times from `start_ms`, `tick_ms` apart. The last frame
/// always lands on `end_ms` so trailing samples are delivered.
fn frame_times(start_ms: f64, end_ms: f64, tick_ms: f64) -> Vec<f64> {
    let mut frames = Vec::new();
    let mut now = start_ms;
    while now < end_ms {
        frames.push(now);
        now += tick_ms;
    }
    frames.push(end_ms);
    frames
}

async fn run_once(
    path: &Path,
    config: &TrailConfig,
    tick_ms: f64,
    renderer: ReplayRenderer,
) -> anyhow::Result<serde_json::Value> {
    let mut samples = load_log(path)?.samples;
    samples.retain(|s| s.timestamp_ms.is_finite());
    samples.sort_by(|a, b| a.timestamp_ms.total_cmp(&b.timestamp_ms));
    let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
        anyhow::bail!("{} has no samples", path.display());
    };
    let (start_ms, end_ms) = (first.timestamp_ms, last.timestamp_ms);

    let platform = ReplayPlatform::new();
    let mut session = TrailSession::start(&platform, config.clone(), renderer).await?;
    let sensor = platform.sensor()?;

    let mut pending = samples.iter().peekable();
    let frames = frame_times(start_ms, end_ms, tick_ms);
    for &now in &frames {
        while let Some(sample) = pending.next_if(|s| s.timestamp_ms <= now) {
            sensor.send(*sample)?;
        }
        session.recorder().renderer().set_time(now);
        session.tick(now)?;
    }
    let frames = frames.len();

    let status = session.status();
    log::info!(
        "{}: {} samples, {} frames, {} markers, path {:.2}",
        path.display(),
        samples.len(),
        frames,
        status.marker_count,
        status.path_length
    );

    Ok(json!({
        "log": path.display().to_string(),
        "samples": samples.len(),
        "duration_s": (end_ms - start_ms) / 1000.0,
        "frames": frames,
        "markers": session.recorder().markers(),
        "status": status,
    }))
}

fn is_log_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    path.is_file() && (name.ends_with(".json") || name.ends_with(".json.gz"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if !(args.tick_ms.is_finite() && args.tick_ms > 0.0) {
        anyhow::bail!("--tick-ms must be positive");
    }
    let config = build_config(&args)?;
    let mut results = Vec::new();

    if let Some(dir) = args.log_dir.as_ref() {
        if args.rerun.is_some() {
            anyhow::bail!("--rerun needs a single --log");
        }
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !is_log_file(&path) {
                continue;
            }
            let renderer = ReplayRenderer::Memory(MemoryRenderer::new());
            match run_once(&path, &config, args.tick_ms, renderer).await {
                Ok(res) => results.push(res),
                Err(e) => log::error!("Failed {}: {}", path.display(), e),
            }
        }
    } else if let Some(log) = args.log.as_ref() {
        let renderer = match &args.rerun {
            Some(rrd) => ReplayRenderer::Rerun(RerunTrailRenderer::new(&rrd.to_string_lossy())?),
            None => ReplayRenderer::Memory(MemoryRenderer::new()),
        };
        results.push(run_once(log, &config, args.tick_ms, renderer).await?);
    } else {
        anyhow::bail!("Provide --log or --log-dir");
    }

    let report = serde_json::to_string_pretty(&results)?;
    match &args.output {
        Some(path) => {
            fs::write(path, report)?;
            log::info!("Wrote {} result(s) to {}", results.len(), path.display());
        }
        None => println!("{report}"),
    }
    Ok(())
}
