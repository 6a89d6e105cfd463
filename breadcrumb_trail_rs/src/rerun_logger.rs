use anyhow::Result;
use rerun::{LineStrips3D, Points3D, RecordingStreamBuilder};

use crate::config::Rgb;
use crate::render::{MarkerHandle, MarkerStyle, SegmentHandle, SegmentStyle, TrailRenderer};
use crate::types::{to_f32_array, Vector3};

/// Streams trail geometry to a Rerun recording for offline inspection.
/// Markers land under `trail/markers/{n}`, segments under `trail/segments/{n}`.
pub struct RerunTrailRenderer {
    rec: rerun::RecordingStream,
    next: u64,
}

impl RerunTrailRenderer {
    /// Initialize Rerun recording to file (e.g. "trail_sessions/replay.rrd")
    pub fn new(output_path: &str) -> Result<Self> {
        let rec = RecordingStreamBuilder::new("breadcrumb_trail")
            .save(output_path)
            .map_err(|e| anyhow::anyhow!("Failed to create Rerun recording: {}", e))?;

        log::info!("Rerun recording initialized to: {}", output_path);

        Ok(Self { rec, next: 0 })
    }

    /// Set the current time for all subsequent logs
    pub fn set_time(&self, now_ms: f64) {
        self.rec.set_time_seconds("stable_time", now_ms / 1000.0);
    }

    fn next(&mut self) -> u64 {
        let handle = self.next;
        self.next += 1;
        handle
    }
}

/// Unmultiplied RGBA as Rerun takes it.
fn rerun_color(color: Rgb, opacity: f64) -> [u8; 4] {
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    [color.r, color.g, color.b, alpha]
}

impl TrailRenderer for RerunTrailRenderer {
    fn draw_marker(&mut self, position: &Vector3, style: &MarkerStyle) -> MarkerHandle {
        let handle = MarkerHandle(self.next());
        let points = Points3D::new([to_f32_array(position)])
            .with_radii([style.radius as f32])
            .with_colors([rerun_color(style.color, 1.0)]);
        if let Err(e) = self.rec.log(format!("trail/markers/{}", handle.0), &points) {
            log::warn!("Rerun marker log failed: {e}");
        }
        handle
    }

    fn draw_segment(
        &mut self,
        from: &Vector3,
        to: &Vector3,
        style: &SegmentStyle,
    ) -> SegmentHandle {
        let handle = SegmentHandle(self.next());
        let strip = LineStrips3D::new([[to_f32_array(from), to_f32_array(to)]])
            .with_colors([rerun_color(style.color, style.opacity)]);
        if let Err(e) = self.rec.log(format!("trail/segments/{}", handle.0), &strip) {
            log::warn!("Rerun segment log failed: {e}");
        }
        handle
    }
}
