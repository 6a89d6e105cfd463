use chrono::{DateTime, Utc};

use crate::config::TrailConfig;
use crate::error::TrailResult;
use crate::live_status::TrailStatus;
use crate::negotiation::{negotiate, Negotiated, NegotiationReport};
use crate::platform::Platform;
use crate::recorder::TrailRecorder;
use crate::render::TrailRenderer;
use crate::sources::PositionSource;
use crate::types::{TrailMarker, Vector3};

/// A running trail: the negotiated source bound to a recorder.
///
/// Lifecycle: `start` (validate config, negotiate once, bind), then `tick`
/// once per rendered frame for the rest of the session.
pub struct TrailSession<R: TrailRenderer> {
    recorder: TrailRecorder<R>,
    report: NegotiationReport,
    started_at: DateTime<Utc>,
    ticks: u64,
}

impl<R: TrailRenderer> TrailSession<R> {
    /// Validate, negotiate, bind. Negotiation bounds each platform step with
    /// a tokio timer, so this must be awaited inside a tokio runtime with the
    /// time driver enabled (`#[tokio::main]` or `#[tokio::test]` both do).
    pub async fn start<P>(platform: &P, config: TrailConfig, renderer: R) -> TrailResult<Self>
    where
        P: Platform + ?Sized,
    {
        let mut recorder = TrailRecorder::new(&config, renderer)?;
        let Negotiated { source, report } = negotiate(platform, &config).await;
        recorder.bind(source)?;

        Ok(Self {
            recorder,
            report,
            started_at: Utc::now(),
            ticks: 0,
        })
    }

    /// One render frame. Returns the marker dropped on this frame, if any.
    pub fn tick(&mut self, now_ms: f64) -> TrailResult<Option<TrailMarker>> {
        self.ticks += 1;
        self.recorder.tick(now_ms)
    }

    /// Clear dead-reckoning drift. Does not re-negotiate; returns `false`
    /// when the active source has nothing to reset.
    pub fn reset(&mut self) -> bool {
        self.recorder
            .source_mut()
            .map(|source| source.reset())
            .unwrap_or(false)
    }

    pub fn current_position(&self) -> Vector3 {
        self.recorder
            .source()
            .map(|source| source.current_position())
            .unwrap_or_else(Vector3::zeros)
    }

    pub fn report(&self) -> &NegotiationReport {
        &self.report
    }

    pub fn recorder(&self) -> &TrailRecorder<R> {
        &self.recorder
    }

    pub fn recorder_mut(&mut self) -> &mut TrailRecorder<R> {
        &mut self.recorder
    }

    pub fn status(&self) -> TrailStatus {
        let now = Utc::now();
        let dead_reckoning = self.recorder.source().and_then(|s| s.as_dead_reckoning());
        let (accepted_samples, rejected_samples) = dead_reckoning
            .map(|s| s.sample_counts())
            .unwrap_or((0, 0));

        TrailStatus {
            timestamp: now.to_rfc3339(),
            uptime_seconds: (now - self.started_at).num_milliseconds().max(0) as f64 / 1000.0,
            ticks: self.ticks,
            source: self.report.selected,
            flags: self.report.flags,
            fallbacks: self.report.fallbacks.iter().map(|e| e.to_string()).collect(),
            marker_count: self.recorder.markers().len(),
            path_length: self.recorder.path_length(),
            position: self.current_position(),
            velocity: dead_reckoning.map(|s| s.velocity()),
            accepted_samples,
            rejected_samples,
        }
    }
}
