use serde::{Deserialize, Serialize};

use crate::config::TrailConfig;
use crate::error::{TrailError, TrailResult};
use crate::render::{MarkerHandle, MarkerStyle, SegmentHandle, SegmentStyle, TrailRenderer};
use crate::sources::{PositionSource, TrackingSource};
use crate::types::{TrailMarker, TrailSegment, Vector3};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecorderState {
    /// No position source bound yet
    Idle,
    /// Sampling a bound source
    Armed,
}

/// Turns a position source into a breadcrumb trail.
///
/// Sampling is rate limited by `interval_ms`, independent of how often the
/// source updates or the host ticks. A marker is dropped when the position
/// has moved at least `min_distance` from the previous marker; the very
/// first sample always anchors marker #0. Every marker after the first is
/// joined to its predecessor by a segment.
pub struct TrailRecorder<R: TrailRenderer> {
    interval_ms: f64,
    min_distance: f64,
    marker_style: MarkerStyle,
    segment_style: SegmentStyle,
    renderer: R,
    source: Option<TrackingSource>,
    markers: Vec<TrailMarker>,
    marker_handles: Vec<MarkerHandle>,
    segment_handles: Vec<SegmentHandle>,
    last_sample_ms: Option<f64>,
}

impl<R: TrailRenderer> TrailRecorder<R> {
    pub fn new(config: &TrailConfig, renderer: R) -> TrailResult<Self> {
        config.validate()?;
        Ok(Self {
            interval_ms: config.interval_ms,
            min_distance: config.min_distance,
            marker_style: MarkerStyle::from_config(config),
            segment_style: SegmentStyle::from_config(config),
            renderer,
            source: None,
            markers: Vec::new(),
            marker_handles: Vec::new(),
            segment_handles: Vec::new(),
            last_sample_ms: None,
        })
    }

    /// Bind the position source to sample. Sources are chosen once per
    /// session, so binding twice is an error.
    pub fn bind(&mut self, source: TrackingSource) -> TrailResult<()> {
        if let Some(bound) = &self.source {
            return Err(TrailError::Configuration(format!(
                "trail recorder already bound to {} source",
                bound.kind()
            )));
        }
        log::info!("Trail recorder armed with {} source", source.kind());
        self.source = Some(source);
        Ok(())
    }

    pub fn state(&self) -> RecorderState {
        if self.source.is_some() {
            RecorderState::Armed
        } else {
            RecorderState::Idle
        }
    }

    /// Advance the bound source by one render tick, then sample it.
    pub fn tick(&mut self, now_ms: f64) -> TrailResult<Option<TrailMarker>> {
        self.bound_source_mut()?.tick(now_ms);
        self.maybe_sample(now_ms)
    }

    /// Sample the bound source if the interval allows, dropping a marker
    /// when it has moved far enough.
    pub fn maybe_sample(&mut self, now_ms: f64) -> TrailResult<Option<TrailMarker>> {
        let position = self.bound_source_mut()?.current_position();

        if !now_ms.is_finite() {
            return Ok(None);
        }
        if let Some(last) = self.last_sample_ms {
            if now_ms - last < self.interval_ms {
                return Ok(None);
            }
        }
        // The interval restarts whether or not a marker is dropped
        self.last_sample_ms = Some(now_ms);

        if !position.iter().all(|c| c.is_finite()) {
            log::warn!("Ignoring non-finite position sample at {now_ms:.0} ms");
            return Ok(None);
        }

        let far_enough = match self.markers.last() {
            Some(previous) => (position - previous.position).norm() >= self.min_distance,
            None => true,
        };
        if !far_enough {
            return Ok(None);
        }

        Ok(Some(self.drop_marker(position)))
    }

    fn drop_marker(&mut self, position: Vector3) -> TrailMarker {
        let marker = TrailMarker {
            position,
            sequence_index: self.markers.len() as u64,
        };

        self.marker_handles
            .push(self.renderer.draw_marker(&position, &self.marker_style));
        if let Some(previous) = self.markers.last() {
            let handle =
                self.renderer
                    .draw_segment(&previous.position, &position, &self.segment_style);
            self.segment_handles.push(handle);
        }
        self.markers.push(marker);

        log::debug!(
            "Dropped breadcrumb #{} at {:.2}, {:.2}, {:.2}",
            marker.sequence_index,
            position.x,
            position.y,
            position.z
        );
        marker
    }

    fn bound_source_mut(&mut self) -> TrailResult<&mut TrackingSource> {
        self.source.as_mut().ok_or_else(|| {
            TrailError::Configuration("trail recorder has no position source bound".to_string())
        })
    }

    pub fn source(&self) -> Option<&TrackingSource> {
        self.source.as_ref()
    }

    pub fn source_mut(&mut self) -> Option<&mut TrackingSource> {
        self.source.as_mut()
    }

    pub fn markers(&self) -> &[TrailMarker] {
        &self.markers
    }

    pub fn last_marker(&self) -> Option<&TrailMarker> {
        self.markers.last()
    }

    pub fn segments(&self) -> impl Iterator<Item = TrailSegment> + '_ {
        self.markers.windows(2).map(|pair| TrailSegment {
            from: pair[0],
            to: pair[1],
        })
    }

    /// Total length of the recorded path.
    pub fn path_length(&self) -> f64 {
        self.segments().map(|s| s.length()).sum()
    }

    pub fn marker_handles(&self) -> &[MarkerHandle] {
        &self.marker_handles
    }

    pub fn segment_handles(&self) -> &[SegmentHandle] {
        &self.segment_handles
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }
}
