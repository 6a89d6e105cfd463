//! Position sources.
//!
//! Three ways of answering "where is the user now", unified behind
//! [`PositionSource`]. [`TrackingSource`] is the tagged variant handed to the
//! recorder; only capability negotiation decides which one it holds.

pub mod absolute;
pub mod dead_reckoning;
pub mod drag;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Vector3;

pub use absolute::AbsoluteTrackingSource;
pub use dead_reckoning::DeadReckoningSource;
pub use drag::DragEmulationSource;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    AbsoluteTracking,
    DeadReckoning,
    DragEmulation,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::AbsoluteTracking => "absolute tracking",
            SourceKind::DeadReckoning => "dead reckoning",
            SourceKind::DragEmulation => "drag emulation",
        };
        f.write_str(name)
    }
}

pub trait PositionSource {
    fn kind(&self) -> SourceKind;

    /// Best-known world position. Never fails; the zero vector until
    /// tracking has produced something.
    fn current_position(&self) -> Vector3;

    /// Advance one render tick: consume queued input, integrate.
    fn tick(&mut self, _now_ms: f64) {}
}

pub enum TrackingSource {
    AbsoluteTracking(AbsoluteTrackingSource),
    DeadReckoning(DeadReckoningSource),
    DragEmulation(DragEmulationSource),
}

impl TrackingSource {
    /// Re-zero accumulated drift. Only dead reckoning accumulates drift, so
    /// the other variants ignore this and return `false`.
    pub fn reset(&mut self) -> bool {
        match self {
            TrackingSource::DeadReckoning(source) => {
                source.reset();
                true
            }
            TrackingSource::AbsoluteTracking(_) | TrackingSource::DragEmulation(_) => false,
        }
    }

    pub fn as_dead_reckoning(&self) -> Option<&DeadReckoningSource> {
        match self {
            TrackingSource::DeadReckoning(source) => Some(source),
            _ => None,
        }
    }

    pub fn as_drag_emulation_mut(&mut self) -> Option<&mut DragEmulationSource> {
        match self {
            TrackingSource::DragEmulation(source) => Some(source),
            _ => None,
        }
    }
}

impl PositionSource for TrackingSource {
    fn kind(&self) -> SourceKind {
        match self {
            TrackingSource::AbsoluteTracking(source) => source.kind(),
            TrackingSource::DeadReckoning(source) => source.kind(),
            TrackingSource::DragEmulation(source) => source.kind(),
        }
    }

    fn current_position(&self) -> Vector3 {
        match self {
            TrackingSource::AbsoluteTracking(source) => source.current_position(),
            TrackingSource::DeadReckoning(source) => source.current_position(),
            TrackingSource::DragEmulation(source) => source.current_position(),
        }
    }

    fn tick(&mut self, now_ms: f64) {
        match self {
            TrackingSource::AbsoluteTracking(source) => source.tick(now_ms),
            TrackingSource::DeadReckoning(source) => source.tick(now_ms),
            TrackingSource::DragEmulation(source) => source.tick(now_ms),
        }
    }
}

impl From<AbsoluteTrackingSource> for TrackingSource {
    fn from(source: AbsoluteTrackingSource) -> Self {
        TrackingSource::AbsoluteTracking(source)
    }
}

impl From<DeadReckoningSource> for TrackingSource {
    fn from(source: DeadReckoningSource) -> Self {
        TrackingSource::DeadReckoning(source)
    }
}

impl From<DragEmulationSource> for TrackingSource {
    fn from(source: DragEmulationSource) -> Self {
        TrackingSource::DragEmulation(source)
    }
}

impl fmt::Debug for TrackingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackingSource")
            .field("kind", &self.kind())
            .field("position", &self.current_position())
            .finish()
    }
}
