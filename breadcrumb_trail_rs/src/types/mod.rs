pub mod linalg;

pub use linalg::*;

use serde::{Deserialize, Serialize};

/// Raw motion-sensor reading, in the sensor's acceleration units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccelerationSample {
    pub ax: f64,
    pub ay: f64,
    pub az: f64,
    pub timestamp_ms: f64,
}

impl AccelerationSample {
    pub fn new(ax: f64, ay: f64, az: f64, timestamp_ms: f64) -> Self {
        Self {
            ax,
            ay,
            az,
            timestamp_ms,
        }
    }

    pub fn magnitude(&self) -> f64 {
        (self.ax * self.ax + self.ay * self.ay + self.az * self.az).sqrt()
    }
}

/// Pointer input as delivered by the host, in screen pixels.
///
/// `pointers` is the number of simultaneous pointers down when the event
/// fired (for `Up`, the number still down afterwards).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEvent {
    Down { x: f64, y: f64, pointers: u32 },
    Move { x: f64, y: f64, pointers: u32 },
    Up { pointers: u32 },
}

/// What the platform turned out to support. Computed once during
/// negotiation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityFlags {
    pub has_absolute_tracking: bool,
    pub has_motion_sensor: bool,
    pub has_orientation_sensor: bool,
}

/// A recorded point along the path. `sequence_index` starts at 0 and has no
/// gaps.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrailMarker {
    pub position: Vector3,
    pub sequence_index: u64,
}

/// Connection between two consecutive markers. Derived from the marker list,
/// never stored.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TrailSegment {
    pub from: TrailMarker,
    pub to: TrailMarker,
}

impl TrailSegment {
    pub fn length(&self) -> f64 {
        (self.to.position - self.from.position).norm()
    }
}
