//! Rendering collaborator seam.

use serde::{Deserialize, Serialize};

use crate::config::{Rgb, TrailConfig};
use crate::types::Vector3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkerHandle(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegmentHandle(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerStyle {
    pub radius: f64,
    pub color: Rgb,
    pub emissive_intensity: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentStyle {
    pub color: Rgb,
    pub opacity: f64,
}

impl MarkerStyle {
    pub fn from_config(config: &TrailConfig) -> Self {
        Self {
            radius: config.marker_size,
            color: config.color,
            emissive_intensity: config.emissive_intensity,
        }
    }
}

impl SegmentStyle {
    pub fn from_config(config: &TrailConfig) -> Self {
        Self {
            color: config.color,
            opacity: config.segment_opacity,
        }
    }
}

/// Draws trail geometry into the host's scene.
pub trait TrailRenderer {
    fn draw_marker(&mut self, position: &Vector3, style: &MarkerStyle) -> MarkerHandle;

    fn draw_segment(&mut self, from: &Vector3, to: &Vector3, style: &SegmentStyle)
        -> SegmentHandle;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "draw", rename_all = "snake_case")]
pub enum DrawCommand {
    Marker {
        handle: MarkerHandle,
        position: Vector3,
        style: MarkerStyle,
    },
    Segment {
        handle: SegmentHandle,
        from: Vector3,
        to: Vector3,
        style: SegmentStyle,
    },
}

/// Keeps every draw request, in order. For headless hosts and replays.
#[derive(Clone, Debug, Default)]
pub struct MemoryRenderer {
    commands: Vec<DrawCommand>,
    next_handle: u64,
}

impl MemoryRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn marker_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Marker { .. }))
            .count()
    }

    pub fn segment_count(&self) -> usize {
        self.commands.len() - self.marker_count()
    }

    fn next(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }
}

impl TrailRenderer for MemoryRenderer {
    fn draw_marker(&mut self, position: &Vector3, style: &MarkerStyle) -> MarkerHandle {
        let handle = MarkerHandle(self.next());
        self.commands.push(DrawCommand::Marker {
            handle,
            position: *position,
            style: *style,
        });
        handle
    }

    fn draw_segment(
        &mut self,
        from: &Vector3,
        to: &Vector3,
        style: &SegmentStyle,
    ) -> SegmentHandle {
        let handle = SegmentHandle(self.next());
        self.commands.push(DrawCommand::Segment {
            handle,
            from: *from,
            to: *to,
            style: *style,
        });
        handle
    }
}
