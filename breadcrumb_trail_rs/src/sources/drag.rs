use crate::platform::Subscription;
use crate::types::{origin, PointerEvent, Vector3};

use super::{PositionSource, SourceKind};

pub const DEFAULT_MOVE_SPEED: f64 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Gesture {
    Idle,
    Dragging { x: f64, y: f64 },
}

/// Manual fallback: pointer drags move a virtual position around.
///
/// Horizontal drag moves along x, vertical drag along z. Only single-pointer
/// gestures count; a second pointer ends the gesture and its delta is
/// dropped, since pinch/rotate deltas are ambiguous. Always available.
pub struct DragEmulationSource {
    pointer: Subscription<PointerEvent>,
    move_speed: f64,
    offset: Vector3,
    gesture: Gesture,
}

impl DragEmulationSource {
    pub fn new(move_speed: f64) -> Self {
        Self {
            pointer: Subscription::inert(),
            move_speed,
            offset: origin(),
            gesture: Gesture::Idle,
        }
    }

    pub fn with_pointer(mut self, pointer: Subscription<PointerEvent>) -> Self {
        self.pointer = pointer;
        self
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Gesture::Dragging { .. })
    }

    pub fn on_pointer(&mut self, event: PointerEvent) {
        self.gesture = match (self.gesture, event) {
            (_, PointerEvent::Down { x, y, pointers: 1 }) => Gesture::Dragging { x, y },
            (
                Gesture::Dragging {
                    x: last_x,
                    y: last_y,
                },
                PointerEvent::Move { x, y, pointers: 1 },
            ) => {
                self.apply_delta(x - last_x, y - last_y);
                Gesture::Dragging { x, y }
            }
            (Gesture::Dragging { .. }, PointerEvent::Down { .. } | PointerEvent::Move { .. }) => {
                log::debug!("Multi-pointer input, ending drag");
                Gesture::Idle
            }
            (_, PointerEvent::Up { .. }) => Gesture::Idle,
            (Gesture::Idle, _) => Gesture::Idle,
        };
    }

    /// Apply a raw drag delta in pixels. Ignored unless a drag is active.
    pub fn on_drag_delta(&mut self, dx: f64, dy: f64) {
        if self.is_dragging() {
            self.apply_delta(dx, dy);
        }
    }

    fn apply_delta(&mut self, dx: f64, dy: f64) {
        if !(dx.is_finite() && dy.is_finite()) {
            return;
        }
        self.offset.x += dx * self.move_speed;
        self.offset.z += dy * self.move_speed;
    }
}

impl Default for DragEmulationSource {
    fn default() -> Self {
        Self::new(DEFAULT_MOVE_SPEED)
    }
}

impl PositionSource for DragEmulationSource {
    fn kind(&self) -> SourceKind {
        SourceKind::DragEmulation
    }

    fn current_position(&self) -> Vector3 {
        self.offset
    }

    fn tick(&mut self, _now_ms: f64) {
        for event in self.pointer.drain() {
            self.on_pointer(event);
        }
    }
}
