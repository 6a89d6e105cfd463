use crate::platform::{ReferenceSpace, ReferenceSpaceKind};
use crate::types::{origin, Vector3};

use super::{PositionSource, SourceKind};

/// Position straight from the platform's spatial tracker.
///
/// Caches the last reported pose, so frames where tracking is briefly lost
/// keep the previous position instead of snapping to the origin.
pub struct AbsoluteTrackingSource {
    space: Box<dyn ReferenceSpace>,
    rig_offset: Vector3,
    last_pose: Option<Vector3>,
    missed_frames: u64,
}

impl AbsoluteTrackingSource {
    pub fn new(space: Box<dyn ReferenceSpace>) -> Self {
        Self {
            space,
            rig_offset: origin(),
            last_pose: None,
            missed_frames: 0,
        }
    }

    /// Offset of the camera rig in the world, added to every tracked pose.
    pub fn with_rig_offset(mut self, offset: Vector3) -> Self {
        self.rig_offset = offset;
        self
    }

    pub fn set_rig_offset(&mut self, offset: Vector3) {
        self.rig_offset = offset;
    }

    pub fn reference_space_kind(&self) -> ReferenceSpaceKind {
        self.space.kind()
    }

    /// Ticks on which the tracker had no usable pose.
    pub fn missed_frames(&self) -> u64 {
        self.missed_frames
    }
}

impl PositionSource for AbsoluteTrackingSource {
    fn kind(&self) -> SourceKind {
        SourceKind::AbsoluteTracking
    }

    fn current_position(&self) -> Vector3 {
        match self.last_pose {
            Some(pose) => pose + self.rig_offset,
            None => origin(),
        }
    }

    fn tick(&mut self, _now_ms: f64) {
        match self.space.viewer_position() {
            Some(pose) if pose.iter().all(|c| c.is_finite()) => self.last_pose = Some(pose),
            _ => self.missed_frames += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    struct ScriptedSpace {
        poses: RefCell<VecDeque<Option<Vector3>>>,
    }

    impl ReferenceSpace for ScriptedSpace {
        fn kind(&self) -> ReferenceSpaceKind {
            ReferenceSpaceKind::LocalFloor
        }

        fn viewer_position(&self) -> Option<Vector3> {
            self.poses.borrow_mut().pop_front().flatten()
        }
    }

    fn scripted(poses: Vec<Option<Vector3>>) -> Box<dyn ReferenceSpace> {
        Box::new(ScriptedSpace {
            poses: RefCell::new(poses.into()),
        })
    }

    #[test]
    fn test_zero_before_first_pose() {
        let source = AbsoluteTrackingSource::new(scripted(vec![]));
        assert_eq!(source.current_position(), Vector3::zeros());
        assert_eq!(source.reference_space_kind(), ReferenceSpaceKind::LocalFloor);
    }

    #[test]
    fn test_holds_last_pose_through_dropouts() {
        let mut source = AbsoluteTrackingSource::new(scripted(vec![
            Some(Vector3::new(1.0, 1.6, 2.0)),
            None,
            Some(Vector3::new(f64::NAN, 1.6, 2.0)),
        ]));
        source.tick(0.0);
        source.tick(16.0);
        source.tick(32.0);
        assert_eq!(source.current_position(), Vector3::new(1.0, 1.6, 2.0));
        assert_eq!(source.missed_frames(), 2);
    }

    #[test]
    fn test_rig_offset_is_added() {
        let mut source = AbsoluteTrackingSource::new(scripted(vec![Some(Vector3::new(
            0.5, 1.6, 0.0,
        ))]))
        .with_rig_offset(Vector3::new(10.0, 0.0, -3.0));
        source.tick(0.0);
        assert_eq!(source.current_position(), Vector3::new(10.5, 1.6, -3.0));
    }
}
