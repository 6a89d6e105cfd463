//! One-shot capability negotiation.
//!
//! Walks the platform's capabilities in priority order (absolute tracking,
//! then motion sensing, then pointer drag) and settles on exactly one
//! [`TrackingSource`]. Each asynchronous step is bounded by the configured
//! timeout, so a platform that never answers a prompt cannot stall startup.
//! Drag emulation needs nothing from the platform and always succeeds.

use std::future::Future;
use std::time::Duration;

use crate::config::TrailConfig;
use crate::error::TrailError;
use crate::platform::{MotionPermission, Platform, ReferenceSpace};
use crate::sources::{
    AbsoluteTrackingSource, DeadReckoningSource, DragEmulationSource, PositionSource, SourceKind,
    TrackingSource,
};
use crate::types::CapabilityFlags;

/// What negotiation found, for the host's status display.
#[derive(Clone, Debug, PartialEq)]
pub struct NegotiationReport {
    pub selected: SourceKind,
    pub flags: CapabilityFlags,
    /// Why each higher-priority source was passed over, in order
    pub fallbacks: Vec<TrailError>,
}

pub struct Negotiated {
    pub source: TrackingSource,
    pub report: NegotiationReport,
}

/// Must run inside a tokio runtime with the time driver enabled, since
/// every step is wrapped in `tokio::time::timeout`.
pub async fn negotiate<P>(platform: &P, config: &TrailConfig) -> Negotiated
where
    P: Platform + ?Sized,
{
    let mut fallbacks = Vec::new();
    let mut flags = CapabilityFlags {
        has_absolute_tracking: false,
        has_motion_sensor: platform.has_motion_sensor(),
        has_orientation_sensor: platform.has_orientation_sensor(),
    };

    // 1. Absolute spatial tracking
    match bounded(config, platform.is_absolute_tracking_supported()).await {
        Ok(true) => {
            flags.has_absolute_tracking = true;
            match establish_reference_space(platform, config).await {
                Ok(space) => {
                    log::info!("Absolute tracking in {} reference space", space.kind());
                    let source = AbsoluteTrackingSource::new(space);
                    return finish(source.into(), flags, fallbacks);
                }
                Err(err) => fallbacks.push(err),
            }
        }
        Ok(false) => fallbacks.push(TrailError::CapabilityUnavailable(
            "absolute spatial tracking not supported".to_string(),
        )),
        Err(err) => fallbacks.push(err),
    }

    // 2. Inertial dead reckoning
    if flags.has_motion_sensor {
        match bounded(config, platform.request_motion_permission()).await {
            Ok(MotionPermission::Granted) => {
                let mut source =
                    DeadReckoningSource::new(platform.subscribe_acceleration(), config);
                source.start_tracking();
                return finish(source.into(), flags, fallbacks);
            }
            Ok(MotionPermission::Denied) => fallbacks.push(TrailError::PermissionDenied(
                "motion sensor access declined".to_string(),
            )),
            Err(err) => fallbacks.push(err),
        }
    } else {
        fallbacks.push(TrailError::CapabilityUnavailable(
            "no motion sensor".to_string(),
        ));
    }

    // 3. Manual drag, terminal fallback
    let source = DragEmulationSource::new(config.drag_move_speed)
        .with_pointer(platform.subscribe_pointer_drag());
    finish(source.into(), flags, fallbacks)
}

async fn establish_reference_space<P>(
    platform: &P,
    config: &TrailConfig,
) -> Result<Box<dyn ReferenceSpace>, TrailError>
where
    P: Platform + ?Sized,
{
    let mut last_err = TrailError::CapabilityUnavailable("no reference space requested".into());
    for &kind in &config.reference_spaces {
        match bounded(config, platform.request_reference_space(kind)).await {
            Ok(Ok(space)) => return Ok(space),
            Ok(Err(err)) | Err(err) => {
                log::debug!("Reference space {kind} unavailable: {err}");
                last_err = err;
            }
        }
    }
    Err(last_err)
}

async fn bounded<F: Future>(config: &TrailConfig, step: F) -> Result<F::Output, TrailError> {
    tokio::time::timeout(Duration::from_millis(config.permission_timeout_ms), step)
        .await
        .map_err(|_| TrailError::PermissionTimeout(config.permission_timeout_ms))
}

fn finish(
    source: TrackingSource,
    flags: CapabilityFlags,
    fallbacks: Vec<TrailError>,
) -> Negotiated {
    for reason in &fallbacks {
        log::warn!("Fallback: {reason}");
    }
    let selected = source.kind();
    log::info!("Selected {selected} position source");
    Negotiated {
        source,
        report: NegotiationReport {
            selected,
            flags,
            fallbacks,
        },
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::TrailResult;
    use crate::platform::{ReferenceSpaceKind, Subscription};
    use crate::types::{AccelerationSample, PointerEvent, Vector3};
    use futures::future::{self, LocalBoxFuture};
    use futures::FutureExt;
    use std::cell::RefCell;

    pub(crate) struct FixedSpace(pub ReferenceSpaceKind, pub Vector3);

    impl ReferenceSpace for FixedSpace {
        fn kind(&self) -> ReferenceSpaceKind {
            self.0
        }

        fn viewer_position(&self) -> Option<Vector3> {
            Some(self.1)
        }
    }

    #[derive(Clone, Copy)]
    pub(crate) enum Answer {
        Granted,
        Denied,
        Silent,
    }

    /// Scriptable platform. Holds the host-side senders so tests can push
    /// events after negotiation.
    pub(crate) struct FakePlatform {
        pub xr: bool,
        pub spaces: Vec<ReferenceSpaceKind>,
        pub motion_sensor: bool,
        pub permission: Answer,
        pub accel_tx: RefCell<Option<tokio::sync::mpsc::UnboundedSender<AccelerationSample>>>,
        pub pointer_tx: RefCell<Option<tokio::sync::mpsc::UnboundedSender<PointerEvent>>>,
        pub requested: RefCell<Vec<ReferenceSpaceKind>>,
    }

    impl FakePlatform {
        pub(crate) fn new(xr: bool, motion_sensor: bool, permission: Answer) -> Self {
            Self {
                xr,
                spaces: vec![ReferenceSpaceKind::LocalFloor, ReferenceSpaceKind::Local],
                motion_sensor,
                permission,
                accel_tx: RefCell::new(None),
                pointer_tx: RefCell::new(None),
                requested: RefCell::new(Vec::new()),
            }
        }
    }

    impl Platform for FakePlatform {
        fn is_absolute_tracking_supported(&self) -> LocalBoxFuture<'_, bool> {
            future::ready(self.xr).boxed_local()
        }

        fn request_reference_space(
            &self,
            kind: ReferenceSpaceKind,
        ) -> LocalBoxFuture<'_, TrailResult<Box<dyn ReferenceSpace>>> {
            self.requested.borrow_mut().push(kind);
            let result: TrailResult<Box<dyn ReferenceSpace>> = if self.spaces.contains(&kind) {
                Ok(Box::new(FixedSpace(kind, Vector3::new(0.0, 1.6, 0.0))))
            } else {
                Err(TrailError::CapabilityUnavailable(format!("{kind} refused")))
            };
            future::ready(result).boxed_local()
        }

        fn request_motion_permission(&self) -> LocalBoxFuture<'_, MotionPermission> {
            match self.permission {
                Answer::Granted => future::ready(MotionPermission::Granted).boxed_local(),
                Answer::Denied => future::ready(MotionPermission::Denied).boxed_local(),
                Answer::Silent => future::pending::<MotionPermission>().boxed_local(),
            }
        }

        fn has_motion_sensor(&self) -> bool {
            self.motion_sensor
        }

        fn has_orientation_sensor(&self) -> bool {
            self.motion_sensor
        }

        fn subscribe_acceleration(&self) -> Subscription<AccelerationSample> {
            let (tx, sub) = Subscription::channel();
            *self.accel_tx.borrow_mut() = Some(tx);
            sub
        }

        fn subscribe_pointer_drag(&self) -> Subscription<PointerEvent> {
            let (tx, sub) = Subscription::channel();
            *self.pointer_tx.borrow_mut() = Some(tx);
            sub
        }
    }

    fn fast_config() -> TrailConfig {
        TrailConfig {
            permission_timeout_ms: 50,
            ..TrailConfig::default()
        }
    }

    #[tokio::test]
    async fn test_prefers_absolute_tracking() {
        let platform = FakePlatform::new(true, true, Answer::Granted);
        let negotiated = negotiate(&platform, &fast_config()).await;

        assert_eq!(negotiated.report.selected, SourceKind::AbsoluteTracking);
        assert!(negotiated.report.flags.has_absolute_tracking);
        assert!(negotiated.report.fallbacks.is_empty());
        assert_eq!(*platform.requested.borrow(), vec![ReferenceSpaceKind::LocalFloor]);
    }

    #[tokio::test]
    async fn test_falls_through_reference_space_kinds() {
        let mut platform = FakePlatform::new(true, false, Answer::Denied);
        platform.spaces = vec![ReferenceSpaceKind::Local];
        let negotiated = negotiate(&platform, &fast_config()).await;

        assert_eq!(negotiated.report.selected, SourceKind::AbsoluteTracking);
        assert_eq!(
            *platform.requested.borrow(),
            vec![ReferenceSpaceKind::LocalFloor, ReferenceSpaceKind::Local]
        );
    }

    #[tokio::test]
    async fn test_no_reference_space_falls_back_to_motion() {
        let mut platform = FakePlatform::new(true, true, Answer::Granted);
        platform.spaces.clear();
        let negotiated = negotiate(&platform, &fast_config()).await;

        assert_eq!(negotiated.report.selected, SourceKind::DeadReckoning);
        assert!(negotiated.report.flags.has_absolute_tracking);
        assert_eq!(negotiated.report.fallbacks.len(), 1);
    }

    #[tokio::test]
    async fn test_motion_permission_selects_dead_reckoning() {
        let platform = FakePlatform::new(false, true, Answer::Granted);
        let negotiated = negotiate(&platform, &fast_config()).await;

        assert_eq!(negotiated.report.selected, SourceKind::DeadReckoning);
        assert!(matches!(
            negotiated.report.fallbacks[..],
            [TrailError::CapabilityUnavailable(_)]
        ));
        let tracking = negotiated
            .source
            .as_dead_reckoning()
            .map(|s| s.is_tracking());
        assert_eq!(tracking, Some(true));
        assert!(platform.accel_tx.borrow().is_some());
    }

    #[tokio::test]
    async fn test_denied_permission_selects_drag() {
        let platform = FakePlatform::new(false, true, Answer::Denied);
        let negotiated = negotiate(&platform, &fast_config()).await;

        assert_eq!(negotiated.report.selected, SourceKind::DragEmulation);
        assert!(matches!(
            negotiated.report.fallbacks.last(),
            Some(TrailError::PermissionDenied(_))
        ));
        assert!(platform.pointer_tx.borrow().is_some());
    }

    #[tokio::test]
    async fn test_silent_permission_times_out_to_drag() {
        let platform = FakePlatform::new(false, true, Answer::Silent);
        let negotiated = negotiate(&platform, &fast_config()).await;

        assert_eq!(negotiated.report.selected, SourceKind::DragEmulation);
        assert_eq!(
            negotiated.report.fallbacks.last(),
            Some(&TrailError::PermissionTimeout(50))
        );
    }

    #[tokio::test]
    async fn test_no_sensors_selects_drag() {
        let platform = FakePlatform::new(false, false, Answer::Granted);
        let negotiated = negotiate(&platform, &fast_config()).await;

        assert_eq!(negotiated.report.selected, SourceKind::DragEmulation);
        assert_eq!(negotiated.report.flags, CapabilityFlags::default());
        assert_eq!(negotiated.report.fallbacks.len(), 2);
    }
}
