//! Platform collaborator seam.
//!
//! The host implements [`Platform`] over whatever it runs on (an XR runtime,
//! a mobile browser, a desktop window). Sources receive the handles they
//! need at construction; nothing here is looked up globally.

use std::fmt;

use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

use crate::error::TrailResult;
use crate::types::{AccelerationSample, PointerEvent, Vector3};

/// Coordinate frames an absolute tracker can report poses against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceSpaceKind {
    Viewer,
    Local,
    LocalFloor,
    BoundedFloor,
    Unbounded,
}

impl fmt::Display for ReferenceSpaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReferenceSpaceKind::Viewer => "viewer",
            ReferenceSpaceKind::Local => "local",
            ReferenceSpaceKind::LocalFloor => "local-floor",
            ReferenceSpaceKind::BoundedFloor => "bounded-floor",
            ReferenceSpaceKind::Unbounded => "unbounded",
        };
        f.write_str(name)
    }
}

/// An established absolute-tracking frame.
pub trait ReferenceSpace {
    fn kind(&self) -> ReferenceSpaceKind;

    /// Viewer position in this frame for the current frame, if the tracker
    /// has a pose right now.
    fn viewer_position(&self) -> Option<Vector3>;
}

/// Outcome of a motion-sensing permission request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionPermission {
    Granted,
    Denied,
}

/// Everything the trail core needs from the host platform.
///
/// Futures are local (not `Send`): the whole subsystem runs on one logical
/// thread.
pub trait Platform {
    fn is_absolute_tracking_supported(&self) -> LocalBoxFuture<'_, bool>;

    fn request_reference_space(
        &self,
        kind: ReferenceSpaceKind,
    ) -> LocalBoxFuture<'_, TrailResult<Box<dyn ReferenceSpace>>>;

    /// Prompts on platforms that gate motion sensing; resolves immediately
    /// elsewhere.
    fn request_motion_permission(&self) -> LocalBoxFuture<'_, MotionPermission>;

    fn has_motion_sensor(&self) -> bool;

    fn has_orientation_sensor(&self) -> bool;

    fn subscribe_acceleration(&self) -> Subscription<AccelerationSample>;

    fn subscribe_pointer_drag(&self) -> Subscription<PointerEvent>;
}

/// A live registration for host events.
///
/// Events queue up between ticks and are drained in arrival order by the
/// owning source. Dropping the subscription (or calling
/// [`Subscription::unsubscribe`]) runs the teardown hook, which is where the
/// host detaches its listener.
pub struct Subscription<T> {
    receiver: UnboundedReceiver<T>,
    teardown: Option<Box<dyn FnOnce()>>,
}

impl<T> Subscription<T> {
    /// New subscription plus the sender the host pushes events into.
    pub fn channel() -> (UnboundedSender<T>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            tx,
            Self {
                receiver: rx,
                teardown: None,
            },
        )
    }

    /// A subscription that never delivers anything.
    pub fn inert() -> Self {
        let (_tx, subscription) = Self::channel();
        subscription
    }

    pub fn with_teardown(mut self, teardown: impl FnOnce() + 'static) -> Self {
        self.teardown = Some(Box::new(teardown));
        self
    }

    /// Next queued event, if any, without waiting.
    pub fn try_next(&mut self) -> Option<T> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// All events queued since the last drain.
    pub fn drain(&mut self) -> Vec<T> {
        let mut events = Vec::new();
        while let Some(event) = self.try_next() {
            events.push(event);
        }
        events
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.receiver.close();
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("has_teardown", &self.teardown.is_some())
            .finish()
    }
}
