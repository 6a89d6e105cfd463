//! Breadcrumb trail core.
//!
//! Negotiates the best available position source once (absolute spatial
//! tracking, inertial dead reckoning, or pointer drag), samples it at a
//! fixed interval and drops distance-gated markers joined by segments.
//!
//! Everything runs on one logical thread: the host pushes sensor and pointer
//! events into [`platform::Subscription`]s and calls
//! [`session::TrailSession::tick`] once per render frame.

pub mod config;
pub mod error;
pub mod filters;
pub mod live_status;
pub mod negotiation;
pub mod platform;
pub mod recorder;
pub mod render;
pub mod rerun_logger;
pub mod sample_clock;
pub mod session;
pub mod sources;
pub mod types;

pub use config::{DampingMode, Rgb, TrailConfig};
pub use error::{TrailError, TrailResult};
pub use live_status::TrailStatus;
pub use negotiation::{negotiate, Negotiated, NegotiationReport};
pub use platform::{MotionPermission, Platform, ReferenceSpace, ReferenceSpaceKind, Subscription};
pub use recorder::{RecorderState, TrailRecorder};
pub use render::{MemoryRenderer, TrailRenderer};
pub use rerun_logger::RerunTrailRenderer;
pub use session::TrailSession;
pub use sources::{PositionSource, SourceKind, TrackingSource};
pub use types::{AccelerationSample, CapabilityFlags, PointerEvent, TrailMarker, Vector3};
