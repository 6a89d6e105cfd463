use crate::config::TrailConfig;
use crate::filters::{AccelerationFilter, MotionState, PositionIntegrator, VelocityIntegrator};
use crate::platform::Subscription;
use crate::sample_clock::SampleClock;
use crate::types::{origin, AccelerationSample, Vector3};

use super::{PositionSource, SourceKind};

/// Inertial position estimate from accelerometer samples.
///
/// Pipeline per sample: clock -> noise filter -> velocity integration.
/// Per render tick: drain queued samples, then integrate position once.
/// The estimate drifts; `reset()` is the only way to clear it.
///
/// Sample timestamps and tick times are expected to share the host clock.
pub struct DeadReckoningSource {
    samples: Subscription<AccelerationSample>,
    filter: AccelerationFilter,
    velocity: VelocityIntegrator,
    position: PositionIntegrator,
    clock: SampleClock,
    state: MotionState,
    tracking: bool,
    idle_timeout_ms: Option<f64>,
    last_accepted_ms: Option<f64>,
    accepted_samples: u64,
    rejected_samples: u64,
}

impl DeadReckoningSource {
    pub fn new(samples: Subscription<AccelerationSample>, config: &TrailConfig) -> Self {
        Self {
            samples,
            filter: AccelerationFilter::new(config.acceleration_threshold),
            velocity: VelocityIntegrator::new(
                config.sensitivity,
                config.damping,
                config.damping_mode,
            ),
            position: PositionIntegrator,
            clock: SampleClock::new(),
            state: MotionState::default(),
            tracking: false,
            idle_timeout_ms: config.idle_velocity_timeout_ms,
            last_accepted_ms: None,
            accepted_samples: 0,
            rejected_samples: 0,
        }
    }

    /// Begin integrating. Samples that arrive before this are discarded.
    pub fn start_tracking(&mut self) {
        if !self.tracking {
            log::info!("Dead reckoning started");
        }
        self.tracking = true;
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    /// Feed one acceleration sample. Returns whether it passed the noise
    /// filter and updated velocity.
    pub fn on_sample(&mut self, sample: &AccelerationSample) -> bool {
        if !self.tracking {
            return false;
        }

        // Every sample advances the clock, so the next accepted sample's dt
        // covers only its own event interval.
        let dt = self.clock.tick(sample.timestamp_ms);
        self.state.last_sample_time_ms = Some(sample.timestamp_ms);

        if !self.filter.accept(sample) {
            self.rejected_samples += 1;
            return false;
        }

        self.state.velocity = self.velocity.integrate(&self.state.velocity, sample, dt);
        self.last_accepted_ms = Some(sample.timestamp_ms);
        self.accepted_samples += 1;
        true
    }

    /// Zero velocity and position. Takes effect before the next read.
    /// Samples still queued from before the reset are discarded.
    pub fn reset(&mut self) {
        let stale = self.samples.drain().len();
        if stale > 0 {
            log::debug!("Discarding {stale} queued samples on reset");
        }
        self.state.reset();
        self.clock.reset();
        self.last_accepted_ms = None;
        log::info!("Dead reckoning reset to origin");
    }

    pub fn motion_state(&self) -> &MotionState {
        &self.state
    }

    pub fn velocity(&self) -> Vector3 {
        if self.tracking {
            self.state.velocity
        } else {
            origin()
        }
    }

    /// (accepted, rejected) sample counts since construction.
    pub fn sample_counts(&self) -> (u64, u64) {
        (self.accepted_samples, self.rejected_samples)
    }

    fn release_idle_velocity(&mut self, now_ms: f64) {
        let (Some(timeout), Some(last)) = (self.idle_timeout_ms, self.last_accepted_ms) else {
            return;
        };
        if now_ms - last >= timeout && self.state.speed() > 0.0 {
            log::debug!(
                "No accepted motion for {:.0} ms, zeroing velocity",
                now_ms - last
            );
            self.state.apply_zupt();
        }
    }
}

impl PositionSource for DeadReckoningSource {
    fn kind(&self) -> SourceKind {
        SourceKind::DeadReckoning
    }

    fn current_position(&self) -> Vector3 {
        if self.tracking {
            self.state.position
        } else {
            origin()
        }
    }

    fn tick(&mut self, now_ms: f64) {
        for sample in self.samples.drain() {
            self.on_sample(&sample);
        }
        if !self.tracking {
            return;
        }
        self.release_idle_velocity(now_ms);
        self.position.step(&mut self.state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tokio::sync::mpsc::UnboundedSender;

    fn tracking_source(
        config: &TrailConfig,
    ) -> (UnboundedSender<AccelerationSample>, DeadReckoningSource) {
        let (tx, samples) = Subscription::channel();
        let mut source = DeadReckoningSource::new(samples, config);
        source.start_tracking();
        (tx, source)
    }

    #[test]
    fn test_zero_before_tracking_starts() {
        let (tx, samples) = Subscription::channel();
        let mut source = DeadReckoningSource::new(samples, &TrailConfig::default());
        tx.send(AccelerationSample::new(0.0, 0.0, 0.0, 0.0)).unwrap();
        tx.send(AccelerationSample::new(5.0, 0.0, 5.0, 100.0)).unwrap();
        source.tick(100.0);

        assert_eq!(source.current_position(), Vector3::zeros());
        assert_eq!(source.velocity(), Vector3::zeros());
        assert_eq!(source.sample_counts(), (0, 0));
    }

    #[test]
    fn test_sub_threshold_samples_leave_velocity_unchanged() {
        let (tx, mut source) = tracking_source(&TrailConfig::default());
        for i in 0..100 {
            let t = i as f64 * 20.0;
            let wobble = (t * 0.01).sin() * 0.9;
            tx.send(AccelerationSample::new(wobble, 9.81, -wobble, t)).unwrap();
        }
        source.tick(2000.0);

        assert_eq!(source.velocity(), Vector3::zeros());
        assert_eq!(source.current_position(), Vector3::zeros());
        assert_eq!(source.sample_counts(), (0, 100));
    }

    #[test]
    fn test_integrates_on_tick() {
        let (tx, mut source) = tracking_source(&TrailConfig::default());
        tx.send(AccelerationSample::new(0.0, 0.0, 0.0, 0.0)).unwrap();
        tx.send(AccelerationSample::new(2.0, 0.0, -4.0, 500.0)).unwrap();
        source.tick(500.0);

        // v = (a * 0.5 s * 0.1) * 0.95, then one position step
        assert_relative_eq!(source.current_position().x, 0.095, epsilon = 1e-12);
        assert_relative_eq!(source.current_position().z, -0.19, epsilon = 1e-12);

        // No new samples: position keeps advancing on the last velocity
        source.tick(516.0);
        assert_relative_eq!(source.current_position().x, 0.19, epsilon = 1e-12);
    }

    #[test]
    fn test_reset_returns_to_origin() {
        let (tx, mut source) = tracking_source(&TrailConfig::default());
        for i in 0..50 {
            tx.send(AccelerationSample::new(3.0, 0.0, 1.5, i as f64 * 20.0)).unwrap();
        }
        for i in 0..10 {
            source.tick(i as f64 * 16.0);
        }
        assert!(source.current_position().norm() > 0.0);

        source.reset();
        assert_eq!(source.current_position(), Vector3::zeros());
        assert_eq!(source.velocity(), Vector3::zeros());
        assert!(source.motion_state().last_sample_time_ms.is_none());
    }

    #[test]
    fn test_reset_discards_queued_samples() {
        let (tx, mut source) = tracking_source(&TrailConfig::default());
        for t in [0.0, 100.0, 200.0] {
            tx.send(AccelerationSample::new(4.0, 0.0, 0.0, t)).unwrap();
        }

        source.reset();
        source.tick(300.0);
        assert_eq!(source.velocity(), Vector3::zeros());
        assert_eq!(source.current_position(), Vector3::zeros());
        assert_eq!(source.sample_counts(), (0, 0));

        // Samples after the reset integrate normally
        tx.send(AccelerationSample::new(4.0, 0.0, 0.0, 400.0)).unwrap();
        tx.send(AccelerationSample::new(4.0, 0.0, 0.0, 500.0)).unwrap();
        source.tick(500.0);
        assert!(source.velocity().x > 0.0);
    }

    #[test]
    fn test_idle_timeout_stops_coasting() {
        let config = TrailConfig {
            idle_velocity_timeout_ms: Some(1000.0),
            ..TrailConfig::default()
        };
        let (tx, mut source) = tracking_source(&config);
        tx.send(AccelerationSample::new(0.0, 0.0, 0.0, 0.0)).unwrap();
        tx.send(AccelerationSample::new(4.0, 0.0, 0.0, 100.0)).unwrap();
        source.tick(100.0);
        let moving = source.current_position();

        source.tick(600.0);
        assert!(source.current_position().x > moving.x);

        source.tick(1100.0);
        let parked = source.current_position();
        assert_eq!(source.velocity(), Vector3::zeros());

        source.tick(1200.0);
        assert_eq!(source.current_position(), parked);
    }

    #[test]
    fn test_coasts_without_idle_timeout() {
        let (tx, mut source) = tracking_source(&TrailConfig::default());
        tx.send(AccelerationSample::new(0.0, 0.0, 0.0, 0.0)).unwrap();
        tx.send(AccelerationSample::new(4.0, 0.0, 0.0, 100.0)).unwrap();
        source.tick(100.0);
        source.tick(60_000.0);
        assert!(source.velocity().x > 0.0);
    }
}
