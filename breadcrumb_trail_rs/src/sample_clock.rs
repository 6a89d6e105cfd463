/// Turns a stream of millisecond timestamps into per-step elapsed seconds.
///
/// Intervals may be irregular. A timestamp earlier than the previous one
/// (clock rollback) yields zero rather than a negative step.
#[derive(Clone, Debug, Default)]
pub struct SampleClock {
    last_ms: Option<f64>,
}

impl SampleClock {
    pub fn new() -> Self {
        Self { last_ms: None }
    }

    /// Seconds elapsed since the previous tick. The first tick only records
    /// the baseline and returns 0.
    pub fn tick(&mut self, now_ms: f64) -> f64 {
        if !now_ms.is_finite() {
            return 0.0;
        }

        let delta = match self.last_ms {
            Some(last) => ((now_ms - last) / 1000.0).max(0.0),
            None => 0.0,
        };
        self.last_ms = Some(now_ms);
        delta
    }

    pub fn last_ms(&self) -> Option<f64> {
        self.last_ms
    }

    /// Forget the baseline; the next tick returns 0 again.
    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_first_tick_is_zero() {
        let mut clock = SampleClock::new();
        assert_eq!(clock.tick(1234.0), 0.0);
        assert_eq!(clock.last_ms(), Some(1234.0));
    }

    #[test]
    fn test_irregular_intervals() {
        let mut clock = SampleClock::new();
        clock.tick(0.0);
        assert_relative_eq!(clock.tick(16.0), 0.016);
        assert_relative_eq!(clock.tick(66.0), 0.05);
        assert_relative_eq!(clock.tick(1066.0), 1.0);
    }

    #[test]
    fn test_rollback_clamps_to_zero() {
        let mut clock = SampleClock::new();
        clock.tick(500.0);
        assert_eq!(clock.tick(400.0), 0.0);
        // New baseline is the rolled-back time
        assert_relative_eq!(clock.tick(450.0), 0.05);
    }

    #[test]
    fn test_non_finite_keeps_baseline() {
        let mut clock = SampleClock::new();
        clock.tick(100.0);
        assert_eq!(clock.tick(f64::NAN), 0.0);
        assert_relative_eq!(clock.tick(200.0), 0.1);
    }

    #[test]
    fn test_reset() {
        let mut clock = SampleClock::new();
        clock.tick(100.0);
        clock.reset();
        assert_eq!(clock.tick(900.0), 0.0);
    }
}
