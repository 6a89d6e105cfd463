use crate::types::AccelerationSample;

pub const DEFAULT_THRESHOLD: f64 = 1.0;

/// Drops near-stationary noise before it reaches the integrators.
///
/// Only the horizontal axes are inspected, so a constant gravity bias on the
/// vertical axis never passes on its own. NaN components compare false and
/// are rejected.
#[derive(Clone, Copy, Debug)]
pub struct AccelerationFilter {
    threshold: f64,
}

impl AccelerationFilter {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn accept(&self, sample: &AccelerationSample) -> bool {
        sample.ax.abs() > self.threshold || sample.az.abs() > self.threshold
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl Default for AccelerationFilter {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}
