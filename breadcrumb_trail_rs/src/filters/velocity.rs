use crate::config::DampingMode;
use crate::types::{AccelerationSample, Vector3};

pub const DEFAULT_SENSITIVITY: f64 = 0.1;
pub const DEFAULT_DAMPING: f64 = 0.95;

/// Integrates horizontal acceleration into velocity.
///
/// Model, per accepted sample:
///   v.x' = (v.x + ax * dt * sensitivity) * d
///   v.z' = (v.z + az * dt * sensitivity) * d
///   v.y' = v.y
///
/// where `d` is `damping` (per sample) or `damping^dt` (time scaled).
/// Without damping, sensor bias makes velocity grow without bound; with it
/// velocity settles where decay balances input.
#[derive(Clone, Copy, Debug)]
pub struct VelocityIntegrator {
    sensitivity: f64,
    damping: f64,
    mode: DampingMode,
}

impl VelocityIntegrator {
    pub fn new(sensitivity: f64, damping: f64, mode: DampingMode) -> Self {
        Self {
            sensitivity,
            damping,
            mode,
        }
    }

    pub fn integrate(
        &self,
        velocity: &Vector3,
        sample: &AccelerationSample,
        delta_seconds: f64,
    ) -> Vector3 {
        let decay = self.decay_factor(delta_seconds);
        Vector3::new(
            (velocity.x + sample.ax * delta_seconds * self.sensitivity) * decay,
            velocity.y,
            (velocity.z + sample.az * delta_seconds * self.sensitivity) * decay,
        )
    }

    fn decay_factor(&self, delta_seconds: f64) -> f64 {
        match self.mode {
            DampingMode::PerSample => self.damping,
            DampingMode::TimeScaled => self.damping.powf(delta_seconds),
        }
    }
}

impl Default for VelocityIntegrator {
    fn default() -> Self {
        Self::new(DEFAULT_SENSITIVITY, DEFAULT_DAMPING, DampingMode::PerSample)
    }
}
