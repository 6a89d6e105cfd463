use serde::{Deserialize, Serialize};

use crate::types::Vector3;

/// Dead-reckoning state. Owned by `DeadReckoningSource`; only the
/// integrators write to it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionState {
    pub velocity: Vector3,
    pub position: Vector3,
    pub last_sample_time_ms: Option<f64>,
}

impl MotionState {
    /// Zero velocity and position. The only way to clear accumulated drift.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn speed(&self) -> f64 {
        self.velocity.norm()
    }

    /// Zero-velocity update: stop coasting without moving the estimate.
    pub fn apply_zupt(&mut self) {
        self.velocity = Vector3::zeros();
    }
}

/// Advances position by the current velocity once per render tick.
///
/// Velocity changes on the sensor cadence and position on the tick cadence,
/// so several ticks between sensor events all reuse the last velocity.
#[derive(Clone, Copy, Debug, Default)]
pub struct PositionIntegrator;

impl PositionIntegrator {
    pub fn integrate(&self, position: &Vector3, velocity: &Vector3) -> Vector3 {
        Vector3::new(position.x + velocity.x, position.y, position.z + velocity.z)
    }

    /// Integrate in place on a motion state.
    pub fn step(&self, state: &mut MotionState) {
        state.position = self.integrate(&state.position, &state.velocity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_height_is_held() {
        let integrator = PositionIntegrator;
        let p = integrator.integrate(&Vector3::new(1.0, 1.6, 2.0), &Vector3::new(0.5, 3.0, -0.5));
        assert_eq!(p, Vector3::new(1.5, 1.6, 1.5));
    }

    #[test]
    fn test_reuses_velocity_across_ticks() {
        let integrator = PositionIntegrator;
        let mut state = MotionState {
            velocity: Vector3::new(0.1, 0.0, 0.0),
            ..MotionState::default()
        };
        for _ in 0..3 {
            integrator.step(&mut state);
        }
        assert!((state.position.x - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_reset_zeroes_everything() {
        let mut state = MotionState {
            velocity: Vector3::new(1.0, 0.0, 1.0),
            position: Vector3::new(4.0, 0.0, -2.0),
            last_sample_time_ms: Some(1000.0),
        };
        state.reset();
        assert_eq!(state.position, Vector3::zeros());
        assert_eq!(state.velocity, Vector3::zeros());
        assert_eq!(state.last_sample_time_ms, None);
    }

    #[test]
    fn test_zupt_keeps_position() {
        let mut state = MotionState {
            velocity: Vector3::new(1.0, 0.0, 1.0),
            position: Vector3::new(4.0, 0.0, -2.0),
            last_sample_time_ms: None,
        };
        state.apply_zupt();
        assert_eq!(state.speed(), 0.0);
        assert_eq!(state.position, Vector3::new(4.0, 0.0, -2.0));
    }
}
