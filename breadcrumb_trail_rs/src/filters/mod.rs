pub mod acceleration;
pub mod position;
pub mod velocity;

pub use acceleration::AccelerationFilter;
pub use position::{MotionState, PositionIntegrator};
pub use velocity::VelocityIntegrator;
