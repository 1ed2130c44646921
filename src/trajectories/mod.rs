mod error;
mod joint_trajectory;
mod linear_interpolation;
mod tension_interpolation;
pub mod waypoint;

pub use error::{StretchSite, TrajectoryError, TrajectoryResult};
pub use joint_trajectory::{JointProfile, JointTrajectory, EVALUATION_TOLERANCE};
pub use waypoint::{JointData, Waypoint, DEFAULT_APPROX_EPSILON};

/// Durations are stretched at most this many times by any single constraint search.
pub const MAX_STRETCH_ITERATIONS: usize = 500;
/// No segment is stretched past this multiple of its initialised duration.
pub const MAX_STRETCH_GROWTH: f64 = 1e6;

pub trait Trajectory<P, V> {
    fn get_position(&self, t: f64) -> P;
    fn get_velocity(&self, t: f64) -> V;
    fn get_acceleration(&self, t: f64) -> V;
    fn get_total_runtime(&self) -> f64;
    fn get_final_destination(&self) -> P {
        self.get_position(self.get_total_runtime())
    }
    fn get_time_sections(&self) -> impl Iterator<Item = f64>;
}
