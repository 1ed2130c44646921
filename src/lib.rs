#![deny(clippy::unwrap_used)]
//! Joint space trajectories for manipulators.
//!
//! Waypoints are collected in a [`JointTrajectory`] and interpolated either by a tension spline
//! with quintic bridges at both ends or by a smoothed linear spline. Both keep every joint
//! within its acceleration bound, stretching segment durations where they have to.

pub mod config;
pub mod math;
pub mod splines;
pub mod trajectories;

pub use config::{ConfigError, TrajectoryConfig};
pub use trajectories::{
    JointTrajectory, StretchSite, Trajectory, TrajectoryError, TrajectoryResult, Waypoint,
};
