use std::fmt;

use crate::splines::SplineFunction;

use super::{
    error::{TrajectoryError, TrajectoryResult},
    waypoint::{JointData, Waypoint},
    Trajectory, MAX_STRETCH_GROWTH,
};

/// Slack allowed past the end of the trajectory when evaluating.
pub const EVALUATION_TOLERANCE: f64 = 1e-4;

/// A sequence of joint angle waypoints and, once interpolated, one list of time bounded
/// spline segments per joint covering `[0, duration]`.
#[derive(Debug, Clone)]
pub struct JointTrajectory {
    name: String,
    pub(super) waypoints: Vec<Waypoint>,
    max_accelerations: JointData,
    spline_functions: Vec<Vec<SplineFunction>>,
    trajectory_duration: f64,
    /// Longest each segment may be stretched to, fixed when the durations are initialised.
    stretch_limits: Vec<f64>,
}

impl JointTrajectory {
    /// An empty trajectory for `dimension` joints with all acceleration bounds at zero.
    pub fn new(dimension: usize) -> Self {
        Self {
            name: String::new(),
            waypoints: Vec::new(),
            max_accelerations: JointData::zeros(dimension),
            spline_functions: vec![Vec::new(); dimension],
            trajectory_duration: 0.,
            stretch_limits: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn dimension(&self) -> usize {
        self.max_accelerations.len()
    }

    pub fn redimension(&mut self, dimension: usize) {
        self.clear();
        self.spline_functions = vec![Vec::new(); dimension];
        self.max_accelerations = JointData::zeros(dimension);
    }

    pub fn size(&self) -> usize {
        self.waypoints.len()
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn waypoint(&self, index: usize) -> TrajectoryResult<&Waypoint> {
        self.waypoints
            .get(index)
            .ok_or(TrajectoryError::IndexOutOfRange {
                index,
                len: self.waypoints.len(),
            })
    }

    pub fn last(&self) -> Option<&Waypoint> {
        self.waypoints.last()
    }

    pub fn last_mut(&mut self) -> Option<&mut Waypoint> {
        self.waypoints.last_mut()
    }

    pub fn clear(&mut self) {
        self.waypoints.clear();
        self.stretch_limits.clear();
        self.clear_splines();
    }

    fn clear_splines(&mut self) {
        for segments in &mut self.spline_functions {
            segments.clear();
        }
        self.trajectory_duration = 0.;
    }

    pub fn append(&mut self, waypoint: Waypoint) -> TrajectoryResult<()> {
        if waypoint.dimension() != self.dimension() {
            return Err(TrajectoryError::InvalidInput(format!(
                "waypoint has dimension {} but the trajectory has {}",
                waypoint.dimension(),
                self.dimension()
            )));
        }
        self.waypoints.push(waypoint);
        Ok(())
    }

    pub fn max_accelerations(&self) -> &JointData {
        &self.max_accelerations
    }

    pub fn max_accelerations_mut(&mut self) -> &mut JointData {
        &mut self.max_accelerations
    }

    pub fn set_max_accelerations(&mut self, max_accelerations: &[f64]) -> TrajectoryResult<()> {
        if max_accelerations.len() != self.dimension() {
            return Err(TrajectoryError::InvalidInput(format!(
                "{} acceleration bounds given for {} joints",
                max_accelerations.len(),
                self.dimension()
            )));
        }
        self.max_accelerations = JointData::from_column_slice(max_accelerations);
        Ok(())
    }

    pub fn set_uniform_max_acceleration(&mut self, max_acceleration: f64) {
        self.max_accelerations.fill(max_acceleration);
    }

    /// True if there are at least `min_count` waypoints and every waypoint with an outgoing
    /// segment has strictly positive nominal rates.
    pub fn validate_waypoints(&self, min_count: usize) -> bool {
        if self.waypoints.len() < min_count {
            return false;
        }
        let segments = self.waypoints.len().saturating_sub(1);
        self.waypoints[..segments]
            .iter()
            .all(|waypoint| waypoint.nominal_rates().iter().all(|rate| *rate > 0.))
    }

    /// Estimates each segment's duration as the slowest joint's distance over nominal rate,
    /// keeping any longer duration already set. Fails if a segment ends up with no duration.
    pub fn initialise_waypoint_durations(&mut self) -> bool {
        for i in 0..self.waypoints.len().saturating_sub(1) {
            let (from, to) = (&self.waypoints[i], &self.waypoints[i + 1]);
            let estimate = from
                .angles()
                .iter()
                .zip(to.angles().iter())
                .zip(from.nominal_rates().iter())
                .filter(|(_, rate)| **rate != 0.)
                .map(|((a, b), rate)| (b - a).abs() / rate)
                .fold(0., f64::max);

            let waypoint = &mut self.waypoints[i];
            if estimate > waypoint.duration() {
                waypoint.set_duration(estimate);
            }
            if waypoint.duration() == 0. {
                return false;
            }
        }
        self.stretch_limits = self
            .waypoints
            .iter()
            .map(|waypoint| waypoint.duration() * MAX_STRETCH_GROWTH)
            .collect();
        true
    }

    /// Sum of the waypoint durations, i.e. the time the waypoints alone account for.
    pub fn waypoint_durations_total(&self) -> f64 {
        let segments = self.waypoints.len().saturating_sub(1);
        self.waypoints[..segments]
            .iter()
            .map(Waypoint::duration)
            .sum()
    }

    /// Total time of the last interpolation, `0.0` before one succeeds.
    pub fn duration(&self) -> f64 {
        self.trajectory_duration
    }

    pub fn is_interpolated(&self) -> bool {
        self.spline_functions
            .first()
            .is_some_and(|segments| !segments.is_empty())
    }

    pub fn segments(&self, joint: usize) -> TrajectoryResult<&[SplineFunction]> {
        self.spline_functions
            .get(joint)
            .map(Vec::as_slice)
            .ok_or(TrajectoryError::IndexOutOfRange {
                index: joint,
                len: self.dimension(),
            })
    }

    /// Common gate of both interpolators, checked before anything is modified.
    pub(super) fn check_preconditions(&self, min_count: usize) -> TrajectoryResult<()> {
        if self.dimension() == 0 {
            return Err(TrajectoryError::Configuration(
                "trajectory has no joints".to_string(),
            ));
        }
        if self.waypoints.len() < min_count {
            return Err(TrajectoryError::Configuration(format!(
                "not enough waypoints for this interpolation (need at least {min_count}, got {})",
                self.waypoints.len()
            )));
        }
        if !self.validate_waypoints(min_count) {
            return Err(TrajectoryError::Configuration(
                "not all the waypoint nominal rates have been specified correctly (must be > 0.0)"
                    .to_string(),
            ));
        }
        if let Some(joint) = self.max_accelerations.iter().position(|a| !(*a > 0.)) {
            return Err(TrajectoryError::Configuration(format!(
                "max acceleration of joint {joint} must be > 0.0, got {}",
                self.max_accelerations[joint]
            )));
        }
        Ok(())
    }

    pub(super) fn initialise_durations_or_fail(&mut self) -> TrajectoryResult<()> {
        if self.initialise_waypoint_durations() {
            Ok(())
        } else {
            Err(TrajectoryError::Configuration(
                "a waypoint was configured with a zero duration".to_string(),
            ))
        }
    }

    /// Multiplies the duration of the segment leaving waypoint `index`. Refused, returning
    /// false, once the segment would grow past its stretch limit.
    pub(super) fn stretch_duration(&mut self, index: usize, factor: f64) -> bool {
        let stretched = self.waypoints[index].duration() * factor;
        match self.stretch_limits.get(index) {
            Some(limit) if stretched <= *limit => {
                self.waypoints[index].set_duration(stretched);
                true
            }
            _ => false,
        }
    }

    pub(super) fn install(&mut self, spline_functions: Vec<Vec<SplineFunction>>, duration: f64) {
        self.spline_functions = spline_functions;
        self.trajectory_duration = duration;
    }

    pub fn joint(&self, joint: usize) -> TrajectoryResult<JointProfile<'_>> {
        if !self.is_interpolated() {
            return Err(TrajectoryError::NotInterpolated);
        }
        let segments = self.segments(joint)?;
        let last = segments.last().ok_or(TrajectoryError::NotInterpolated)?;
        Ok(JointProfile { segments, last })
    }

    pub fn value(&self, joint: usize, time: f64) -> TrajectoryResult<f64> {
        let (segment, t) = self.joint(joint)?.checked_segment(time)?;
        Ok(segment.value(t))
    }

    pub fn derivative(&self, joint: usize, time: f64) -> TrajectoryResult<f64> {
        let (segment, t) = self.joint(joint)?.checked_segment(time)?;
        Ok(segment.derivative(t))
    }

    pub fn dderivative(&self, joint: usize, time: f64) -> TrajectoryResult<f64> {
        let (segment, t) = self.joint(joint)?.checked_segment(time)?;
        Ok(segment.dderivative(t))
    }

    /// `count` evenly spaced `[t, y, y', y'']` rows over the whole trajectory.
    pub fn sample(&self, joint: usize, count: usize) -> TrajectoryResult<Vec<[f64; 4]>> {
        let profile = self.joint(joint)?;
        let duration = profile.get_total_runtime();
        let step = if count > 1 {
            duration / (count - 1) as f64
        } else {
            0.
        };
        Ok((0..count)
            .map(|k| {
                let t = (k as f64 * step).min(duration);
                [
                    t,
                    profile.get_position(t),
                    profile.get_velocity(t),
                    profile.get_acceleration(t),
                ]
            })
            .collect())
    }
}

impl Default for JointTrajectory {
    fn default() -> Self {
        Self::new(0)
    }
}

impl fmt::Display for JointTrajectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, waypoint) in self.waypoints.iter().enumerate() {
            writeln!(f, "Waypoint {i}")?;
            writeln!(f, "{waypoint}")?;
        }
        Ok(())
    }
}

/// One joint of an interpolated [`JointTrajectory`]. Times are clamped to the trajectory.
#[derive(Debug, Clone, Copy)]
pub struct JointProfile<'a> {
    segments: &'a [SplineFunction],
    last: &'a SplineFunction,
}

impl<'a> JointProfile<'a> {
    pub fn segments(&self) -> &'a [SplineFunction] {
        self.segments
    }

    /// First segment ending at or after `t`, or the end of the last segment.
    fn segment(&self, t: f64) -> (&'a SplineFunction, f64) {
        let end = self.last.domain().1;
        self.segments
            .iter()
            .find(|segment| t <= segment.domain().1)
            .map_or((self.last, end), |segment| (segment, t))
    }

    fn checked_segment(&self, time: f64) -> TrajectoryResult<(&'a SplineFunction, f64)> {
        let duration = self.last.domain().1;
        if !(time >= 0. && time <= duration + EVALUATION_TOLERANCE) {
            return Err(TrajectoryError::OutOfRange { time, duration });
        }
        Ok(self.segment(time))
    }

    fn clamped_segment(&self, t: f64) -> (&'a SplineFunction, f64) {
        self.segment(t.clamp(0., self.last.domain().1))
    }
}

impl Trajectory<f64, f64> for JointProfile<'_> {
    fn get_position(&self, t: f64) -> f64 {
        let (segment, t) = self.clamped_segment(t);
        segment.value(t)
    }

    fn get_velocity(&self, t: f64) -> f64 {
        let (segment, t) = self.clamped_segment(t);
        segment.derivative(t)
    }

    fn get_acceleration(&self, t: f64) -> f64 {
        let (segment, t) = self.clamped_segment(t);
        segment.dderivative(t)
    }

    fn get_total_runtime(&self) -> f64 {
        self.last.domain().1
    }

    fn get_time_sections(&self) -> impl Iterator<Item = f64> {
        self.segments
            .iter()
            .flat_map(|segment| segment.get_time_sections())
    }
}
