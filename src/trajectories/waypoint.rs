//! Joint angle waypoints.
//!
//! A waypoint holds the joint angles to pass through and the hints the interpolators use to
//! time the segment leaving it: nominal rates (rough joint speeds towards the next waypoint)
//! and an optional duration. Rates and accelerations *at* the waypoint are optional; the
//! interpolators only honour them when they have been configured.

use std::fmt;

use nalgebra::DVector;

use super::error::{TrajectoryError, TrajectoryResult};

/// Tolerance used by [`Waypoint::approx`] when none is given.
pub const DEFAULT_APPROX_EPSILON: f64 = 0.01;

pub type JointData = DVector<f64>;

#[derive(Debug, Clone)]
pub struct Waypoint {
    name: String,
    duration: f64,
    rates_configured: bool,
    accelerations_configured: bool,
    angles: JointData,
    rates: JointData,
    accelerations: JointData,
    nominal_rates: JointData,
}

fn checked(values: &[f64], dimension: usize, what: &str) -> TrajectoryResult<JointData> {
    if values.len() != dimension {
        return Err(TrajectoryError::InvalidInput(format!(
            "{what} has {} entries, waypoint dimension is {dimension}",
            values.len()
        )));
    }
    Ok(JointData::from_column_slice(values))
}

impl Waypoint {
    /// A waypoint for `dimension` joints at the origin, with unit nominal rates.
    pub fn new(dimension: usize) -> Self {
        Self {
            name: String::new(),
            duration: 0.,
            rates_configured: false,
            accelerations_configured: false,
            angles: JointData::zeros(dimension),
            rates: JointData::zeros(dimension),
            accelerations: JointData::zeros(dimension),
            nominal_rates: JointData::from_element(dimension, 1.),
        }
    }

    pub fn dimension(&self) -> usize {
        self.angles.len()
    }

    /// Resets every joint vector to `dimension` zeros (nominal rates included) and forgets
    /// configured rates and accelerations.
    pub fn redimension(&mut self, dimension: usize) {
        self.angles = JointData::zeros(dimension);
        self.rates = JointData::zeros(dimension);
        self.accelerations = JointData::zeros(dimension);
        self.nominal_rates = JointData::zeros(dimension);
        self.rates_configured = false;
        self.accelerations_configured = false;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.set_name(name);
        self
    }

    /// Time to reach the next waypoint, `0.0` until estimated.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn set_duration(&mut self, duration: f64) {
        self.duration = duration;
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    pub fn angles(&self) -> &JointData {
        &self.angles
    }

    pub fn angles_mut(&mut self) -> &mut JointData {
        &mut self.angles
    }

    pub fn set_angles(&mut self, angles: &[f64]) -> TrajectoryResult<()> {
        self.angles = checked(angles, self.dimension(), "angles")?;
        Ok(())
    }

    pub fn with_angles(mut self, angles: &[f64]) -> TrajectoryResult<Self> {
        self.set_angles(angles)?;
        Ok(self)
    }

    pub fn rates(&self) -> &JointData {
        &self.rates
    }

    /// Write access to the rates; marks them as configured.
    pub fn rates_mut(&mut self) -> &mut JointData {
        self.rates_configured = true;
        &mut self.rates
    }

    pub fn set_rates(&mut self, rates: &[f64]) -> TrajectoryResult<()> {
        self.rates = checked(rates, self.dimension(), "rates")?;
        self.rates_configured = true;
        Ok(())
    }

    pub fn with_rates(mut self, rates: &[f64]) -> TrajectoryResult<Self> {
        self.set_rates(rates)?;
        Ok(self)
    }

    /// Zeroes the rates and marks them as unconfigured again.
    pub fn clear_rates(&mut self) {
        self.rates.fill(0.);
        self.rates_configured = false;
    }

    pub fn rates_configured(&self) -> bool {
        self.rates_configured
    }

    pub fn accelerations(&self) -> &JointData {
        &self.accelerations
    }

    /// Write access to the accelerations; marks them as configured.
    pub fn accelerations_mut(&mut self) -> &mut JointData {
        self.accelerations_configured = true;
        &mut self.accelerations
    }

    pub fn set_accelerations(&mut self, accelerations: &[f64]) -> TrajectoryResult<()> {
        self.accelerations = checked(accelerations, self.dimension(), "accelerations")?;
        self.accelerations_configured = true;
        Ok(())
    }

    pub fn accelerations_configured(&self) -> bool {
        self.accelerations_configured
    }

    pub fn nominal_rates(&self) -> &JointData {
        &self.nominal_rates
    }

    pub fn nominal_rates_mut(&mut self) -> &mut JointData {
        &mut self.nominal_rates
    }

    pub fn set_nominal_rates(&mut self, nominal_rates: &[f64]) -> TrajectoryResult<()> {
        self.nominal_rates = checked(nominal_rates, self.dimension(), "nominal rates")?;
        Ok(())
    }

    pub fn set_uniform_nominal_rate(&mut self, nominal_rate: f64) {
        self.nominal_rates.fill(nominal_rate);
    }

    pub fn with_uniform_nominal_rate(mut self, nominal_rate: f64) -> Self {
        self.set_uniform_nominal_rate(nominal_rate);
        self
    }

    /// Configured rates, or zeros (at rest) when none were given.
    pub(crate) fn boundary_rates(&self) -> JointData {
        if self.rates_configured {
            self.rates.clone()
        } else {
            JointData::zeros(self.dimension())
        }
    }

    /// True if every angle is within `epsilon` of the other waypoint's.
    pub fn approx(&self, other: &Waypoint, epsilon: f64) -> bool {
        self.angles.len() == other.angles.len()
            && self
                .angles
                .iter()
                .zip(other.angles.iter())
                .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

impl Default for Waypoint {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Waypoints compare by angles only.
impl PartialEq for Waypoint {
    fn eq(&self, other: &Self) -> bool {
        self.angles == other.angles
    }
}

fn write_joint_data(f: &mut fmt::Formatter<'_>, label: &str, data: &JointData) -> fmt::Result {
    write!(f, "  {label:<21}: [")?;
    for (i, value) in data.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{value:6.2}")?;
    }
    writeln!(f, "]")
}

impl fmt::Display for Waypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.name.is_empty() {
            writeln!(f, "  {:<21}: {}", "Name", self.name)?;
        }
        write_joint_data(f, "Angles", &self.angles)?;
        if self.rates_configured {
            write_joint_data(f, "Rates", &self.rates)?;
        }
        if self.accelerations_configured {
            write_joint_data(f, "Accelerations", &self.accelerations)?;
        }
        write_joint_data(f, "Nominal Rates", &self.nominal_rates)?;
        if self.duration > 0. {
            writeln!(f, "  {:<21}: {:.3}", "Duration", self.duration)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults() {
        let waypoint = Waypoint::new(3);
        assert_eq!(waypoint.dimension(), 3);
        assert_eq!(waypoint.angles(), &JointData::zeros(3));
        assert_eq!(waypoint.nominal_rates(), &JointData::from_element(3, 1.0));
        assert_eq!(waypoint.duration(), 0.0);
        assert!(!waypoint.rates_configured());
        assert!(!waypoint.accelerations_configured());
        assert_eq!(Waypoint::default().dimension(), 0);
    }

    #[test]
    fn test_redimension_resets_everything() {
        let mut waypoint = Waypoint::new(2);
        waypoint.set_rates(&[1.0, 2.0]).unwrap();
        waypoint.set_accelerations(&[0.5, 0.5]).unwrap();
        waypoint.redimension(4);

        assert_eq!(waypoint.dimension(), 4);
        assert_eq!(waypoint.rates(), &JointData::zeros(4));
        // nominal rates only default to 1.0 through the constructor
        assert_eq!(waypoint.nominal_rates(), &JointData::zeros(4));
        assert!(!waypoint.rates_configured());
        assert!(!waypoint.accelerations_configured());
    }

    #[test]
    fn test_write_access_marks_configured() {
        let mut waypoint = Waypoint::new(2);
        assert_eq!(waypoint.rates(), &JointData::zeros(2));
        assert!(!waypoint.rates_configured());

        waypoint.rates_mut()[1] = 2.0;
        assert!(waypoint.rates_configured());
        assert_eq!(waypoint.rates()[1], 2.0);

        waypoint.accelerations_mut();
        assert!(waypoint.accelerations_configured());

        waypoint.clear_rates();
        assert!(!waypoint.rates_configured());
        assert_eq!(waypoint.boundary_rates(), JointData::zeros(2));
    }

    #[test]
    fn test_setters_check_dimension() {
        let mut waypoint = Waypoint::new(2);
        assert!(matches!(
            waypoint.set_angles(&[1.0, 2.0, 3.0]),
            Err(TrajectoryError::InvalidInput(_))
        ));
        assert!(waypoint.set_rates(&[1.0]).is_err());
        assert!(!waypoint.rates_configured());
        assert!(waypoint.set_nominal_rates(&[0.5, 0.7]).is_ok());
        assert_eq!(waypoint.nominal_rates()[1], 0.7);
    }

    #[test]
    fn test_uniform_nominal_rate() {
        let waypoint = Waypoint::new(3).with_uniform_nominal_rate(0.25);
        assert!(waypoint.nominal_rates().iter().all(|r| *r == 0.25));
    }

    #[test]
    fn test_equality_compares_angles_only() {
        let a = Waypoint::new(2)
            .with_angles(&[1.0, 2.0])
            .unwrap()
            .with_name("a")
            .with_duration(3.0);
        let b = Waypoint::new(2)
            .with_angles(&[1.0, 2.0])
            .unwrap()
            .with_rates(&[5.0, 5.0])
            .unwrap();
        let c = Waypoint::new(2).with_angles(&[1.0, 2.005]).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.approx(&c, DEFAULT_APPROX_EPSILON));
        assert!(!a.approx(&c, 0.001));
    }

    #[test]
    fn test_display() {
        let waypoint = Waypoint::new(2)
            .with_name("Initial Position")
            .with_angles(&[1.0, 1.0])
            .unwrap()
            .with_rates(&[0.0, 2.0])
            .unwrap();
        let text = waypoint.to_string();
        assert!(text.contains("Initial Position"));
        assert!(text.contains("Rates"));
        assert!(!text.contains("Accelerations"));
        assert!(text.contains("Nominal Rates"));
    }
}
