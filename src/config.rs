//! File description of a trajectory problem.
//!
//! ```toml
//! name = "arm"
//! dimension = 2
//! max_accelerations = 5.0
//! samples = 500
//!
//! [interpolation]
//! type = "tension"
//! tension = 4.0
//!
//! [[waypoints]]
//! angles = [1.0, 1.0]
//! rates = [0.0, 2.0]
//! nominal_rates = 0.5
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::trajectories::{JointTrajectory, TrajectoryError, Waypoint};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Trajectory(#[from] TrajectoryError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// A single value broadcast to every joint, or one value per joint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JointValues {
    Uniform(f64),
    PerJoint(Vec<f64>),
}

impl JointValues {
    pub fn resolve(&self, dimension: usize) -> Vec<f64> {
        match self {
            JointValues::Uniform(value) => vec![*value; dimension],
            JointValues::PerJoint(values) => values.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Interpolation {
    Tension {
        #[serde(default = "default_tension")]
        tension: f64,
    },
    Linear,
}

fn default_tension() -> f64 {
    4.
}

fn default_nominal_rates() -> JointValues {
    JointValues::Uniform(1.)
}

fn default_samples() -> usize {
    1000
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaypointConfig {
    #[serde(default)]
    pub name: String,
    pub angles: Vec<f64>,
    /// Leaving these out at either end of the trajectory means starting/stopping at rest.
    #[serde(default)]
    pub rates: Option<Vec<f64>>,
    #[serde(default)]
    pub accelerations: Option<Vec<f64>>,
    #[serde(default = "default_nominal_rates")]
    pub nominal_rates: JointValues,
    /// Minimum time to the next waypoint, estimated from the nominal rates otherwise.
    #[serde(default)]
    pub duration: Option<f64>,
}

impl WaypointConfig {
    fn build(&self, dimension: usize) -> ConfigResult<Waypoint> {
        let mut waypoint = Waypoint::new(dimension)
            .with_name(self.name.as_str())
            .with_angles(&self.angles)?;
        if let Some(rates) = &self.rates {
            waypoint.set_rates(rates)?;
        }
        if let Some(accelerations) = &self.accelerations {
            waypoint.set_accelerations(accelerations)?;
        }
        waypoint.set_nominal_rates(&self.nominal_rates.resolve(dimension))?;
        if let Some(duration) = self.duration {
            waypoint.set_duration(duration);
        }
        Ok(waypoint)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryConfig {
    #[serde(default)]
    pub name: String,
    pub dimension: usize,
    pub max_accelerations: JointValues,
    /// Rows written per joint by the dump tool.
    #[serde(default = "default_samples")]
    pub samples: usize,
    pub interpolation: Interpolation,
    pub waypoints: Vec<WaypointConfig>,
}

impl TrajectoryConfig {
    /// Loads a description, picking the format from the file extension and trying TOML
    /// then JSON when there is none.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("loading trajectory description from {}", path.display());

        match path.extension().and_then(|extension| extension.to_str()) {
            Some("toml") => Self::from_toml(&contents),
            Some("json") => Self::from_json(&contents),
            _ => Self::from_toml(&contents).or_else(|_| Self::from_json(&contents)),
        }
    }

    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_json(contents: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// The described trajectory, not yet interpolated.
    pub fn build(&self) -> ConfigResult<JointTrajectory> {
        let mut trajectory = JointTrajectory::new(self.dimension).with_name(self.name.as_str());
        trajectory.set_max_accelerations(&self.max_accelerations.resolve(self.dimension))?;
        for waypoint in &self.waypoints {
            trajectory.append(waypoint.build(self.dimension)?)?;
        }
        Ok(trajectory)
    }

    /// The described trajectory, interpolated the described way.
    pub fn interpolate(&self) -> ConfigResult<JointTrajectory> {
        let mut trajectory = self.build()?;
        match self.interpolation {
            Interpolation::Tension { tension } => trajectory.tension_spline_interpolation(tension)?,
            Interpolation::Linear => trajectory.linear_spline_interpolation()?,
        }
        Ok(trajectory)
    }
}
