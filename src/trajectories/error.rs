use std::fmt;

use crate::splines::SplineError;

pub type TrajectoryResult<T> = Result<T, TrajectoryError>;

/// Where an interpolation gave up trying to satisfy the acceleration bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StretchSite {
    LeadingPseudo,
    TrailingPseudo,
    /// The corner at the given (real) waypoint index.
    Corner(usize),
}

impl fmt::Display for StretchSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StretchSite::LeadingPseudo => write!(f, "leading pseudo waypoint"),
            StretchSite::TrailingPseudo => write!(f, "trailing pseudo waypoint"),
            StretchSite::Corner(index) => write!(f, "corner at waypoint {index}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrajectoryError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("max acceleration bound broken by the {location}")]
    Constructor { location: StretchSite },

    #[error("time {time} is outside the trajectory domain [0, {duration}]")]
    OutOfRange { time: f64, duration: f64 },

    #[error("index {index} exceeds the {len} entries stored")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no interpolation has been generated for this trajectory")]
    NotInterpolated,

    #[error("constraints still unsatisfied after {iterations} retries while {stage}")]
    Unsatisfiable {
        stage: &'static str,
        iterations: usize,
    },

    #[error(transparent)]
    Spline(#[from] SplineError),
}
