//! Spline primitives the trajectory interpolators are composed from.
//!
//! - [`Polynomial`]: Hermite quintic interpolation and exact extremum search for cubics
//! - [`TensionSpline`]: natural C2 interpolant with a tension parameter
//! - [`SmoothLinearSpline`]: linear segments joined by acceleration bounded quintic corners
//! - [`SplineFunction`]: one of the above bound to a time interval

mod polynomial;
mod smooth_linear;
mod tension;

pub use polynomial::Polynomial;
pub use smooth_linear::SmoothLinearSpline;
pub use tension::TensionSpline;

use crate::trajectories::Trajectory;

pub type SplineResult<T> = Result<T, SplineError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SplineError {
    #[error("insufficient data for {context}: need at least {required} points, got {actual}")]
    InsufficientData {
        required: usize,
        actual: usize,
        context: &'static str,
    },

    #[error("shape mismatch in {context}: {expected} abscissae but {actual} values")]
    ShapeMismatch {
        expected: usize,
        actual: usize,
        context: &'static str,
    },

    #[error("abscissae must be strictly increasing in {context}")]
    NotMonotonic { context: &'static str },

    #[error("invalid parameter '{parameter}': {message}")]
    InvalidParameter {
        parameter: &'static str,
        message: String,
    },

    #[error("singular linear system while {context}")]
    Singular { context: &'static str },

    /// No corner polynomial at data point `index` stays within the acceleration bound.
    #[error("max acceleration bound broken at corner {index}")]
    CornerUnconstrained { index: usize },
}

/// A scalar function of time with two derivatives.
pub trait Spline {
    fn value(&self, x: f64) -> f64;
    fn derivative(&self, x: f64) -> f64;
    fn dderivative(&self, x: f64) -> f64;
}

/// Checks shared by the interpolating constructors.
pub(crate) fn validate_data(
    x_data: &[f64],
    y_data: &[f64],
    required: usize,
    context: &'static str,
) -> SplineResult<()> {
    if x_data.len() != y_data.len() {
        return Err(SplineError::ShapeMismatch {
            expected: x_data.len(),
            actual: y_data.len(),
            context,
        });
    }
    if x_data.len() < required {
        return Err(SplineError::InsufficientData {
            required,
            actual: x_data.len(),
            context,
        });
    }
    if x_data.windows(2).any(|pair| pair[1] <= pair[0]) {
        return Err(SplineError::NotMonotonic { context });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub enum SplineKind {
    Quintic(Polynomial),
    Tension(TensionSpline),
    SmoothLinear(SmoothLinearSpline),
}

impl Spline for SplineKind {
    fn value(&self, x: f64) -> f64 {
        match self {
            SplineKind::Quintic(p) => p.value(x),
            SplineKind::Tension(s) => s.value(x),
            SplineKind::SmoothLinear(s) => s.value(x),
        }
    }

    fn derivative(&self, x: f64) -> f64 {
        match self {
            SplineKind::Quintic(p) => p.derivative(x),
            SplineKind::Tension(s) => s.derivative(x),
            SplineKind::SmoothLinear(s) => s.derivative(x),
        }
    }

    fn dderivative(&self, x: f64) -> f64 {
        match self {
            SplineKind::Quintic(p) => p.dderivative(x),
            SplineKind::Tension(s) => s.dderivative(x),
            SplineKind::SmoothLinear(s) => s.dderivative(x),
        }
    }
}

/// A spline restricted to the time interval `[start, end]` of a trajectory.
#[derive(Debug, Clone, PartialEq)]
pub struct SplineFunction {
    start: f64,
    end: f64,
    kind: SplineKind,
}

impl SplineFunction {
    pub fn new(start: f64, end: f64, kind: SplineKind) -> Self {
        Self { start, end, kind }
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.start, self.end)
    }

    pub fn kind(&self) -> &SplineKind {
        &self.kind
    }

    /// Evaluates the underlying spline without clamping to the domain.
    pub fn value(&self, t: f64) -> f64 {
        self.kind.value(t)
    }

    pub fn derivative(&self, t: f64) -> f64 {
        self.kind.derivative(t)
    }

    pub fn dderivative(&self, t: f64) -> f64 {
        self.kind.dderivative(t)
    }

    fn clamp(&self, t: f64) -> f64 {
        t.clamp(self.start, self.end)
    }
}

impl Trajectory<f64, f64> for SplineFunction {
    fn get_position(&self, t: f64) -> f64 {
        self.kind.value(self.clamp(t))
    }

    fn get_velocity(&self, t: f64) -> f64 {
        self.kind.derivative(self.clamp(t))
    }

    fn get_acceleration(&self, t: f64) -> f64 {
        self.kind.dderivative(self.clamp(t))
    }

    fn get_total_runtime(&self) -> f64 {
        self.end
    }

    fn get_time_sections(&self) -> impl Iterator<Item = f64> {
        let inner: Vec<f64> = match &self.kind {
            SplineKind::Quintic(_) => Vec::new(),
            SplineKind::Tension(s) => s.domain().to_vec(),
            SplineKind::SmoothLinear(s) => s.domain().to_vec(),
        };
        let (start, end) = (self.start, self.end);
        inner
            .into_iter()
            .filter(move |&t| t > start && t < end)
            .chain(std::iter::once(end))
    }
}
