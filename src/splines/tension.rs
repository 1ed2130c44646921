use super::{validate_data, Spline, SplineError, SplineResult};

/// Beyond this `tension * h` the hyperbolic ratios are evaluated in exponential form.
const HYPERBOLIC_ASYMPTOTE: f64 = 20.;

/// Natural tension spline.
///
/// On each knot interval `[x_i, x_i+1]` the interpolant is a combination of `sinh` terms and a
/// line, parameterised by the second derivatives `z_i` at the knots. Larger tension pulls the
/// curve towards the piecewise linear interpolant.
#[derive(Debug, Clone, PartialEq)]
pub struct TensionSpline {
    tension: f64,
    domain: Vec<f64>,
    values: Vec<f64>,
    yddots: Vec<f64>,
}

/// sinh(a) / sinh(b) for 0 <= a <= b.
fn sinh_ratio(a: f64, b: f64) -> f64 {
    if b < HYPERBOLIC_ASYMPTOTE {
        a.sinh() / b.sinh()
    } else {
        (a - b).exp() * (1. - (-2. * a).exp()) / (1. - (-2. * b).exp())
    }
}

/// cosh(a) / sinh(b) for 0 <= a <= b.
fn cosh_sinh_ratio(a: f64, b: f64) -> f64 {
    if b < HYPERBOLIC_ASYMPTOTE {
        a.cosh() / b.sinh()
    } else {
        (a - b).exp() * (1. + (-2. * a).exp()) / (1. - (-2. * b).exp())
    }
}

impl TensionSpline {
    /// Interpolates `(x_data, y_data)` with zero second derivative at both ends.
    pub fn natural(x_data: &[f64], y_data: &[f64], tension: f64) -> SplineResult<Self> {
        validate_data(x_data, y_data, 2, "natural tension spline")?;
        if !(tension > 0.) || !tension.is_finite() {
            return Err(SplineError::InvalidParameter {
                parameter: "tension",
                message: format!("must be positive and finite, got {tension}"),
            });
        }

        let n = x_data.len() - 1; // number of intervals
        let mut alpha = Vec::with_capacity(n);
        let mut beta = Vec::with_capacity(n);
        let mut gamma = Vec::with_capacity(n);
        for i in 0..n {
            let h = x_data[i + 1] - x_data[i];
            let th = tension * h;
            alpha.push(1. / h - tension / th.sinh());
            beta.push(tension / th.tanh() - 1. / h);
            gamma.push(tension * tension * (y_data[i + 1] - y_data[i]) / h);
        }

        // C1 continuity at each interior knot i:
        // alpha[i-1] z[i-1] + (beta[i-1] + beta[i]) z[i] + alpha[i] z[i+1] = gamma[i] - gamma[i-1]
        let mut yddots = vec![0.; n + 1];
        if n > 1 {
            let interior = n - 1;
            let mut lower = vec![0.; interior];
            let mut diag = vec![0.; interior];
            let mut upper = vec![0.; interior];
            let mut rhs = vec![0.; interior];
            for k in 0..interior {
                let i = k + 1;
                lower[k] = alpha[i - 1];
                diag[k] = beta[i - 1] + beta[i];
                upper[k] = alpha[i];
                rhs[k] = gamma[i] - gamma[i - 1];
            }
            let z = solve_tridiagonal(&lower, &diag, &upper, &rhs)?;
            yddots[1..n].copy_from_slice(&z);
        }

        Ok(Self {
            tension,
            domain: x_data.to_vec(),
            values: y_data.to_vec(),
            yddots,
        })
    }

    /// The knot times.
    pub fn domain(&self) -> &[f64] {
        &self.domain
    }

    pub fn tension(&self) -> f64 {
        self.tension
    }

    /// Index of the interval containing `x`, end intervals extend beyond the domain.
    fn interval(&self, x: f64) -> usize {
        let last = self.domain.len() - 2;
        self.domain[1..]
            .iter()
            .position(|&knot| x <= knot)
            .map_or(last, |i| i.min(last))
    }

    /// (x_i, x_i+1, y_i, y_i+1, z_i, z_i+1) for the interval containing `x`.
    fn piece(&self, x: f64) -> (f64, f64, f64, f64, f64, f64) {
        let i = self.interval(x);
        (
            self.domain[i],
            self.domain[i + 1],
            self.values[i],
            self.values[i + 1],
            self.yddots[i],
            self.yddots[i + 1],
        )
    }
}

impl Spline for TensionSpline {
    fn value(&self, x: f64) -> f64 {
        let (x0, x1, y0, y1, z0, z1) = self.piece(x);
        let t = self.tension;
        let (h, a, b) = (x1 - x0, x - x0, x1 - x);
        (z0 * sinh_ratio(t * b, t * h) + z1 * sinh_ratio(t * a, t * h)) / (t * t)
            + (y0 - z0 / (t * t)) * b / h
            + (y1 - z1 / (t * t)) * a / h
    }

    fn derivative(&self, x: f64) -> f64 {
        let (x0, x1, y0, y1, z0, z1) = self.piece(x);
        let t = self.tension;
        let (h, a, b) = (x1 - x0, x - x0, x1 - x);
        (-z0 * cosh_sinh_ratio(t * b, t * h) + z1 * cosh_sinh_ratio(t * a, t * h)) / t
            + (y1 - y0) / h
            + (z0 - z1) / (t * t * h)
    }

    fn dderivative(&self, x: f64) -> f64 {
        let (x0, x1, _, _, z0, z1) = self.piece(x);
        let t = self.tension;
        let (h, a, b) = (x1 - x0, x - x0, x1 - x);
        z0 * sinh_ratio(t * b, t * h) + z1 * sinh_ratio(t * a, t * h)
    }
}

/// Thomas algorithm. `lower[0]` and `upper[n-1]` are ignored.
fn solve_tridiagonal(
    lower: &[f64],
    diag: &[f64],
    upper: &[f64],
    rhs: &[f64],
) -> SplineResult<Vec<f64>> {
    let n = diag.len();
    let mut c_prime = vec![0.; n];
    let mut d_prime = vec![0.; n];

    for i in 0..n {
        let pivot = if i == 0 {
            diag[0]
        } else {
            diag[i] - lower[i] * c_prime[i - 1]
        };
        if pivot.abs() < f64::EPSILON {
            return Err(SplineError::Singular {
                context: "solving tension spline knot accelerations",
            });
        }
        c_prime[i] = upper[i] / pivot;
        d_prime[i] = if i == 0 {
            rhs[0] / pivot
        } else {
            (rhs[i] - lower[i] * d_prime[i - 1]) / pivot
        };
    }

    let mut x = vec![0.; n];
    for i in (0..n).rev() {
        x[i] = if i == n - 1 {
            d_prime[i]
        } else {
            d_prime[i] - c_prime[i] * x[i + 1]
        };
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMES: [f64; 5] = [0.0, 2.0, 7.0, 8.6667, 10.6667];
    const VALUES: [f64; 5] = [1.0, 2.0, 1.0, 3.0, 4.0];

    #[test]
    fn test_interpolates_knots() {
        let spline = TensionSpline::natural(&TIMES, &VALUES, 4.0).unwrap();
        for (x, y) in TIMES.iter().zip(VALUES.iter()) {
            assert!((spline.value(*x) - y).abs() < 1e-9, "knot {x}");
        }
        assert_eq!(spline.domain(), &TIMES);
        assert_eq!(spline.tension(), 4.0);
    }

    #[test]
    fn test_natural_end_conditions() {
        let spline = TensionSpline::natural(&TIMES, &VALUES, 4.0).unwrap();
        assert!(spline.dderivative(TIMES[0]).abs() < 1e-9);
        assert!(spline.dderivative(TIMES[4]).abs() < 1e-9);
    }

    #[test]
    fn test_c2_continuity_at_interior_knots() {
        let spline = TensionSpline::natural(&TIMES, &VALUES, 1.5).unwrap();
        let h = 1e-7;
        for &x in &TIMES[1..4] {
            let left = spline.derivative(x - h);
            let right = spline.derivative(x + h);
            assert!((left - right).abs() < 1e-5, "slope jump at {x}");
            let left = spline.dderivative(x - h);
            let right = spline.dderivative(x + h);
            assert!((left - right).abs() < 1e-5, "acceleration jump at {x}");
        }
    }

    #[test]
    fn test_derivatives_match_finite_differences() {
        let spline = TensionSpline::natural(&TIMES, &VALUES, 2.0).unwrap();
        let h = 1e-5;
        for x in [0.5, 3.3, 7.9, 9.1] {
            let fd = (spline.value(x + h) - spline.value(x - h)) / (2.0 * h);
            assert!((fd - spline.derivative(x)).abs() < 1e-6);
            let fdd = (spline.derivative(x + h) - spline.derivative(x - h)) / (2.0 * h);
            assert!((fdd - spline.dderivative(x)).abs() < 1e-5);
        }
    }

    #[test]
    fn test_large_tension_is_nearly_linear() {
        let spline = TensionSpline::natural(&[0.0, 10.0, 20.0], &[0.0, 10.0, 0.0], 50.0).unwrap();
        assert!((spline.value(5.0) - 5.0).abs() < 0.05);
        assert!((spline.value(15.0) - 5.0).abs() < 0.05);
        assert!(spline.dderivative(5.0).abs() < 1e-6);
        assert!(spline.value(5.0).is_finite());
    }

    #[test]
    fn test_two_points_is_a_line() {
        let spline = TensionSpline::natural(&[1.0, 3.0], &[0.0, 4.0], 4.0).unwrap();
        assert!((spline.value(2.0) - 2.0).abs() < 1e-12);
        assert!((spline.derivative(2.5) - 2.0).abs() < 1e-12);
        assert!(spline.dderivative(2.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_bad_tension() {
        assert!(matches!(
            TensionSpline::natural(&TIMES, &VALUES, 0.0),
            Err(SplineError::InvalidParameter { .. })
        ));
        assert!(matches!(
            TensionSpline::natural(&TIMES, &VALUES, f64::NAN),
            Err(SplineError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_tridiagonal_solve() {
        // [2 1 0; 1 2 1; 0 1 2] x = [4 8 8] -> x = [1 2 3]
        let x = solve_tridiagonal(&[0.0, 1.0, 1.0], &[2.0, 2.0, 2.0], &[1.0, 1.0, 0.0], &[4.0, 8.0, 8.0])
            .unwrap();
        for (got, expected) in x.iter().zip([1.0, 2.0, 3.0]) {
            assert!((got - expected).abs() < 1e-12);
        }
    }
}
