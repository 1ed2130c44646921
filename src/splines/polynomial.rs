use nalgebra::{Matrix3, Vector3};

use super::{Spline, SplineError, SplineResult};

/// Polynomial in powers of `(t - origin)`, coefficients in ascending order.
///
/// Keeping a local origin keeps the quintic bridges well conditioned even when they sit far
/// from `t = 0` on a long trajectory.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polynomial {
    origin: f64,
    coefficients: Vec<f64>,
}

impl Polynomial {
    pub fn new(origin: f64, coefficients: Vec<f64>) -> Self {
        Self {
            origin,
            coefficients,
        }
    }

    pub fn origin(&self) -> f64 {
        self.origin
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// Quintic matching position, rate and acceleration at both `t0` and `t1`.
    #[allow(clippy::too_many_arguments)]
    pub fn quintic_interpolation(
        t0: f64,
        y0: f64,
        y0_dot: f64,
        y0_ddot: f64,
        t1: f64,
        y1: f64,
        y1_dot: f64,
        y1_ddot: f64,
    ) -> SplineResult<Self> {
        let span = t1 - t0;
        if !(span > 0.) || !span.is_finite() {
            return Err(SplineError::InvalidParameter {
                parameter: "t1",
                message: format!("quintic interval [{t0}, {t1}] must have positive length"),
            });
        }

        let c0 = y0;
        let c1 = y0_dot;
        let c2 = 0.5 * y0_ddot;

        // normalised so the system matrix is constant: k_i = c_i * span^i
        let system = Matrix3::new(1., 1., 1., 3., 4., 5., 6., 12., 20.);
        let rhs = Vector3::new(
            y1 - (c0 + c1 * span + c2 * span * span),
            (y1_dot - (c1 + 2. * c2 * span)) * span,
            (y1_ddot - 2. * c2) * span * span,
        );
        let k = system.lu().solve(&rhs).ok_or(SplineError::Singular {
            context: "interpolating a quintic",
        })?;

        Ok(Self {
            origin: t0,
            coefficients: vec![
                c0,
                c1,
                c2,
                k[0] / span.powi(3),
                k[1] / span.powi(4),
                k[2] / span.powi(5),
            ],
        })
    }

    /// The derivative as a new polynomial about the same origin.
    pub fn derivative_polynomial(&self) -> Polynomial {
        let coefficients: Vec<f64> = self
            .coefficients
            .iter()
            .enumerate()
            .skip(1)
            .map(|(power, c)| power as f64 * c)
            .collect();
        Polynomial {
            origin: self.origin,
            coefficients: if coefficients.is_empty() {
                vec![0.]
            } else {
                coefficients
            },
        }
    }

    /// Largest value over `[t0, t1]`. Only valid for polynomials of degree three or less.
    pub fn maximum(&self, t0: f64, t1: f64) -> f64 {
        self.candidates(t0, t1)
            .into_iter()
            .map(|t| self.value(t))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Smallest value over `[t0, t1]`. Only valid for polynomials of degree three or less.
    pub fn minimum(&self, t0: f64, t1: f64) -> f64 {
        self.candidates(t0, t1)
            .into_iter()
            .map(|t| self.value(t))
            .fold(f64::INFINITY, f64::min)
    }

    /// True if the second derivative stays strictly inside `(-bound, bound)` over `[t0, t1]`.
    /// Only valid for polynomials of degree five or less.
    pub fn acceleration_bounded(&self, t0: f64, t1: f64, bound: f64) -> bool {
        let acceleration = self.derivative_polynomial().derivative_polynomial();
        acceleration.maximum(t0, t1).abs() < bound && acceleration.minimum(t0, t1).abs() < bound
    }

    /// Interval endpoints plus the stationary points falling inside the interval.
    fn candidates(&self, t0: f64, t1: f64) -> Vec<f64> {
        debug_assert!(self.degree() <= 3, "extremum search is for cubics");
        let coefficient = |power: usize| self.coefficients.get(power).copied().unwrap_or(0.);
        // p'(u) = c + b u + a u^2
        let a = 3. * coefficient(3);
        let b = 2. * coefficient(2);
        let c = coefficient(1);

        let mut roots = Vec::with_capacity(2);
        if a == 0. {
            if b != 0. {
                roots.push(-c / b);
            }
        } else {
            let discriminant = b * b - 4. * a * c;
            if discriminant >= 0. {
                let q = -0.5 * (b + b.signum() * discriminant.sqrt());
                if q == 0. {
                    roots.push(0.);
                } else {
                    roots.push(q / a);
                    roots.push(c / q);
                }
            }
        }

        let (lower, upper) = (t0.min(t1), t0.max(t1));
        let mut candidates = vec![lower, upper];
        candidates.extend(
            roots
                .into_iter()
                .map(|u| u + self.origin)
                .filter(|t| *t > lower && *t < upper),
        );
        candidates
    }

    fn evaluate(&self, order: usize, x: f64) -> f64 {
        let u = x - self.origin;
        self.coefficients
            .iter()
            .enumerate()
            .skip(order)
            .rev()
            .fold(0., |acc, (power, c)| {
                let falling: usize = (power - order + 1..=power).product();
                acc * u + falling as f64 * c
            })
    }
}

impl Spline for Polynomial {
    fn value(&self, x: f64) -> f64 {
        self.evaluate(0, x)
    }

    fn derivative(&self, x: f64) -> f64 {
        self.evaluate(1, x)
    }

    fn dderivative(&self, x: f64) -> f64 {
        self.evaluate(2, x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_evaluation_about_origin() {
        // 1 + 2u + 3u^2 with u = x - 1
        let p = Polynomial::new(1.0, vec![1.0, 2.0, 3.0]);
        assert!((p.value(1.0) - 1.0).abs() < EPS);
        assert!((p.value(2.0) - 6.0).abs() < EPS);
        assert!((p.derivative(2.0) - 8.0).abs() < EPS);
        assert!((p.dderivative(7.0) - 6.0).abs() < EPS);
        assert_eq!(p.degree(), 2);
    }

    #[test]
    fn test_derivative_polynomial() {
        let p = Polynomial::new(0.5, vec![4.0, 1.0, -2.0, 0.5]);
        let dp = p.derivative_polynomial();
        assert_eq!(dp.coefficients(), &[1.0, -4.0, 1.5]);
        assert_eq!(dp.origin(), 0.5);
        for x in [0.0, 0.5, 1.3, 2.0] {
            assert!((dp.value(x) - p.derivative(x)).abs() < EPS);
        }

        let constant = Polynomial::new(0.0, vec![3.0]);
        assert_eq!(constant.derivative_polynomial().coefficients(), &[0.0]);
    }

    #[test]
    fn test_quintic_interpolation_boundary_conditions() {
        let q = Polynomial::quintic_interpolation(2.0, 1.0, 0.5, -1.0, 5.0, -2.0, 0.25, 3.0)
            .unwrap();
        assert!((q.value(2.0) - 1.0).abs() < EPS);
        assert!((q.derivative(2.0) - 0.5).abs() < EPS);
        assert!((q.dderivative(2.0) + 1.0).abs() < EPS);
        assert!((q.value(5.0) + 2.0).abs() < EPS);
        assert!((q.derivative(5.0) - 0.25).abs() < EPS);
        assert!((q.dderivative(5.0) - 3.0).abs() < EPS);
        assert_eq!(q.degree(), 5);
    }

    #[test]
    fn test_quintic_rest_to_rest_peak_acceleration() {
        // rest-to-rest quintic over unit distance and time peaks at 10 / sqrt(3)
        let q = Polynomial::quintic_interpolation(0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0)
            .unwrap();
        let accel = q.derivative_polynomial().derivative_polynomial();
        let expected = 10.0 / 3f64.sqrt();
        assert!((accel.maximum(0.0, 1.0) - expected).abs() < 1e-9);
        assert!((accel.minimum(0.0, 1.0) + expected).abs() < 1e-9);
    }

    #[test]
    fn test_acceleration_bounded() {
        let q = Polynomial::quintic_interpolation(0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0)
            .unwrap();
        assert!(q.acceleration_bounded(0.0, 1.0, 5.8));
        assert!(!q.acceleration_bounded(0.0, 1.0, 5.7));
        // a line never accelerates, but the bound is strict
        let line = Polynomial::new(0.0, vec![1.0, 2.0]);
        assert!(line.acceleration_bounded(0.0, 1.0, 1e-9));
        assert!(!line.acceleration_bounded(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_quintic_rejects_empty_interval() {
        assert!(matches!(
            Polynomial::quintic_interpolation(1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0),
            Err(SplineError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_cubic_extrema() {
        // x^3 - 3x has a local max of 2 at x = -1 and local min of -2 at x = 1
        let cubic = Polynomial::new(0.0, vec![0.0, -3.0, 0.0, 1.0]);
        assert!((cubic.maximum(-1.5, 1.5) - 2.0).abs() < EPS);
        assert!((cubic.minimum(-1.5, 1.5) + 2.0).abs() < EPS);
        // endpoints dominate on a wider interval
        assert!((cubic.maximum(-2.0, 3.0) - 18.0).abs() < EPS);
        assert!((cubic.minimum(-3.0, 2.0) + 18.0).abs() < EPS);
    }

    #[test]
    fn test_extrema_of_lower_degrees() {
        let line = Polynomial::new(0.0, vec![1.0, -2.0]);
        assert!((line.maximum(0.0, 2.0) - 1.0).abs() < EPS);
        assert!((line.minimum(0.0, 2.0) + 3.0).abs() < EPS);

        let parabola = Polynomial::new(1.0, vec![0.5, 0.0, -1.0]);
        assert!((parabola.maximum(0.0, 3.0) - 0.5).abs() < EPS);
        assert!((parabola.minimum(0.0, 3.0) + 3.5).abs() < EPS);
    }
}
