use crate::math::Line;

use super::{validate_data, Polynomial, Spline, SplineError, SplineResult};

/// Number of corner widths tried before a corner is declared unconstrained.
const CORNER_STEPS: u32 = 5;

/// Linear interpolation with every interior corner rounded off by a quintic whose
/// acceleration stays below a bound.
///
/// The discretised domain alternates between segments and corners:
/// `[x_0, t_l1, t_r1, t_l2, t_r2, ..., x_n]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothLinearSpline {
    discretised_domain: Vec<f64>,
    segments: Vec<Line>,
    corners: Vec<Polynomial>,
}

impl SmoothLinearSpline {
    pub fn interpolation(
        x_data: &[f64],
        y_data: &[f64],
        max_acceleration: f64,
    ) -> SplineResult<Self> {
        validate_data(x_data, y_data, 2, "smooth linear spline")?;
        if !(max_acceleration > 0.) {
            return Err(SplineError::InvalidParameter {
                parameter: "max_acceleration",
                message: format!("must be positive, got {max_acceleration}"),
            });
        }

        let size = x_data.len();
        let segments: Vec<Line> = x_data
            .windows(2)
            .zip(y_data.windows(2))
            .map(|(x, y)| Line::interpolation(x[0], y[0], x[1], y[1]))
            .collect();

        let mut discretised_domain = Vec::with_capacity(2 * size - 2);
        let mut corners = Vec::with_capacity(size - 2);
        discretised_domain.push(x_data[0]);
        for i in 1..size - 1 {
            let (t_l, t_r, corner) = Self::corner(x_data, &segments, i, max_acceleration)?;
            discretised_domain.push(t_l);
            discretised_domain.push(t_r);
            corners.push(corner);
        }
        discretised_domain.push(x_data[size - 1]);

        Ok(Self {
            discretised_domain,
            segments,
            corners,
        })
    }

    /// Searches increasingly wide quintics around data point `i`.
    ///
    /// The first corner may eat the whole first segment and the last corner the whole last
    /// segment, any other corner only gets half of each neighbouring segment.
    fn corner(
        x_data: &[f64],
        segments: &[Line],
        i: usize,
        max_acceleration: f64,
    ) -> SplineResult<(f64, f64, Polynomial)> {
        let last = x_data.len() - 1;
        let left_span = if i == 1 {
            x_data[i] - x_data[i - 1]
        } else {
            (x_data[i] - x_data[i - 1]) / 2.
        };
        let right_span = if i == last - 1 {
            x_data[i + 1] - x_data[i]
        } else {
            (x_data[i + 1] - x_data[i]) / 2.
        };
        let (incoming, outgoing) = (segments[i - 1], segments[i]);

        for step in 1..=CORNER_STEPS {
            let fraction = step as f64 / CORNER_STEPS as f64;
            let t_l = (x_data[i] - fraction * left_span).max(x_data[i - 1]);
            let t_r = (x_data[i] + fraction * right_span).min(x_data[i + 1]);
            let corner = Polynomial::quintic_interpolation(
                t_l,
                incoming.value(t_l),
                incoming.slope(),
                0.,
                t_r,
                outgoing.value(t_r),
                outgoing.slope(),
                0.,
            )?;
            if corner.acceleration_bounded(t_l, t_r, max_acceleration) {
                return Ok((t_l, t_r, corner));
            }
        }
        Err(SplineError::CornerUnconstrained { index: i })
    }

    pub fn domain(&self) -> &[f64] {
        &self.discretised_domain
    }

    pub fn segments(&self) -> &[Line] {
        &self.segments
    }

    pub fn corners(&self) -> &[Polynomial] {
        &self.corners
    }

    /// Even pieces are segments, odd pieces are corners.
    fn piece(&self, x: f64) -> Piece<'_> {
        let last = self.discretised_domain.len() - 2;
        let index = self.discretised_domain[1..]
            .iter()
            .position(|&bound| x <= bound)
            .map_or(last, |i| i.min(last));
        if index % 2 == 0 {
            Piece::Segment(&self.segments[index / 2])
        } else {
            Piece::Corner(&self.corners[index / 2])
        }
    }
}

enum Piece<'a> {
    Segment(&'a Line),
    Corner(&'a Polynomial),
}

impl Spline for SmoothLinearSpline {
    fn value(&self, x: f64) -> f64 {
        match self.piece(x) {
            Piece::Segment(line) => line.value(x),
            Piece::Corner(corner) => corner.value(x),
        }
    }

    fn derivative(&self, x: f64) -> f64 {
        match self.piece(x) {
            Piece::Segment(line) => line.slope(),
            Piece::Corner(corner) => corner.derivative(x),
        }
    }

    fn dderivative(&self, x: f64) -> f64 {
        match self.piece(x) {
            Piece::Segment(_) => 0.,
            Piece::Corner(corner) => corner.dderivative(x),
        }
    }
}
