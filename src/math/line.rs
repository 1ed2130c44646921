use super::Point2;

/// A line in the `(t, y)` plane, `y = slope * t + intercept`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Line {
    slope: f64,
    intercept: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("lines are parallel, no unique intersection")]
pub struct LinesParallelError;

impl Line {
    pub fn new(slope: f64, intercept: f64) -> Self {
        Self { slope, intercept }
    }

    /// Line through `(x, y)` with the given slope.
    pub fn point_slope_form(x: f64, y: f64, slope: f64) -> Self {
        Self {
            slope,
            intercept: y - slope * x,
        }
    }

    /// Line through `(x0, y0)` and `(x1, y1)`. The abscissae must differ.
    pub fn interpolation(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        debug_assert!(x1 != x0, "interpolating a vertical line");
        Self::point_slope_form(x0, y0, (y1 - y0) / (x1 - x0))
    }

    pub fn value(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn intersection(&self, line: &Line) -> Result<Point2, LinesParallelError> {
        let slope_difference = self.slope - line.slope;
        if slope_difference.abs() < f64::EPSILON {
            return Err(LinesParallelError);
        }

        let x = (line.intercept - self.intercept) / slope_difference;
        Ok(Point2::new(x, self.value(x)))
    }
}
