pub mod line;

pub use line::*;

pub type Point2 = nalgebra::Point2<f64>;

/// Sign of `value`, treating zero as positive.
pub fn psign(value: f64) -> f64 {
    if value >= 0. {
        1.
    } else {
        -1.
    }
}
