//! Smoothed linear spline interpolation.
//!
//! The waypoints are joined by straight lines whose corners are rounded off by acceleration
//! bounded quintics. Two pseudo waypoints are inserted so the trajectory can leave the first
//! waypoint and arrive at the last one along its configured rate:
//!
//! ```text
//!       pre               post
//!  w0 --- x ---- w1 ... --- x --- wn
//! ```
//!
//! The leading pseudo waypoint sits on the initial tangent, where it meets a line of nominal
//! rate slope through a slightly pulled back copy of `w0`. The trailing one mirrors it at the
//! tail with a pulled forward copy of `wn`.

use tracing::{debug, info, trace, warn};

use crate::{
    math::{psign, Line},
    splines::{Polynomial, SmoothLinearSpline, SplineError, SplineFunction, SplineKind},
};

use super::{
    error::{StretchSite, TrajectoryError, TrajectoryResult},
    joint_trajectory::JointTrajectory,
    waypoint::JointData,
    MAX_STRETCH_ITERATIONS,
};

const MIN_WAYPOINTS: usize = 2;
/// First pull back (and pull forward) tried, doubled on every failure.
const INITIAL_PULLBACK: f64 = 0.001;
const PSEUDO_STRETCH_FACTOR: f64 = 1.1;
const CORNER_STRETCH_FACTOR: f64 = 1.05;
const BRIDGE_STEPS: u32 = 5;

/// A pseudo waypoint in the local frame of its search.
#[derive(Debug, Clone, PartialEq)]
struct PseudoWaypoint {
    time: f64,
    /// Time of the pulled back (or forward) real waypoint.
    pullback: f64,
    angles: Vec<f64>,
}

/// Where a corner failure of the combined data (pseudo waypoints included) should be relieved.
fn corner_site(index: usize, segments: usize) -> StretchSite {
    match index {
        0 | 1 => StretchSite::LeadingPseudo,
        i if i > segments => StretchSite::TrailingPseudo,
        i => StretchSite::Corner(i - 1),
    }
}

/// Quintic from `incoming` at `t_l` to `outgoing` at `t_r`, if it stays within `bound`.
fn bridge_bounded(incoming: &Line, outgoing: &Line, t_l: f64, t_r: f64, bound: f64) -> bool {
    Polynomial::quintic_interpolation(
        t_l,
        incoming.value(t_l),
        incoming.slope(),
        0.,
        t_r,
        outgoing.value(t_r),
        outgoing.slope(),
        0.,
    )
    .is_ok_and(|quintic| quintic.acceleration_bounded(t_l, t_r, bound))
}

impl JointTrajectory {
    /// Interpolates the waypoints with a smoothed linear spline, one segment per joint.
    ///
    /// Needs at least two waypoints, positive nominal rates on all but the last waypoint and
    /// positive acceleration bounds. Waypoints without configured rates at either end are
    /// treated as being at rest. Whenever a pseudo waypoint or corner cannot respect the
    /// bounds, the neighbouring durations are stretched and the whole spline regenerated.
    pub fn linear_spline_interpolation(&mut self) -> TrajectoryResult<()> {
        self.check_preconditions(MIN_WAYPOINTS)?;
        self.initialise_durations_or_fail()?;

        let last = self.waypoints.len() - 1;
        let start_rates = self.waypoints[0].boundary_rates();
        let end_rates = self.waypoints[last].boundary_rates();

        let mut stretches = 0;
        loop {
            let location = match self.generate_linear_splines(&start_rates, &end_rates) {
                Ok((splines, duration)) => {
                    let spline_functions = splines
                        .into_iter()
                        .map(|spline| {
                            vec![SplineFunction::new(
                                0.,
                                duration,
                                SplineKind::SmoothLinear(spline),
                            )]
                        })
                        .collect();
                    self.install(spline_functions, duration);
                    info!(
                        "linear spline interpolation of {} waypoints done, duration {:.3}s",
                        self.waypoints.len(),
                        duration
                    );
                    return Ok(());
                }
                Err(TrajectoryError::Constructor { location }) => location,
                Err(error) => return Err(error),
            };

            debug!("max acceleration broken by the {}, stretching", location);
            if stretches == MAX_STRETCH_ITERATIONS || !self.stretch_site(location) {
                warn!("{} still unconstrained after {} stretches", location, stretches);
                return Err(TrajectoryError::Constructor { location });
            }
            stretches += 1;
        }
    }

    /// False once the durations around `site` have reached their stretch limits.
    fn stretch_site(&mut self, site: StretchSite) -> bool {
        match site {
            StretchSite::LeadingPseudo => self.stretch_duration(0, PSEUDO_STRETCH_FACTOR),
            StretchSite::TrailingPseudo => {
                let last_segment = self.waypoints.len() - 2;
                self.stretch_duration(last_segment, PSEUDO_STRETCH_FACTOR)
            }
            StretchSite::Corner(waypoint) => {
                let before = self.stretch_duration(waypoint - 1, CORNER_STRETCH_FACTOR);
                let after = self.stretch_duration(waypoint, CORNER_STRETCH_FACTOR);
                before || after
            }
        }
    }

    /// One smoothed linear spline per joint through `w0, pre, w1, .., w(n-1), post, wn`, and
    /// the time they span.
    fn generate_linear_splines(
        &self,
        start_rates: &JointData,
        end_rates: &JointData,
    ) -> TrajectoryResult<(Vec<SmoothLinearSpline>, f64)> {
        let segments = self.waypoints.len() - 1;
        let leading = self.leading_pseudo_waypoint(start_rates)?;
        let trailing = self.trailing_pseudo_waypoint(end_rates)?;

        // w(k) arrives at the pulled back start plus the durations before it
        let mut arrival = leading.pullback;
        let mut times = Vec::with_capacity(segments + 3);
        times.push(0.);
        times.push(leading.time);
        for waypoint in &self.waypoints[..segments - 1] {
            arrival += waypoint.duration();
            times.push(arrival);
        }
        arrival += self.waypoints[segments - 1].duration();
        times.push(arrival + trailing.time);
        times.push(arrival + trailing.pullback);
        let duration = arrival + trailing.pullback;
        trace!("linear spline knot times {:?}", times);

        let splines = (0..self.dimension())
            .map(|joint| {
                let mut values = Vec::with_capacity(segments + 3);
                values.push(self.waypoints[0].angles()[joint]);
                values.push(leading.angles[joint]);
                values.extend(self.waypoints[1..segments].iter().map(|w| w.angles()[joint]));
                values.push(trailing.angles[joint]);
                values.push(self.waypoints[segments].angles()[joint]);

                SmoothLinearSpline::interpolation(&times, &values, self.max_accelerations()[joint])
                    .map_err(|error| match error {
                        SplineError::CornerUnconstrained { index } => {
                            TrajectoryError::Constructor {
                                location: corner_site(index, segments),
                            }
                        }
                        error => error.into(),
                    })
            })
            .collect::<TrajectoryResult<Vec<_>>>()?;
        Ok((splines, duration))
    }

    /// Pulls the first waypoint back in time until the tangent / nominal rate line
    /// intersection gives a pseudo waypoint every joint can corner through. Times are
    /// measured from the first waypoint.
    fn leading_pseudo_waypoint(&self, rates: &JointData) -> TrajectoryResult<PseudoWaypoint> {
        let (first, next) = (&self.waypoints[0], &self.waypoints[1]);
        let span = first.duration();
        let tangents: Vec<Line> = (0..self.dimension())
            .map(|joint| Line::point_slope_form(0., first.angles()[joint], rates[joint]))
            .collect();

        let mut pullback = INITIAL_PULLBACK;
        while pullback <= span {
            let time = tangents
                .iter()
                .enumerate()
                .filter_map(|(joint, tangent)| {
                    let nominal = Line::point_slope_form(
                        pullback,
                        first.angles()[joint],
                        -psign(rates[joint]) * first.nominal_rates()[joint],
                    );
                    tangent.intersection(&nominal).ok().map(|point| point.x)
                })
                .fold(span / 2., f64::min);
            let arrival = pullback + span;
            let pseudo_span = arrival - time;

            let bounded = tangents.iter().enumerate().all(|(joint, tangent)| {
                let segment =
                    Line::interpolation(time, tangent.value(time), arrival, next.angles()[joint]);
                (1..=BRIDGE_STEPS).any(|step| {
                    let step = step as f64;
                    let t_l = time - step * time / BRIDGE_STEPS as f64;
                    let t_r = time + step * pseudo_span / (2. * BRIDGE_STEPS as f64);
                    bridge_bounded(
                        tangent,
                        &segment,
                        t_l,
                        t_r,
                        self.max_accelerations()[joint],
                    )
                })
            });
            if bounded {
                trace!(
                    "leading pseudo waypoint at {:.4} with pull back {:.4}",
                    time,
                    pullback
                );
                return Ok(PseudoWaypoint {
                    time,
                    pullback,
                    angles: tangents.iter().map(|tangent| tangent.value(time)).collect(),
                });
            }
            pullback *= 2.;
        }
        Err(TrajectoryError::Constructor {
            location: StretchSite::LeadingPseudo,
        })
    }

    /// Mirror image of [`Self::leading_pseudo_waypoint`] at the tail. Times are measured
    /// from the nominal arrival at the last waypoint; the pulled forward arrival is at
    /// `pullback`.
    fn trailing_pseudo_waypoint(&self, rates: &JointData) -> TrajectoryResult<PseudoWaypoint> {
        let segments = self.waypoints.len() - 1;
        let (previous, last) = (&self.waypoints[segments - 1], &self.waypoints[segments]);
        let span = previous.duration();
        let nominal_lines: Vec<Line> = (0..self.dimension())
            .map(|joint| {
                Line::point_slope_form(
                    0.,
                    last.angles()[joint],
                    -psign(rates[joint]) * previous.nominal_rates()[joint],
                )
            })
            .collect();

        let mut pullforward = INITIAL_PULLBACK;
        while pullforward <= span {
            let tangents: Vec<Line> = (0..self.dimension())
                .map(|joint| Line::point_slope_form(pullforward, last.angles()[joint], rates[joint]))
                .collect();
            let time = tangents
                .iter()
                .zip(&nominal_lines)
                .filter_map(|(tangent, nominal)| tangent.intersection(nominal).ok())
                .map(|point| point.x)
                .fold(0., f64::max);
            let pseudo_span = pullforward - time;

            let bounded = tangents.iter().enumerate().all(|(joint, tangent)| {
                let segment =
                    Line::interpolation(-span, previous.angles()[joint], time, tangent.value(time));
                (1..=BRIDGE_STEPS).any(|step| {
                    let step = step as f64;
                    let t_l = time - step * (span + time) / (2. * BRIDGE_STEPS as f64);
                    let t_r = time + step * pseudo_span / BRIDGE_STEPS as f64;
                    bridge_bounded(
                        &segment,
                        tangent,
                        t_l,
                        t_r,
                        self.max_accelerations()[joint],
                    )
                })
            });
            if bounded {
                trace!(
                    "trailing pseudo waypoint at {:.4} with pull forward {:.4}",
                    time,
                    pullforward
                );
                return Ok(PseudoWaypoint {
                    time,
                    pullback: pullforward,
                    angles: tangents.iter().map(|tangent| tangent.value(time)).collect(),
                });
            }
            pullforward *= 2.;
        }
        Err(TrajectoryError::Constructor {
            location: StretchSite::TrailingPseudo,
        })
    }
}
