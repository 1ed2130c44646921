//! Tension spline interpolation.
//!
//! A natural tension spline through every waypoint is loosened until its knot accelerations
//! respect the bounds, then shifted right so a quintic bridge can carry the trajectory from the
//! first waypoint's rate onto it. A second quintic bridges the spline's tail onto the final
//! waypoint. Acceleration is zero at both ends of the result.

use tracing::{debug, info, trace, warn};

use crate::splines::{
    Polynomial, Spline, SplineFunction, SplineKind, SplineResult, TensionSpline,
};

use super::{
    error::{StretchSite, TrajectoryError, TrajectoryResult},
    joint_trajectory::JointTrajectory,
    waypoint::JointData,
    MAX_STRETCH_ITERATIONS,
};

const MIN_WAYPOINTS: usize = 5;
/// Growth applied to a segment duration each time a constraint fails.
const STRETCH_FACTOR: f64 = 1.1;
/// Bridge probes are `step / PROBE_DIVISIONS` of the adjacent segment, `step` in `1..=PROBE_STEPS`.
const PROBE_STEPS: u32 = 5;
const PROBE_DIVISIONS: f64 = 10.;

struct LeadingBridge {
    /// Time the shifted spline starts at; the bridge covers `[0, 2 * probe]`.
    probe: f64,
    quintics: Vec<Polynomial>,
    stretches: usize,
}

struct TrailingBridge {
    start: f64,
    end: f64,
    splines: Vec<TensionSpline>,
    quintics: Vec<Polynomial>,
    stretches: usize,
}

impl JointTrajectory {
    /// Interpolates the waypoints with quintic bridges at either end of a tension spline,
    /// yielding three segments per joint.
    ///
    /// Needs at least five waypoints, positive nominal rates on all but the last waypoint and
    /// positive acceleration bounds. Waypoints without configured rates at either end are
    /// treated as being at rest. Segment durations may be stretched along the way and stay
    /// stretched even if a later stage fails.
    pub fn tension_spline_interpolation(&mut self, tension: f64) -> TrajectoryResult<()> {
        self.check_preconditions(MIN_WAYPOINTS)?;
        if !(tension > 0.) || !tension.is_finite() {
            return Err(TrajectoryError::Configuration(format!(
                "tension must be positive and finite, got {tension}"
            )));
        }
        self.initialise_durations_or_fail()?;

        let last = self.waypoints.len() - 1;
        let start_rates = self.waypoints[0].boundary_rates();
        let end_rates = self.waypoints[last].boundary_rates();

        for pass in 1..=MAX_STRETCH_ITERATIONS {
            self.constrain_junctions(tension)?;
            let leading = self.leading_bridge(tension, &start_rates)?;
            let trailing = self.trailing_bridge(tension, leading.probe, &end_rates)?;
            if leading.stretches + trailing.stretches > 0 {
                // the bridges were fitted to a spline that has since changed
                debug!(
                    "tension pass {}: boundary bridges stretched {} durations, rechecking",
                    pass,
                    leading.stretches + trailing.stretches
                );
                continue;
            }

            let leading_time = 2. * leading.probe;
            let (start, end) = (trailing.start, trailing.end);
            let spline_functions = leading
                .quintics
                .into_iter()
                .zip(trailing.splines)
                .zip(trailing.quintics)
                .map(|((head, spline), tail)| {
                    vec![
                        SplineFunction::new(0., leading_time, SplineKind::Quintic(head)),
                        SplineFunction::new(leading_time, start, SplineKind::Tension(spline)),
                        SplineFunction::new(start, end, SplineKind::Quintic(tail)),
                    ]
                })
                .collect();
            self.install(spline_functions, end);
            info!(
                "tension spline interpolation of {} waypoints done, duration {:.3}s",
                self.waypoints.len(),
                end
            );
            return Ok(());
        }

        warn!("tension spline bridges never settled");
        Err(TrajectoryError::Unsatisfiable {
            stage: "settling the tension spline bridges",
            iterations: MAX_STRETCH_ITERATIONS,
        })
    }

    /// One natural tension spline per joint with knots at the waypoints, starting at
    /// `initial_time`.
    fn generate_tension_splines(
        &self,
        tension: f64,
        initial_time: f64,
    ) -> TrajectoryResult<Vec<TensionSpline>> {
        let times: Vec<f64> = self
            .waypoints
            .iter()
            .scan(initial_time, |time, waypoint| {
                let knot = *time;
                *time += waypoint.duration();
                Some(knot)
            })
            .collect();

        (0..self.dimension())
            .map(|joint| {
                let values: Vec<f64> = self.waypoints.iter().map(|w| w.angles()[joint]).collect();
                TensionSpline::natural(&times, &values, tension).map_err(TrajectoryError::from)
            })
            .collect()
    }

    /// Stretches durations until no interior knot of the tension splines breaks an
    /// acceleration bound. The natural end knots always have zero acceleration.
    fn constrain_junctions(&mut self, tension: f64) -> TrajectoryResult<()> {
        let mut stretches = 0;
        loop {
            let splines = self.generate_tension_splines(tension, 0.)?;
            let Some((knot, joint, acceleration)) = self.junction_violation(&splines) else {
                return Ok(());
            };

            let (before, here, after) = (
                &self.waypoints[knot - 1],
                &self.waypoints[knot],
                &self.waypoints[knot + 1],
            );
            let slope_before =
                ((here.angles()[joint] - before.angles()[joint]) / before.duration()).abs();
            let slope_after =
                ((after.angles()[joint] - here.angles()[joint]) / here.duration()).abs();
            // the steeper side gives way
            let segment = if slope_before > slope_after {
                knot - 1
            } else {
                knot
            };
            if stretches == MAX_STRETCH_ITERATIONS
                || !self.stretch_duration(segment, STRETCH_FACTOR)
            {
                warn!(
                    "tension spline junction {} still at {:.3} after {} stretches",
                    knot, acceleration, stretches
                );
                return Err(TrajectoryError::Unsatisfiable {
                    stage: "constraining tension spline junctions",
                    iterations: stretches,
                });
            }
            debug!(
                "joint {} accelerates at {:.3} on waypoint {}, stretched segment {}",
                joint, acceleration, knot, segment
            );
            stretches += 1;
        }
    }

    fn junction_violation(&self, splines: &[TensionSpline]) -> Option<(usize, usize, f64)> {
        let knots = splines.first()?.domain();
        (1..knots.len().saturating_sub(1)).find_map(|knot| {
            splines.iter().enumerate().find_map(|(joint, spline)| {
                let acceleration = spline.dderivative(knots[knot]).abs();
                (acceleration > self.max_accelerations()[joint]).then_some((
                    knot,
                    joint,
                    acceleration,
                ))
            })
        })
    }

    /// Shifts the splines right by a probe time `t` and bridges `[0, 2t]` with quintics from
    /// the first waypoint onto the shifted spline, widening the probe and then the first
    /// segment until every joint's bridge respects its bound.
    fn leading_bridge(
        &mut self,
        tension: f64,
        start_rates: &JointData,
    ) -> TrajectoryResult<LeadingBridge> {
        let mut stretches = 0;
        loop {
            for step in 1..=PROBE_STEPS {
                let probe = step as f64 * self.waypoints[0].duration() / PROBE_DIVISIONS;
                let splines = self.generate_tension_splines(tension, probe)?;
                let first = self.waypoints[0].angles();
                let bridge_end = 2. * probe;
                let quintics = self.bounded_bridges(0., bridge_end, |joint| {
                    let spline = &splines[joint];
                    Polynomial::quintic_interpolation(
                        0.,
                        first[joint],
                        start_rates[joint],
                        0.,
                        bridge_end,
                        spline.value(bridge_end),
                        spline.derivative(bridge_end),
                        0.,
                    )
                });
                if let Some(quintics) = quintics {
                    trace!("leading bridge accepted at probe {:.4}", probe);
                    return Ok(LeadingBridge {
                        probe,
                        quintics,
                        stretches,
                    });
                }
            }

            debug!(
                "leading bridge unconstrained, stretching the first segment from {:.3}",
                self.waypoints[0].duration()
            );
            if stretches == MAX_STRETCH_ITERATIONS || !self.stretch_duration(0, STRETCH_FACTOR) {
                warn!("no leading bridge after {} stretches", stretches);
                return Err(TrajectoryError::Constructor {
                    location: StretchSite::LeadingPseudo,
                });
            }
            stretches += 1;
        }
    }

    /// Bridges the tail of the splines (shifted to start at `anchor`) onto the final waypoint
    /// with quintics centred on the spline's last knot, widening the probe and then the last
    /// segment until every joint's bridge respects its bound.
    fn trailing_bridge(
        &mut self,
        tension: f64,
        anchor: f64,
        end_rates: &JointData,
    ) -> TrajectoryResult<TrailingBridge> {
        let last_segment = self.waypoints.len() - 2;
        let mut stretches = 0;
        loop {
            let splines = self.generate_tension_splines(tension, anchor)?;
            let spline_end = splines
                .first()
                .and_then(|spline| spline.domain().last().copied())
                .unwrap_or(anchor);
            let last = self.waypoints[last_segment + 1].angles();

            for step in 1..=PROBE_STEPS {
                let probe =
                    step as f64 * self.waypoints[last_segment].duration() / PROBE_DIVISIONS;
                let (start, end) = (spline_end - probe, spline_end + probe);
                let quintics = self.bounded_bridges(start, end, |joint| {
                    let spline = &splines[joint];
                    Polynomial::quintic_interpolation(
                        start,
                        spline.value(start),
                        spline.derivative(start),
                        0.,
                        end,
                        last[joint],
                        end_rates[joint],
                        0.,
                    )
                });
                if let Some(quintics) = quintics {
                    trace!("trailing bridge accepted at probe {:.4}", probe);
                    return Ok(TrailingBridge {
                        start,
                        end,
                        splines,
                        quintics,
                        stretches,
                    });
                }
            }

            debug!(
                "trailing bridge unconstrained, stretching the last segment from {:.3}",
                self.waypoints[last_segment].duration()
            );
            if stretches == MAX_STRETCH_ITERATIONS
                || !self.stretch_duration(last_segment, STRETCH_FACTOR)
            {
                warn!("no trailing bridge after {} stretches", stretches);
                return Err(TrajectoryError::Constructor {
                    location: StretchSite::TrailingPseudo,
                });
            }
            stretches += 1;
        }
    }

    /// Builds a bridge over `[start, end]` for every joint, `None` as soon as one of them
    /// fails to fit or breaks its acceleration bound.
    fn bounded_bridges<F>(&self, start: f64, end: f64, bridge: F) -> Option<Vec<Polynomial>>
    where
        F: Fn(usize) -> SplineResult<Polynomial>,
    {
        (0..self.dimension())
            .map(|joint| {
                bridge(joint).ok().filter(|quintic| {
                    quintic.acceleration_bounded(start, end, self.max_accelerations()[joint])
                })
            })
            .collect()
    }
}
