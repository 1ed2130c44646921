use joint_trajectory::{JointTrajectory, Trajectory, TrajectoryConfig, TrajectoryError, Waypoint};
use rand::{rngs::StdRng, Rng, SeedableRng};

const MAX_ACCELERATION: f64 = 5.0;
const START_RATES: [f64; 2] = [0.0, 2.0];
const END_RATES: [f64; 2] = [0.0, 1.0];

fn waypoint(angles: [f64; 2], nominal_rate: f64) -> Waypoint {
    Waypoint::new(2)
        .with_angles(&angles)
        .unwrap()
        .with_uniform_nominal_rate(nominal_rate)
}

/// Two joints through five waypoints, with rates configured at both ends.
fn arm() -> JointTrajectory {
    let mut trajectory = JointTrajectory::new(2).with_name("arm");
    let start = waypoint([1.0, 1.0], 0.5).with_name("Initial Position");
    trajectory.append(start.with_rates(&START_RATES).unwrap()).unwrap();
    trajectory.append(waypoint([2.0, 0.0], 1.0)).unwrap();
    trajectory.append(waypoint([1.0, 5.0], 1.2)).unwrap();
    trajectory.append(waypoint([3.0, 3.0], 0.5)).unwrap();
    let goal = waypoint([4.0, 2.0], 0.5).with_name("Final Position");
    trajectory.append(goal.with_rates(&END_RATES).unwrap()).unwrap();
    trajectory.set_uniform_max_acceleration(MAX_ACCELERATION);
    trajectory
}

fn durations(trajectory: &JointTrajectory) -> Vec<f64> {
    trajectory.waypoints().iter().map(Waypoint::duration).collect()
}

/// End points, boundary rates, rest accelerations, C1 joins and the acceleration bound.
fn check_interpolation(trajectory: &JointTrajectory, start_rates: [f64; 2], end_rates: [f64; 2]) {
    let end = trajectory.duration();
    assert!(end > 0.0);
    let first = trajectory.waypoint(0).unwrap();
    let last = trajectory.last().unwrap();

    for joint in 0..trajectory.dimension() {
        assert!((trajectory.value(joint, 0.0).unwrap() - first.angles()[joint]).abs() < 1e-9);
        assert!((trajectory.value(joint, end).unwrap() - last.angles()[joint]).abs() < 1e-9);
        assert!((trajectory.derivative(joint, 0.0).unwrap() - start_rates[joint]).abs() < 1e-9);
        assert!((trajectory.derivative(joint, end).unwrap() - end_rates[joint]).abs() < 1e-9);
        assert!(trajectory.dderivative(joint, 0.0).unwrap().abs() < 1e-9);
        assert!(trajectory.dderivative(joint, end).unwrap().abs() < 1e-9);

        let profile = trajectory.joint(joint).unwrap();
        let h = 1e-8;
        for t in profile.get_time_sections().filter(|t| *t < end) {
            let jump = profile.get_position(t + h) - profile.get_position(t - h);
            assert!(jump.abs() < 1e-6, "joint {joint} jumps at {t}");
            let kink = profile.get_velocity(t + h) - profile.get_velocity(t - h);
            assert!(kink.abs() < 1e-5, "joint {joint} has a kink at {t}");
        }

        let bound = trajectory.max_accelerations()[joint] + 1e-6;
        for k in 0..=5000 {
            let t = end * k as f64 / 5000.0;
            let acceleration = trajectory.dderivative(joint, t).unwrap();
            assert!(acceleration.abs() <= bound, "joint {joint} at {t}: {acceleration}");
        }
    }
}

#[test]
fn test_tension_spline_scenario() {
    let mut trajectory = arm();
    trajectory.tension_spline_interpolation(4.0).unwrap();

    assert!(trajectory.is_interpolated());
    for joint in 0..2 {
        assert_eq!(trajectory.segments(joint).unwrap().len(), 3);
    }
    check_interpolation(&trajectory, START_RATES, END_RATES);
}

#[test]
fn test_linear_spline_scenario() {
    let mut trajectory = arm();
    trajectory.linear_spline_interpolation().unwrap();

    for joint in 0..2 {
        let segments = trajectory.segments(joint).unwrap();
        assert_eq!(segments.len(), 1);
        let (start, end) = segments[0].domain();
        assert_eq!(start, 0.0);
        assert!((end - trajectory.duration()).abs() < 1e-12);
    }
    check_interpolation(&trajectory, START_RATES, END_RATES);
}

#[test]
fn test_unconfigured_ends_start_and_stop_at_rest() {
    for tension in [None, Some(4.0)] {
        let mut trajectory = arm();
        trajectory.clear();
        for (index, waypoint) in arm().waypoints().iter().enumerate() {
            let mut waypoint = waypoint.clone();
            if index == 0 || index == 4 {
                waypoint.clear_rates();
            }
            trajectory.append(waypoint).unwrap();
        }

        match tension {
            Some(tension) => trajectory.tension_spline_interpolation(tension).unwrap(),
            None => trajectory.linear_spline_interpolation().unwrap(),
        }
        check_interpolation(&trajectory, [0.0; 2], [0.0; 2]);
        // resting ends are not written back into the waypoints
        assert!(!trajectory.waypoint(0).unwrap().rates_configured());
        assert!(!trajectory.last().unwrap().rates_configured());
    }
}

#[test]
fn test_evaluation_is_idempotent() {
    let mut trajectory = arm();
    trajectory.tension_spline_interpolation(4.0).unwrap();
    let end = trajectory.duration();

    let mut rng = StdRng::seed_from_u64(17);
    for _ in 0..500 {
        let joint = rng.gen_range(0..2);
        let t = rng.gen_range(0.0..=end);
        assert_eq!(trajectory.value(joint, t), trajectory.value(joint, t));
        assert_eq!(trajectory.derivative(joint, t), trajectory.derivative(joint, t));
        assert_eq!(trajectory.dderivative(joint, t), trajectory.dderivative(joint, t));
        assert!(trajectory.dderivative(joint, t).unwrap().abs() <= MAX_ACCELERATION + 1e-6);
    }
}

#[test]
fn test_durations_never_shrink() {
    for linear in [false, true] {
        let mut trajectory = arm();
        let mut estimated = trajectory.clone();
        assert!(estimated.initialise_waypoint_durations());

        if linear {
            trajectory.linear_spline_interpolation().unwrap();
        } else {
            trajectory.tension_spline_interpolation(4.0).unwrap();
        }
        for (before, after) in durations(&estimated).iter().zip(durations(&trajectory)) {
            assert!(after >= *before);
        }
        assert!(trajectory.duration() >= trajectory.waypoint_durations_total());
    }
}

#[test]
fn test_too_few_waypoints_is_a_configuration_error() {
    let mut trajectory = JointTrajectory::new(2);
    trajectory.append(waypoint([1.0, 1.0], 0.5).with_rates(&START_RATES).unwrap()).unwrap();
    trajectory.append(waypoint([2.0, 0.0], 1.0)).unwrap();
    trajectory.append(waypoint([1.0, 5.0], 1.2)).unwrap();
    trajectory.set_uniform_max_acceleration(MAX_ACCELERATION);
    let before = trajectory.clone();

    let result = trajectory.tension_spline_interpolation(4.0);
    assert!(matches!(result, Err(TrajectoryError::Configuration(_))));
    assert!(!trajectory.is_interpolated());
    for (after, before) in trajectory.waypoints().iter().zip(before.waypoints()) {
        assert_eq!(after, before);
        assert_eq!(after.duration(), before.duration());
        assert_eq!(after.rates(), before.rates());
        assert_eq!(after.rates_configured(), before.rates_configured());
        assert_eq!(after.nominal_rates(), before.nominal_rates());
    }

    // three waypoints are plenty for the linear spline
    trajectory.linear_spline_interpolation().unwrap();
    assert!(trajectory.is_interpolated());
}

#[test]
fn test_reinterpolation_replaces_segments() {
    let mut trajectory = arm();
    trajectory.tension_spline_interpolation(4.0).unwrap();
    assert_eq!(trajectory.segments(0).unwrap().len(), 3);

    trajectory.linear_spline_interpolation().unwrap();
    assert_eq!(trajectory.segments(0).unwrap().len(), 1);

    trajectory.clear();
    assert!(!trajectory.is_interpolated());
    assert_eq!(trajectory.value(0, 0.0), Err(TrajectoryError::NotInterpolated));
}

#[test]
fn test_description_file_matches_hand_built() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/arm.toml");
    let config = TrajectoryConfig::from_file(path).unwrap();
    let loaded = config.interpolate().unwrap();

    let mut built = arm();
    built.tension_spline_interpolation(4.0).unwrap();
    assert_eq!(loaded.duration(), built.duration());
    assert_eq!(loaded.waypoint(0).unwrap().name(), "Initial Position");

    let rows = loaded.sample(1, config.samples).unwrap();
    assert_eq!(rows.len(), config.samples);
    assert_eq!(rows[0][0], 0.0);
    assert!((rows[0][1] - 1.0).abs() < 1e-9);
    assert!((rows[0][2] - 2.0).abs() < 1e-9);
    assert!((rows[rows.len() - 1][1] - 2.0).abs() < 1e-9);
}
