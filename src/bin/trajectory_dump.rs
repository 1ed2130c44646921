use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use clap::Parser;
use joint_trajectory::TrajectoryConfig;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "trajectory_dump")]
#[command(about = "Interpolates a trajectory description and dumps the sampled joints", long_about = None)]
struct Args {
    /// Trajectory description (.toml or .json)
    config: PathBuf,

    /// Directory the `<name>_<joint>.dat` files are written to
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Rows per joint, overrides the description
    #[arg(short, long)]
    samples: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let fallback = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback)),
        )
        .init();

    let config = TrajectoryConfig::from_file(&args.config)?;
    let trajectory = config.interpolate()?;
    info!(
        "{} waypoints interpolated over {:.3}s",
        trajectory.size(),
        trajectory.duration()
    );

    let stem = if trajectory.name().is_empty() {
        "trajectory"
    } else {
        trajectory.name()
    };
    let samples = args.samples.unwrap_or(config.samples);
    std::fs::create_dir_all(&args.output)?;
    for joint in 0..trajectory.dimension() {
        let path = args.output.join(format!("{stem}_{joint}.dat"));
        let mut file = BufWriter::new(File::create(&path)?);
        writeln!(file, "# t y y' y''")?;
        for [t, y, y_dot, y_ddot] in trajectory.sample(joint, samples)? {
            writeln!(file, "{t:.6} {y:.6} {y_dot:.6} {y_ddot:.6}")?;
        }
        file.flush()?;
        info!("joint {} written to {}", joint, path.display());
    }
    Ok(())
}
