//! overlay-calib CLI: recompute and inspect persisted overlay calibrations.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use log::{info, LevelFilter};
use overlay_calib::{
    CalibrationError, CalibrationRecord, ImagePoint, Placement, PlacementSolution, RecordIoError,
    Session, SolverParams,
};

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Record(#[from] RecordIoError),
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Logger(#[from] log::SetLoggerError),
    #[error(transparent)]
    Tracing(#[from] tracing_subscriber::util::TryInitError),
    #[error("record is not calibrated: {0}")]
    NotCalibrated(CalibrationError),
}

#[derive(Parser)]
#[command(name = "overlay-calib")]
#[command(about = "Recompute and inspect image-overlay calibration records")]
#[command(version)]
struct Cli {
    /// Log progress to stderr (repeat for debug output).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Report through `tracing` (spans with timings, `RUST_LOG` honoured).
    #[arg(long, global = true)]
    trace: bool,

    /// Emit `--trace` output as JSON lines.
    #[arg(long, global = true, requires = "trace")]
    json: bool,

    #[command(flatten)]
    solver: SolverArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Args)]
struct SolverArgs {
    /// Minimum image-space triangle area (fraction of image area) for a
    /// non-degenerate point set.
    #[arg(long, global = true)]
    min_area: Option<f64>,

    /// Point cap for multi-point calibrations.
    #[arg(long, global = true)]
    max_points: Option<usize>,
}

impl SolverArgs {
    fn to_params(&self) -> SolverParams {
        let mut params = SolverParams::default();
        if let Some(min_area) = self.min_area {
            params.min_triangle_area = min_area;
        }
        if let Some(max_points) = self.max_points {
            params.max_points = max_points;
        }
        params
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Re-derive the placement from the record's control points.
    Solve {
        /// Calibration record (JSON).
        #[arg(long)]
        record: PathBuf,
        /// Where to write the updated record; stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Report whether the record can be finalized, and why not.
    Check {
        #[arg(long)]
        record: PathBuf,
    },

    /// Map a normalized image position to geo coordinates.
    Project {
        #[arg(long)]
        record: PathBuf,
        #[arg(long)]
        x: f64,
        #[arg(long)]
        y: f64,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    if cli.trace {
        overlay_calib::core::init_tracing(level, cli.json)?;
    } else {
        overlay_calib::core::init_with_level(level)?;
    }

    let params = cli.solver.to_params();
    match cli.command {
        Commands::Solve { record, out } => run_solve(&record, out.as_deref(), params),
        Commands::Check { record } => run_check(&record, params),
        Commands::Project { record, x, y } => run_project(&record, x, y, params),
    }
}

fn load_session(
    path: &Path,
    params: SolverParams,
) -> Result<(Session, CalibrationRecord), CliError> {
    info!("loading {}", path.display());
    let record = CalibrationRecord::load_json(path)?;
    let session = Session::from_record(&record, params)?;
    Ok((session, record))
}

fn run_solve(path: &Path, out: Option<&Path>, params: SolverParams) -> Result<(), CliError> {
    let (session, record) = load_session(path, params)?;
    let updated = session.finalize(record.image_ref)?;
    match out {
        Some(out) => {
            updated.write_json(out)?;
            info!("record written to {}", out.display());
        }
        None => println!("{}", updated.to_json_string()?),
    }
    Ok(())
}

fn run_check(path: &Path, params: SolverParams) -> Result<(), CliError> {
    let (session, record) = load_session(path, params)?;
    let solution = calibrated(&session)?;

    let kind = match solution.placement {
        Placement::AxisAligned(_) => "axis-aligned",
        Placement::Rotated(_) => "rotated",
    };
    println!(
        "ok: {} calibration, {} points, {kind} placement",
        session.mode(),
        session.list_gcps().len()
    );
    if solution.placement != record.placement {
        println!("stored placement is stale; run `overlay-calib solve` to refresh it");
    }
    if let Some(residuals) = session.residuals() {
        let worst = residuals.iter().map(|&(_, r)| r).fold(0.0, f64::max);
        println!("max residual: {worst:.3e} deg");
    }
    Ok(())
}

fn run_project(path: &Path, x: f64, y: f64, params: SolverParams) -> Result<(), CliError> {
    let (session, _) = load_session(path, params)?;
    let p = ImagePoint::checked(x, y).map_err(CalibrationError::from)?;
    let geo = calibrated(&session)?.transform.apply(p);
    println!("{}", serde_json::to_string(&geo)?);
    Ok(())
}

fn calibrated(session: &Session) -> Result<&PlacementSolution, CliError> {
    session
        .solution()
        .map_err(|err| CliError::NotCalibrated(err.clone()))
}
