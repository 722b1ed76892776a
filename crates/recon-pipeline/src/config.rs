//! Configuration parsing for a reconstruction run.
//!
//! This module owns translation of CLI arguments into a `RunConfig` struct
//! which the resolver and executor use without re-parsing flags.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use clap::{Args, ValueEnum};
use tracing::debug;

use crate::{catalog::ToolPaths, error::PipelineError, passthrough::Passthrough, preset};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
/// COLMAP camera models accepted by feature extraction.
pub enum CameraModel {
    #[value(name = "SIMPLE_PINHOLE")]
    SimplePinhole,
    #[value(name = "PINHOLE")]
    Pinhole,
    #[value(name = "SIMPLE_RADIAL")]
    SimpleRadial,
    #[value(name = "RADIAL")]
    Radial,
    #[value(name = "OPENCV")]
    OpenCv,
    #[value(name = "FULL_OPENCV")]
    FullOpenCv,
    #[value(name = "SIMPLE_RADIAL_FISHEYE")]
    SimpleRadialFisheye,
    #[value(name = "RADIAL_FISHEYE")]
    RadialFisheye,
    #[value(name = "OPENCV_FISHEYE")]
    OpenCvFisheye,
    #[value(name = "FOV")]
    Fov,
    #[value(name = "THIN_PRISM_FISHEYE")]
    ThinPrismFisheye,
}

impl CameraModel {
    /// Name as COLMAP spells it on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            CameraModel::SimplePinhole => "SIMPLE_PINHOLE",
            CameraModel::Pinhole => "PINHOLE",
            CameraModel::SimpleRadial => "SIMPLE_RADIAL",
            CameraModel::Radial => "RADIAL",
            CameraModel::OpenCv => "OPENCV",
            CameraModel::FullOpenCv => "FULL_OPENCV",
            CameraModel::SimpleRadialFisheye => "SIMPLE_RADIAL_FISHEYE",
            CameraModel::RadialFisheye => "RADIAL_FISHEYE",
            CameraModel::OpenCvFisheye => "OPENCV_FISHEYE",
            CameraModel::Fov => "FOV",
            CameraModel::ThinPrismFisheye => "THIN_PRISM_FISHEYE",
        }
    }
}

impl fmt::Display for CameraModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default)]
/// Optional logging knobs.
pub struct TelemetryOptions {
    /// Raise the default log level to `debug`.
    pub verbose: bool,
    /// Write a Chrome trace JSON file with one span per step.
    pub chrome_trace_path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
/// Canonical configuration for one run, fully resolved before any step executes.
pub struct RunConfig {
    /// Absolute directory holding `images/`.
    pub input_dir: PathBuf,
    /// Absolute directory receiving every artifact.
    pub output_dir: PathBuf,
    /// `output_dir/sparse`, the COLMAP sparse model.
    pub sparse_dir: PathBuf,
    /// `output_dir/dense`, undistorted images and model.
    pub dense_dir: PathBuf,
    /// `output_dir/mvs`, the OpenMVS working directory.
    pub mvs_dir: PathBuf,
    pub camera_model: CameraModel,
    /// Whether the mapper keeps vertex colors.
    pub colored_points: bool,
    /// Fill color for untextured regions.
    pub empty_color: u32,
    /// Ordered step indices to run.
    pub steps: Vec<usize>,
    /// Per-step option overrides.
    pub passthrough: Passthrough,
    /// Locations of the COLMAP and OpenMVS executables.
    pub tools: ToolPaths,
    /// Log command lines instead of spawning them.
    pub dry_run: bool,
    /// Where to write the JSON run report.
    pub report_path: Option<PathBuf>,
    pub telemetry: TelemetryOptions,
}

/// CLI arguments describing a reconstruction run.
#[derive(Debug, Args)]
pub struct PipelineCliArgs {
    /// Directory containing the `images/` picture set.
    #[arg(value_name = "INPUT_DIR", required_unless_present = "list_steps")]
    pub input_dir: Option<PathBuf>,
    /// Directory that will contain the resulting files.
    #[arg(value_name = "OUTPUT_DIR", required_unless_present = "list_steps")]
    pub output_dir: Option<PathBuf>,
    /// Camera model for COLMAP feature extraction.
    #[arg(value_name = "CAMERA_MODEL", value_enum, default_value_t = CameraModel::SimpleRadial)]
    pub camera_model: CameraModel,

    /// Steps to process, in order.
    #[arg(long = "steps", value_name = "STEP", num_args = 1..)]
    pub steps: Option<Vec<usize>>,
    /// Named step list (SEQUENTIAL, FULL, NOBA); default NOBA.
    #[arg(long = "preset", value_name = "PRESET")]
    pub preset: Option<String>,
    /// Extract vertex colors for points (1) or not (0).
    #[arg(
        long = "colored_points",
        value_name = "0|1",
        default_value = "1",
        action = clap::ArgAction::Set,
        value_parser = parse_switch
    )]
    pub colored_points: bool,
    /// Color for fill-in texture (0 is black).
    #[arg(long = "empty_color", value_name = "COLOR", default_value_t = 0)]
    pub empty_color: u32,

    /// COLMAP executable; searched on PATH when omitted.
    #[arg(long = "colmap-bin", env = "COLMAP_BIN", value_name = "PATH")]
    pub colmap_bin: Option<PathBuf>,
    /// Directory with the OpenMVS executables; searched on PATH when omitted.
    #[arg(long = "openmvs-dir", env = "OPENMVS_BIN", value_name = "DIR")]
    pub openmvs_dir: Option<PathBuf>,

    /// Print each step's command line without running it.
    #[arg(long = "dry-run", action = clap::ArgAction::SetTrue)]
    pub dry_run: bool,
    /// Write a JSON run report to this path.
    #[arg(long = "report", value_name = "PATH")]
    pub report: Option<PathBuf>,
    /// Enable debug logging.
    #[arg(long = "verbose", short = 'v', action = clap::ArgAction::SetTrue)]
    pub verbose: bool,
    /// Emit Chrome trace JSON with one span per step.
    #[arg(long = "chrome-trace", value_name = "PATH")]
    pub chrome_trace: Option<PathBuf>,

    /// Filled from the per-step passthrough flags after parsing.
    #[arg(skip)]
    pub passthrough: Passthrough,
}

impl PipelineCliArgs {
    /// Logging options, available before the rest of the arguments are validated.
    pub fn telemetry_options(&self) -> TelemetryOptions {
        TelemetryOptions {
            verbose: self.verbose,
            chrome_trace_path: self.chrome_trace.clone(),
        }
    }
}

fn parse_switch(value: &str) -> Result<bool, String> {
    match value {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        other => Err(format!("expected 0 or 1, got {other:?}")),
    }
}

impl TryFrom<PipelineCliArgs> for RunConfig {
    type Error = PipelineError;

    fn try_from(args: PipelineCliArgs) -> Result<Self, PipelineError> {
        let telemetry = args.telemetry_options();
        let input_dir = args
            .input_dir
            .ok_or(PipelineError::MissingArgument("INPUT_DIR"))?;
        let output_dir = args
            .output_dir
            .ok_or(PipelineError::MissingArgument("OUTPUT_DIR"))?;

        let input_dir = absolute(&input_dir)?;
        if !input_dir.exists() {
            return Err(PipelineError::PathNotFound { path: input_dir });
        }
        let output_dir = absolute(&output_dir)?;

        let steps = preset::select(args.steps.as_deref(), args.preset.as_deref())?;

        let tools = ToolPaths::discover(args.colmap_bin, args.openmvs_dir);
        debug!(
            "COLMAP: {}, OpenMVS: {}",
            tools.colmap.display(),
            tools.openmvs_dir.display()
        );

        Ok(Self {
            sparse_dir: output_dir.join("sparse"),
            dense_dir: output_dir.join("dense"),
            mvs_dir: output_dir.join("mvs"),
            input_dir,
            output_dir,
            camera_model: args.camera_model,
            colored_points: args.colored_points,
            empty_color: args.empty_color,
            steps,
            passthrough: args.passthrough,
            tools,
            dry_run: args.dry_run,
            report_path: args.report,
            telemetry,
        })
    }
}

impl RunConfig {
    /// Create the output, sparse and mvs directories when absent.
    ///
    /// `dense` is left to the undistortion step, which creates it itself.
    pub fn prepare_workspace(&self) -> Result<(), PipelineError> {
        for dir in [&self.output_dir, &self.sparse_dir, &self.mvs_dir] {
            fs::create_dir_all(dir).map_err(|source| PipelineError::CreateDir {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

fn absolute(path: &Path) -> Result<PathBuf, PipelineError> {
    std::path::absolute(path).map_err(|source| PipelineError::ResolvePath {
        path: path.to_path_buf(),
        source,
    })
}
