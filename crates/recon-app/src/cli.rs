use std::ffi::OsString;

use clap::{Command, CommandFactory, FromArgMatches, Parser};
use recon_pipeline::{
    PipelineCliArgs, STEP_COUNT,
    catalog,
    passthrough::{HELP_HEADING, Passthrough},
    preset::{DEFAULT_PRESET, Preset},
};

/// Photogrammetry reconstruction: COLMAP sparse model, OpenMVS dense mesh and texture.
#[derive(Debug, Parser)]
#[command(name = "mvs-pipeline", version)]
pub struct Cli {
    /// Print the step catalog with resolved tool paths and exit.
    #[arg(long = "list-steps", action = clap::ArgAction::SetTrue)]
    pub list_steps: bool,

    #[command(flatten)]
    pub pipeline: PipelineCliArgs,
}

/// Full command: derived flags plus one passthrough flag per step.
pub fn command() -> Command {
    let labels: Vec<&str> = catalog::labels().collect();
    Passthrough::augment_command(Cli::command(), &labels).after_help(after_help(&labels))
}

pub fn parse_from<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = command().try_get_matches_from(args)?;
    let mut cli = Cli::from_arg_matches(&matches)?;
    cli.pipeline.passthrough = Passthrough::from_matches(&matches, STEP_COUNT);
    Ok(cli)
}

/// Parse the process arguments, exiting with clap's message on error.
pub fn parse() -> Cli {
    parse_from(std::env::args_os()).unwrap_or_else(|err| err.exit())
}

fn after_help(labels: &[&str]) -> String {
    let steps = labels
        .iter()
        .enumerate()
        .map(|(index, label)| format!("  {index:>2}. {label}"))
        .collect::<Vec<_>>()
        .join("\n");
    let presets = Preset::describe_all()
        .lines()
        .map(|line| format!("  {line}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Steps:\n{steps}\n\nPresets (default {DEFAULT_PRESET}):\n{presets}\n\n\
         {HELP_HEADING} options are written without dashes, e.g. \
         `--9 resolution-level 2 cuda-device 0`."
    )
}
