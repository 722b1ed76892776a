mod cli;

use anyhow::Result;
use chrono::Utc;
use recon_pipeline::{
    DryRunner, Execution, Executor, PipelineError, RunConfig, RunPlan, RunReport, StepRegistry,
    ToolPaths, enter_runtime, preset::Preset,
};
use tool_exec::{CancelToken, SystemRunner};
use tracing::{info, warn};

fn main() {
    let cli = cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("{err:?}");
        std::process::exit(exit_code(&err));
    }
}

fn run(cli: cli::Cli) -> Result<()> {
    let _telemetry = enter_runtime(&cli.pipeline.telemetry_options());

    if cli.list_steps {
        let tools = ToolPaths::discover(
            cli.pipeline.colmap_bin.clone(),
            cli.pipeline.openmvs_dir.clone(),
        );
        println!("{}", StepRegistry::new(&tools).describe());
        println!();
        println!("{}", Preset::describe_all());
        return Ok(());
    }

    let config = RunConfig::try_from(cli.pipeline)?;
    info!("Using input dir  {}", config.input_dir.display());
    info!("      output dir {}", config.output_dir.display());
    info!("Steps: {:?}", config.steps);

    if config.dry_run {
        info!("Dry run: commands are printed, nothing is executed");
    } else {
        config.prepare_workspace()?;
    }

    let registry = StepRegistry::new(&config.tools);
    let plan = RunPlan::new(&registry, &config);

    let cancel = CancelToken::new();
    cancel.install_ctrlc_handler();

    let started_at = Utc::now();
    let Execution { records, result } = if config.dry_run {
        Executor::new(DryRunner, cancel).run(&plan)
    } else {
        Executor::new(SystemRunner::new(), cancel).run(&plan)
    };

    if let Some(path) = config.report_path.as_ref() {
        let report = RunReport::new(&config, started_at, records, &result);
        match report.write_json(path) {
            Ok(()) => info!("Run report written to {}", path.display()),
            // The run's own failure takes precedence over the report's.
            Err(err) if result.is_err() => warn!("{err}"),
            Err(err) => return Err(err.into()),
        }
    }

    match result {
        Ok(()) => {
            info!("Pipeline finished");
            Ok(())
        }
        Err(err) => {
            if err.is_interruption() {
                warn!("Process canceled by user, all files remain");
            }
            Err(err.into())
        }
    }
}

/// Exit status for `err`: the pipeline's own mapping when a [`PipelineError`]
/// is in the chain, `1` otherwise.
fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<PipelineError>())
        .map(PipelineError::exit_code)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use anyhow::Context;

    use super::*;

    fn parse(args: &[OsString]) -> cli::Cli {
        cli::parse_from(args.iter().cloned()).unwrap()
    }

    #[test]
    fn exit_code_finds_pipeline_error_behind_context() {
        let err = Err::<(), _>(PipelineError::ToolFailure {
            index: 2,
            label: "Colmap Mapper".into(),
            command_line: "colmap mapper".into(),
            code: Some(7),
        })
        .context("pipeline run")
        .unwrap_err();
        assert_eq!(exit_code(&err), 7);
    }

    #[test]
    fn usage_errors_exit_with_two() {
        let err = anyhow::Error::from(PipelineError::ConflictingSelection);
        assert_eq!(exit_code(&err), 2);
    }

    #[test]
    fn other_errors_exit_with_one() {
        assert_eq!(exit_code(&anyhow::anyhow!("boom")), 1);
    }

    #[test]
    fn dry_run_creates_nothing_and_writes_report() {
        let input = tempfile::tempdir().unwrap();
        let out = input.path().join("out");
        let report = input.path().join("report.json");
        let cli = parse(&[
            "mvs-pipeline".into(),
            input.path().into(),
            out.clone().into(),
            "--dry-run".into(),
            "--report".into(),
            report.clone().into(),
            "--colmap-bin".into(),
            "/opt/colmap/colmap".into(),
            "--openmvs-dir".into(),
            "/opt/openmvs".into(),
        ]);

        run(cli).unwrap();
        assert!(!out.exists());
        let json = std::fs::read_to_string(&report).unwrap();
        assert!(json.contains("\"outcome\": \"succeeded\""));
        assert!(json.contains("/opt/openmvs/TextureMesh"));
    }

    #[test]
    fn missing_input_is_a_usage_error() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("missing");
        let out = root.path().join("out");
        let cli = parse(&["mvs-pipeline".into(), missing.into(), out.into()]);
        let err = run(cli).unwrap_err();
        assert_eq!(exit_code(&err), 2);
    }
}
