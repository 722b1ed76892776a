use std::path::{Path, PathBuf};

use clap::Parser;
use recon_pipeline::{
    Executor, PipelineCliArgs, PipelineError, RunConfig, RunOutcome, RunPlan, RunReport,
    StepRegistry, StepState,
    catalog::{MAPPER_STEP, REFINE_MESH_STEP, TEXTURE_MESH_STEP},
};
use tool_exec::{CancelToken, ExecError, Invocation, ToolExit, ToolRunner};

#[derive(Debug, Parser)]
struct TestCli {
    #[arg(long = "list-steps")]
    list_steps: bool,
    #[command(flatten)]
    pipeline: PipelineCliArgs,
}

struct Workspace {
    _root: tempfile::TempDir,
    input: PathBuf,
    output: PathBuf,
}

fn workspace() -> Workspace {
    let root = tempfile::tempdir().unwrap();
    let input = root.path().join("scan");
    std::fs::create_dir_all(input.join("images")).unwrap();
    let output = root.path().join("out");
    Workspace {
        _root: root,
        input,
        output,
    }
}

fn config(ws: &Workspace, extra: &[&str]) -> RunConfig {
    let mut argv = vec![
        "mvs-pipeline".to_string(),
        ws.input.display().to_string(),
        ws.output.display().to_string(),
        "--colmap-bin".to_string(),
        "/opt/colmap/colmap".to_string(),
        "--openmvs-dir".to_string(),
        "/opt/openmvs".to_string(),
    ];
    argv.extend(extra.iter().map(|arg| arg.to_string()));
    let cli = TestCli::try_parse_from(argv).unwrap();
    RunConfig::try_from(cli.pipeline).unwrap()
}

/// Answers success for everything except the steps whose label is listed.
#[derive(Default)]
struct RecordingRunner {
    failures: Vec<(&'static str, i32)>,
    seen: Vec<Invocation>,
}

impl ToolRunner for RecordingRunner {
    fn run(
        &mut self,
        invocation: &Invocation,
        _cancel: &CancelToken,
    ) -> Result<ToolExit, ExecError> {
        self.seen.push(invocation.clone());
        let subcommand = invocation.args.first().map(String::as_str).unwrap_or("");
        let exit = self
            .failures
            .iter()
            .find(|(name, _)| *name == subcommand)
            .map(|&(_, code)| ToolExit::Failed { code: Some(code) })
            .unwrap_or(ToolExit::Success);
        Ok(exit)
    }
}

fn run_with(
    config: &RunConfig,
    runner: RecordingRunner,
) -> (Vec<Invocation>, recon_pipeline::Execution) {
    let registry = StepRegistry::new(&config.tools);
    let plan = RunPlan::new(&registry, config);
    let mut executor = Executor::new(runner, CancelToken::new());
    let execution = executor.run(&plan);
    (executor.runner().seen.clone(), execution)
}

#[test]
fn sequential_preset_runs_steps_zero_through_ten() {
    let ws = workspace();
    let config = config(&ws, &["--preset", "SEQUENTIAL"]);
    let (seen, execution) = run_with(&config, RecordingRunner::default());

    assert!(execution.succeeded());
    let indices: Vec<_> = execution.records.iter().map(|r| r.index).collect();
    assert_eq!(indices, (0..=10).collect::<Vec<_>>());
    assert_eq!(seen.len(), 11);
    assert_eq!(seen[0].program, Path::new("/opt/colmap/colmap"));
    assert_eq!(seen[10].program, Path::new("/opt/openmvs/TextureMesh"));

    let output = ws.output.display().to_string();
    assert!(seen[0].args.contains(&format!("{output}/colmap.db")));
    assert!(seen.iter().all(|inv| !inv.command_line().contains('%')));
    assert_eq!(
        RunOutcome::from_result(&execution.result),
        RunOutcome::Succeeded
    );
}

#[test]
fn mapper_failure_halts_the_run() {
    let ws = workspace();
    let config = config(&ws, &["--preset", "SEQUENTIAL"]);
    let runner = RecordingRunner {
        failures: vec![("mapper", 1)],
        ..Default::default()
    };
    let (seen, execution) = run_with(&config, runner);

    assert_eq!(seen.len(), 3);
    assert_eq!(execution.records.last().unwrap().index, MAPPER_STEP);
    assert_eq!(execution.records.last().unwrap().state, StepState::Failed);
    let err = execution.result.as_ref().unwrap_err();
    assert!(matches!(
        err,
        PipelineError::ToolFailure {
            index: MAPPER_STEP,
            code: Some(1),
            ..
        }
    ));
    assert_ne!(err.exit_code(), 0);

    let report = RunReport::new(&config, chrono::Utc::now(), execution.records, &execution.result);
    assert_eq!(report.outcome, RunOutcome::Failed);
    assert_eq!(report.steps.len(), 3);
}

#[test]
fn refine_overrides_and_texture_rule_meet_in_one_run() {
    let ws = workspace();
    let mut config = config(&ws, &["--steps", "8", "9", "10"]);
    config.passthrough = config
        .passthrough
        .clone()
        .with_tokens(REFINE_MESH_STEP, &["resolution-level", "2"]);
    let (seen, execution) = run_with(&config, RecordingRunner::default());

    assert!(execution.succeeded());
    let refine = &seen[1];
    assert_eq!(
        refine
            .args
            .iter()
            .filter(|arg| *arg == "--resolution-level")
            .count(),
        1
    );
    assert_eq!(&refine.args[refine.args.len() - 2..], ["--resolution-level", "2"]);
    let texture = &seen[2];
    assert_eq!(texture.args[0], "scene_dense_mesh_refine.mvs");

    let config_without_refine = {
        let ws = workspace();
        self::config(&ws, &["--steps", "8", "10"])
    };
    let (seen, _) = run_with(&config_without_refine, RecordingRunner::default());
    assert_eq!(seen[1].program.file_name().unwrap(), "TextureMesh");
    assert_eq!(seen[1].args[0], "scene_dense_mesh.mvs");
    assert!(TEXTURE_MESH_STEP > REFINE_MESH_STEP);
}

#[test]
fn empty_color_and_colour_switch_reach_the_tools() {
    let ws = workspace();
    let config = config(
        &ws,
        &["--steps", "2", "10", "--colored_points", "0", "--empty_color", "255"],
    );
    let (seen, _) = run_with(&config, RecordingRunner::default());
    let mapper = &seen[0].args;
    let position = mapper
        .iter()
        .position(|arg| arg == "--Mapper.extract_colors")
        .unwrap();
    assert_eq!(mapper[position + 1], "0");
    let texture = &seen[1].args;
    assert_eq!(texture.last().map(String::as_str), Some("255"));
}

#[cfg(unix)]
mod real_processes {
    use std::{fs, os::unix::fs::PermissionsExt};

    use recon_pipeline::catalog::STEP_COUNT;
    use tool_exec::SystemRunner;

    use super::*;

    /// Fake tool that appends its name and first argument to `calls.log` and
    /// exits with the code stored in `<name>.exit`, if present.
    fn install_fake_tool(dir: &Path, name: &str) {
        let script = format!(
            "#!/bin/sh\n\
             echo \"{name} $1\" >> '{log}'\n\
             if [ -f '{exit}' ]; then exit $(cat '{exit}'); fi\n\
             exit 0\n",
            log = dir.join("calls.log").display(),
            exit = dir.join(format!("{name}.exit")).display(),
        );
        let path = dir.join(name);
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn tool_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "colmap",
            "InterfaceCOLMAP",
            "DensifyPointCloud",
            "ReconstructMesh",
            "RefineMesh",
            "TextureMesh",
        ] {
            install_fake_tool(dir.path(), name);
        }
        dir
    }

    fn real_config(ws: &Workspace, tools: &Path, extra: &[&str]) -> RunConfig {
        let colmap = tools.join("colmap");
        let mut argv = vec![
            "mvs-pipeline".to_string(),
            ws.input.display().to_string(),
            ws.output.display().to_string(),
            "--colmap-bin".to_string(),
            colmap.display().to_string(),
            "--openmvs-dir".to_string(),
            tools.display().to_string(),
        ];
        argv.extend(extra.iter().map(|arg| arg.to_string()));
        let cli = TestCli::try_parse_from(argv).unwrap();
        RunConfig::try_from(cli.pipeline).unwrap()
    }

    fn execute(config: &RunConfig) -> recon_pipeline::Execution {
        config.prepare_workspace().unwrap();
        let registry = StepRegistry::new(&config.tools);
        let plan = RunPlan::new(&registry, config);
        Executor::new(SystemRunner::new(), CancelToken::new()).run(&plan)
    }

    fn calls(tools: &Path) -> Vec<String> {
        fs::read_to_string(tools.join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn full_preset_spawns_every_tool_in_order() {
        let ws = workspace();
        let tools = tool_dir();
        let config = real_config(&ws, tools.path(), &["--preset", "FULL"]);
        let execution = execute(&config);

        assert!(execution.succeeded(), "{:?}", execution.result);
        let calls = calls(tools.path());
        assert_eq!(calls.len(), STEP_COUNT);
        assert_eq!(calls[0], "colmap feature_extractor");
        assert_eq!(calls[2], "colmap mapper");
        assert_eq!(calls[6], "InterfaceCOLMAP -w");
        assert_eq!(calls[10], "TextureMesh scene_dense_mesh_refine.mvs");
        assert!(ws.output.join("sparse").is_dir());
        assert!(ws.output.join("mvs").is_dir());
    }

    #[test]
    fn non_zero_exit_stops_later_tools() {
        let ws = workspace();
        let tools = tool_dir();
        fs::write(tools.path().join("ReconstructMesh.exit"), "4").unwrap();
        let config = real_config(&ws, tools.path(), &["--steps", "7", "8", "9", "10"]);
        let execution = execute(&config);

        let calls = calls(tools.path());
        assert_eq!(
            calls,
            vec!["DensifyPointCloud scene.mvs", "ReconstructMesh scene_dense.mvs"]
        );
        let err = execution.result.unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert!(err.to_string().contains("Reconstruct the mesh"));
    }

    #[test]
    fn missing_tool_is_a_launch_failure() {
        let ws = workspace();
        let tools = tempfile::tempdir().unwrap();
        let config = real_config(&ws, tools.path(), &["--steps", "0"]);
        let execution = execute(&config);
        assert!(matches!(
            execution.result,
            Err(PipelineError::Spawn { index: 0, .. })
        ));
        assert_eq!(execution.records.len(), 1);
    }
}
