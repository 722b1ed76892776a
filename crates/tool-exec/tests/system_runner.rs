#![cfg(unix)]

use std::{
    thread,
    time::{Duration, Instant},
};

use tool_exec::{CancelToken, Invocation, SystemRunner, ToolExit, ToolRunner};

fn shell(script: &str) -> Invocation {
    Invocation::new("sh", vec!["-c".into(), script.into()])
}

#[test]
fn cancelling_mid_run_kills_the_tool() {
    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(200));
        trigger.cancel();
    });

    let mut runner = SystemRunner::new().with_poll_interval(Duration::from_millis(20));
    let started = Instant::now();
    let exit = runner.run(&shell("sleep 30"), &cancel).unwrap();
    canceller.join().unwrap();

    assert_eq!(exit, ToolExit::Interrupted);
    assert!(
        started.elapsed() < Duration::from_secs(10),
        "tool was not killed promptly: {:?}",
        started.elapsed()
    );
}

#[test]
fn tool_writes_stay_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("scene.mvs");
    let script = format!("touch '{}'", marker.display());

    let mut runner = SystemRunner::new();
    let exit = runner.run(&shell(&script), &CancelToken::new()).unwrap();

    assert_eq!(exit, ToolExit::Success);
    assert!(marker.is_file());
}

#[test]
fn arguments_are_passed_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("args.txt");
    let invocation = Invocation::new(
        "sh",
        vec![
            "-c".into(),
            "printf '%s\\n' \"$@\" > \"$0\"".into(),
            out.display().to_string(),
            "--resolution-level".into(),
            "2".into(),
            "%unknown%".into(),
        ],
    );

    let mut runner = SystemRunner::new();
    let exit = runner.run(&invocation, &CancelToken::new()).unwrap();

    assert_eq!(exit, ToolExit::Success);
    let written = std::fs::read_to_string(out).unwrap();
    assert_eq!(written, "--resolution-level\n2\n%unknown%\n");
}
