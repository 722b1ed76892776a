use std::{
    path::Path,
    process::{Child, Command, ExitStatus, Stdio},
    thread,
    time::Duration,
};

use tracing::{debug, warn};

use crate::{
    cancel::CancelToken,
    types::{ExecError, Invocation, ToolExit},
};

/// Interval between exit checks while a tool is running.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Runs one external tool to completion.
///
/// Implementations block until the tool has exited or the cancel token fired.
pub trait ToolRunner {
    fn run(&mut self, invocation: &Invocation, cancel: &CancelToken)
    -> Result<ToolExit, ExecError>;
}

/// Spawns real processes with inherited stdio and waits on them.
#[derive(Clone, Debug)]
pub struct SystemRunner {
    poll_interval: Duration,
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

impl ToolRunner for SystemRunner {
    fn run(
        &mut self,
        invocation: &Invocation,
        cancel: &CancelToken,
    ) -> Result<ToolExit, ExecError> {
        if cancel.is_cancelled() {
            return Ok(ToolExit::Interrupted);
        }

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;
        debug!(pid = child.id(), "spawned {}", invocation.program.display());

        wait_for_exit(&mut child, &invocation.program, cancel, self.poll_interval)
    }
}

/// Poll `child` until it exits, killing it if the operator cancels first.
fn wait_for_exit(
    child: &mut Child,
    program: &Path,
    cancel: &CancelToken,
    poll_interval: Duration,
) -> Result<ToolExit, ExecError> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                // Ctrl+C reaches the whole foreground group, so the tool often
                // dies from the same signal before the flag is observed.
                if !status.success() && cancel.is_cancelled() {
                    return Ok(ToolExit::Interrupted);
                }
                return Ok(exit_from_status(status));
            }
            Ok(None) => {}
            Err(source) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ExecError::Wait {
                    program: program.to_path_buf(),
                    source,
                });
            }
        }

        if cancel.is_cancelled() {
            warn!("Interrupt received; stopping {}", program.display());
            let _ = child.kill();
            let _ = child.wait();
            return Ok(ToolExit::Interrupted);
        }

        thread::sleep(poll_interval);
    }
}

fn exit_from_status(status: ExitStatus) -> ToolExit {
    if status.success() {
        ToolExit::Success
    } else {
        ToolExit::Failed {
            code: status.code(),
        }
    }
}
