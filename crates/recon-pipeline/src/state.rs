//! Per-step lifecycle tracked by the executor.
//!
//! Each step moves `Pending -> Running` when its process is spawned and ends
//! in exactly one of `Succeeded`, `Failed` or `Aborted`.

use std::fmt;

use serde::Serialize;
use tool_exec::ToolExit;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Aborted,
}

impl StepState {
    /// Lower case name used in log messages and the run report.
    pub fn label(self) -> &'static str {
        match self {
            StepState::Pending => "pending",
            StepState::Running => "running",
            StepState::Succeeded => "succeeded",
            StepState::Failed => "failed",
            StepState::Aborted => "aborted",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            StepState::Succeeded | StepState::Failed | StepState::Aborted
        )
    }

    /// Terminal state reached by a running step whose tool ended with `exit`.
    pub fn after(exit: ToolExit) -> Self {
        match exit {
            ToolExit::Success => StepState::Succeeded,
            ToolExit::Failed { .. } => StepState::Failed,
            ToolExit::Interrupted => StepState::Aborted,
        }
    }
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
