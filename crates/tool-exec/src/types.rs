use std::{fmt, io, path::PathBuf};

use thiserror::Error;

/// Fully resolved command line for a single external tool run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Space separated rendering of the program and its arguments.
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// How an external tool run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolExit {
    Success,
    /// Non-zero exit. `code` is `None` when the process was terminated by a signal.
    Failed { code: Option<i32> },
    /// The operator cancelled the run while the tool was active.
    Interrupted,
}

impl ToolExit {
    pub fn is_success(self) -> bool {
        matches!(self, ToolExit::Success)
    }
}

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to launch {program:?}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed while waiting on {program:?}")]
    Wait {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
}
