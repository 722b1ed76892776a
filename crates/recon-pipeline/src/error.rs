use std::{io, path::PathBuf};

use thiserror::Error;
use tool_exec::ExecError;

/// Exit code used when the operator interrupts the run.
pub const EXIT_INTERRUPTED: i32 = 130;
/// Exit code used for invocation and selection mistakes caught before or
/// between steps.
pub const EXIT_USAGE: i32 = 2;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{}: path not found", path.display())]
    PathNotFound { path: PathBuf },

    #[error("missing required argument {0}")]
    MissingArgument(&'static str),

    #[error("steps and preset arguments can't be set together")]
    ConflictingSelection,

    #[error("unknown preset {name}, choose {}", valid.join(" or "))]
    UnknownPreset {
        name: String,
        valid: Vec<&'static str>,
    },

    #[error("step index {index} is out of range (valid steps are 0..{len})")]
    InvalidIndex { index: usize, len: usize },

    #[error("step #{index} ({label}) failed with {}\n  command: {command_line}", describe_exit(.code))]
    ToolFailure {
        index: usize,
        label: String,
        command_line: String,
        code: Option<i32>,
    },

    #[error("step #{index} ({label}) interrupted by operator, produced files are kept\n  command: {command_line}")]
    Interrupted {
        index: usize,
        label: String,
        command_line: String,
    },

    #[error("step #{index} ({label}) could not be launched\n  command: {command_line}")]
    Spawn {
        index: usize,
        label: String,
        command_line: String,
        #[source]
        source: ExecError,
    },

    #[error("failed to resolve {}", path.display())]
    ResolvePath {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create directory {}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write run report {}", path.display())]
    WriteReport {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PipelineError {
    /// Process exit code reported to the operator for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::ToolFailure {
                code: Some(code @ 1..=255),
                ..
            } => *code,
            PipelineError::ToolFailure { .. } => 1,
            PipelineError::Interrupted { .. } => EXIT_INTERRUPTED,
            PipelineError::PathNotFound { .. }
            | PipelineError::MissingArgument(_)
            | PipelineError::ConflictingSelection
            | PipelineError::UnknownPreset { .. }
            | PipelineError::InvalidIndex { .. } => EXIT_USAGE,
            PipelineError::Spawn { .. }
            | PipelineError::ResolvePath { .. }
            | PipelineError::CreateDir { .. }
            | PipelineError::WriteReport { .. } => 1,
        }
    }

    /// Whether this error ends the run as `Aborted` rather than `Failed`.
    pub fn is_interruption(&self) -> bool {
        matches!(self, PipelineError::Interrupted { .. })
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "termination by signal".to_string(),
    }
}
