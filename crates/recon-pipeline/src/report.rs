//! JSON summary of a run, written whether the run succeeded or not.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{config::RunConfig, error::PipelineError, state::StepState};

/// What happened to one entered step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub index: usize,
    pub label: String,
    pub command_line: String,
    pub state: StepState,
    /// Tool exit code; absent on success, signal termination or launch failure.
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    Succeeded,
    Failed,
    Aborted,
}

impl RunOutcome {
    pub fn from_result(result: &Result<(), PipelineError>) -> Self {
        match result {
            Ok(()) => RunOutcome::Succeeded,
            Err(err) if err.is_interruption() => RunOutcome::Aborted,
            Err(_) => RunOutcome::Failed,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub selection: Vec<usize>,
    pub dry_run: bool,
    pub outcome: RunOutcome,
    /// Rendered error when the run did not succeed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub steps: Vec<StepRecord>,
}

impl RunReport {
    pub fn new(
        config: &RunConfig,
        started_at: DateTime<Utc>,
        records: Vec<StepRecord>,
        result: &Result<(), PipelineError>,
    ) -> Self {
        Self {
            started_at,
            finished_at: Utc::now(),
            input_dir: config.input_dir.clone(),
            output_dir: config.output_dir.clone(),
            selection: config.steps.clone(),
            dry_run: config.dry_run,
            outcome: RunOutcome::from_result(result),
            error: result.as_ref().err().map(ToString::to_string),
            steps: records,
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<(), PipelineError> {
        let write_error = |source: io::Error| PipelineError::WriteReport {
            path: path.to_path_buf(),
            source,
        };
        let mut bytes =
            serde_json::to_vec_pretty(self).map_err(|err| write_error(io::Error::from(err)))?;
        bytes.push(b'\n');
        fs::write(path, bytes).map_err(write_error)
    }
}
