//! Sequential, fail-fast execution of a [`RunPlan`].
//!
//! Steps run one at a time in selection order. The first step that fails,
//! cannot be launched or is interrupted ends the run; later steps are never
//! entered. Nothing is retried.

use std::time::Instant;

use tool_exec::{CancelToken, ExecError, Invocation, ToolExit, ToolRunner};
use tracing::{debug, error, info, info_span, warn};

use crate::{
    error::PipelineError, placeholder::unresolved, plan::RunPlan, report::StepRecord,
    state::StepState,
};

/// Records of every entered step plus the overall result.
#[derive(Debug)]
pub struct Execution {
    pub records: Vec<StepRecord>,
    pub result: Result<(), PipelineError>,
}

impl Execution {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

pub struct Executor<R> {
    runner: R,
    cancel: CancelToken,
}

impl<R: ToolRunner> Executor<R> {
    pub fn new(runner: R, cancel: CancelToken) -> Self {
        Self { runner, cancel }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn run(&mut self, plan: &RunPlan) -> Execution {
        let mut records = Vec::new();
        let result = plan
            .selection()
            .iter()
            .try_for_each(|&index| self.run_step(plan, index, &mut records));
        Execution { records, result }
    }

    fn run_step(
        &mut self,
        plan: &RunPlan,
        index: usize,
        records: &mut Vec<StepRecord>,
    ) -> Result<(), PipelineError> {
        let (step, invocation) = plan.invocation(index)?;
        let command_line = invocation.command_line();

        if self.cancel.is_cancelled() {
            return Err(PipelineError::Interrupted {
                index,
                label: step.label.to_string(),
                command_line,
            });
        }

        let span = info_span!("pipeline.step", index, label = step.label);
        let _entered = span.enter();

        info!("#{index}. {}", step.label);
        let leftovers = unresolved(&invocation.args);
        if !leftovers.is_empty() {
            warn!(
                "unresolved placeholders passed through verbatim: {}",
                leftovers.join(", ")
            );
        }
        info!("Cmd: {command_line}");

        let started = Instant::now();
        let outcome = self.runner.run(&invocation, &self.cancel);
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let mut record = StepRecord {
            index,
            label: step.label.to_string(),
            command_line: command_line.clone(),
            state: StepState::Running,
            exit_code: None,
            duration_ms,
        };

        let exit = match outcome {
            Ok(exit) => exit,
            Err(source) => {
                record.state = StepState::Failed;
                records.push(record);
                error!("#{index}. {} could not be launched", step.label);
                return Err(PipelineError::Spawn {
                    index,
                    label: step.label.to_string(),
                    command_line,
                    source,
                });
            }
        };

        record.state = StepState::after(exit);
        if let ToolExit::Failed { code } = exit {
            record.exit_code = code;
        }
        records.push(record);

        match exit {
            ToolExit::Success => {
                debug!("#{index}. {} finished in {duration_ms} ms", step.label);
                Ok(())
            }
            ToolExit::Failed { code } => {
                error!("#{index}. {} failed", step.label);
                Err(PipelineError::ToolFailure {
                    index,
                    label: step.label.to_string(),
                    command_line,
                    code,
                })
            }
            ToolExit::Interrupted => {
                warn!("#{index}. {} interrupted", step.label);
                Err(PipelineError::Interrupted {
                    index,
                    label: step.label.to_string(),
                    command_line,
                })
            }
        }
    }
}

/// Reports success for every step without spawning anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct DryRunner;

impl ToolRunner for DryRunner {
    fn run(
        &mut self,
        _invocation: &Invocation,
        cancel: &CancelToken,
    ) -> Result<ToolExit, ExecError> {
        if cancel.is_cancelled() {
            return Ok(ToolExit::Interrupted);
        }
        Ok(ToolExit::Success)
    }
}
