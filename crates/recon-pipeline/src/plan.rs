//! Per-run view of the catalog: placeholders resolved, dependency rules
//! applied, passthrough overrides ready to merge.
//!
//! The registry handed in is never modified; every run derives its own steps.

use tool_exec::Invocation;

use crate::{
    catalog::{Step, StepRegistry},
    config::RunConfig,
    error::PipelineError,
    passthrough::{Passthrough, merge},
    placeholder::Placeholders,
    rules::{self, DEFAULT_RULES},
};

#[derive(Clone, Debug)]
pub struct RunPlan {
    steps: StepRegistry,
    selection: Vec<usize>,
    passthrough: Passthrough,
}

impl RunPlan {
    pub fn new(registry: &StepRegistry, config: &RunConfig) -> Self {
        Self::build(
            registry,
            &Placeholders::from_config(config),
            config.steps.clone(),
            config.passthrough.clone(),
        )
    }

    /// Derive a plan from explicit parts.
    pub fn build(
        registry: &StepRegistry,
        placeholders: &Placeholders,
        selection: Vec<usize>,
        passthrough: Passthrough,
    ) -> Self {
        let resolved = placeholders.resolve(registry.steps());
        let steps = rules::apply(resolved, &selection, DEFAULT_RULES);
        Self {
            steps: StepRegistry::from_steps(steps),
            selection,
            passthrough,
        }
    }

    /// Step indices in execution order, unchecked.
    pub fn selection(&self) -> &[usize] {
        &self.selection
    }

    pub fn step(&self, index: usize) -> Result<&Step, PipelineError> {
        self.steps.get(index)
    }

    /// Final command for `index`: resolved defaults merged with the overrides.
    pub fn invocation(&self, index: usize) -> Result<(&Step, Invocation), PipelineError> {
        let step = self.steps.get(index)?;
        let args = merge(&step.args, self.passthrough.for_step(index));
        Ok((step, Invocation::new(step.command.clone(), args)))
    }

    /// Invocations for the whole selection, stopping at the first bad index.
    pub fn invocations(&self) -> Result<Vec<Invocation>, PipelineError> {
        self.selection
            .iter()
            .map(|&index| self.invocation(index).map(|(_, invocation)| invocation))
            .collect()
    }
}
