//! Cross-step consistency rules evaluated once against the selected steps.

use tracing::debug;

use crate::catalog::{REFINE_MESH_STEP, Step, TEXTURE_MESH_STEP};

/// Rewrite `from` to `to` in the default arguments of `step` whenever
/// `requires` does not run before it in the selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepRewrite {
    pub step: usize,
    pub requires: usize,
    pub from: &'static str,
    pub to: &'static str,
}

/// Texturing reads the refined mesh only when refinement runs first;
/// otherwise it textures the reconstructed mesh directly.
pub const TEXTURE_WITHOUT_REFINE: StepRewrite = StepRewrite {
    step: TEXTURE_MESH_STEP,
    requires: REFINE_MESH_STEP,
    from: "scene_dense_mesh_refine.mvs",
    to: "scene_dense_mesh.mvs",
};

pub const DEFAULT_RULES: &[StepRewrite] = &[TEXTURE_WITHOUT_REFINE];

impl StepRewrite {
    /// Whether this rule fires for `selection`.
    pub fn applies(&self, selection: &[usize]) -> bool {
        let Some(position) = selection.iter().position(|&index| index == self.step) else {
            return false;
        };
        !selection[..position].contains(&self.requires)
    }

    fn rewrite(&self, args: &[String]) -> Vec<String> {
        args.iter().map(|arg| arg.replace(self.from, self.to)).collect()
    }
}

/// Apply every rule that fires for `selection`, returning new steps.
pub fn apply(steps: Vec<Step>, selection: &[usize], rules: &[StepRewrite]) -> Vec<Step> {
    let mut steps = steps;
    for rule in rules.iter().filter(|rule| rule.applies(selection)) {
        if let Some(step) = steps.get_mut(rule.step) {
            debug!(
                "Step {} runs without step {}; using {} instead of {}",
                rule.step, rule.requires, rule.to, rule.from
            );
            step.args = rule.rewrite(&step.args);
        }
    }
    steps
}
