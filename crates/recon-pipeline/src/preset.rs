//! Named step selections and the selector that picks the run's step list.

use std::{fmt, str::FromStr};

use crate::error::PipelineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Preset {
    /// Every step through texturing.
    Sequential,
    /// Everything, including disparity-map estimation and fusion.
    Full,
    /// Like `Sequential` without bundle adjustment.
    NoBundleAdjustment,
}

/// Preset used when neither steps nor a preset are given.
pub const DEFAULT_PRESET: Preset = Preset::NoBundleAdjustment;

impl Preset {
    pub const ALL: [Preset; 3] = [
        Preset::Sequential,
        Preset::Full,
        Preset::NoBundleAdjustment,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Sequential => "SEQUENTIAL",
            Preset::Full => "FULL",
            Preset::NoBundleAdjustment => "NOBA",
        }
    }

    pub fn steps(self) -> &'static [usize] {
        match self {
            Preset::Sequential => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10],
            Preset::Full => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12],
            Preset::NoBundleAdjustment => &[0, 1, 2, 4, 5, 6, 7, 8, 9, 10],
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|preset| preset.name()).collect()
    }

    /// `NAME = [..]` lines for help output.
    pub fn describe_all() -> String {
        Self::ALL
            .iter()
            .map(|preset| format!("{} = {:?}", preset.name(), preset.steps()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = PipelineError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.name() == name)
            .ok_or_else(|| PipelineError::UnknownPreset {
                name: name.to_string(),
                valid: Self::names(),
            })
    }
}

/// Decide the ordered step list for a run.
///
/// Explicit steps are returned verbatim, duplicates and out-of-range indices
/// included; bounds are checked when each step is about to run.
pub fn select(
    explicit_steps: Option<&[usize]>,
    preset_name: Option<&str>,
) -> Result<Vec<usize>, PipelineError> {
    match (explicit_steps, preset_name) {
        (Some(_), Some(_)) => Err(PipelineError::ConflictingSelection),
        (None, Some(name)) => Ok(name.parse::<Preset>()?.steps().to_vec()),
        (Some(steps), None) => Ok(steps.to_vec()),
        (None, None) => Ok(DEFAULT_PRESET.steps().to_vec()),
    }
}
