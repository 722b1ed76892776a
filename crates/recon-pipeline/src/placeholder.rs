//! `%name%` substitution in step arguments.
//!
//! Substitution is permissive: a placeholder with no known value stays in the
//! token verbatim. [`unresolved`] reports leftovers so the executor can warn
//! about them before spawning.

use crate::{catalog::Step, config::RunConfig};

/// Known placeholder names and their resolved values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Placeholders {
    values: Vec<(&'static str, String)>,
}

impl Placeholders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `%name%` with `value`; a repeated name replaces the earlier value.
    pub fn with(mut self, name: &'static str, value: impl Into<String>) -> Self {
        let value = value.into();
        match self.values.iter_mut().find(|(known, _)| *known == name) {
            Some(entry) => entry.1 = value,
            None => self.values.push((name, value)),
        }
        self
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self::new()
            .with("input_dir", config.input_dir.display().to_string())
            .with("output_dir", config.output_dir.display().to_string())
            .with("sparse_dir", config.sparse_dir.display().to_string())
            .with("dense_dir", config.dense_dir.display().to_string())
            .with("mvs_dir", config.mvs_dir.display().to_string())
            .with("camera_model", config.camera_model.as_str())
            .with("colored_points", if config.colored_points { "1" } else { "0" })
            .with("empty_color", config.empty_color.to_string())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(known, _)| *known == name)
            .map(|(_, value)| value.as_str())
    }

    /// Replace every occurrence of every known placeholder in `token`.
    pub fn substitute(&self, token: &str) -> String {
        let mut resolved = token.to_string();
        for (name, value) in &self.values {
            let pattern = format!("%{name}%");
            if resolved.contains(&pattern) {
                resolved = resolved.replace(&pattern, value);
            }
        }
        resolved
    }

    /// Substituted copies of `steps`; the input is left untouched.
    pub fn resolve(&self, steps: &[Step]) -> Vec<Step> {
        steps
            .iter()
            .map(|step| Step {
                args: step.args.iter().map(|arg| self.substitute(arg)).collect(),
                ..step.clone()
            })
            .collect()
    }
}

/// Placeholder names still present in `args`, in order of appearance.
pub fn unresolved(args: &[String]) -> Vec<String> {
    let mut names = Vec::new();
    for arg in args {
        let mut rest = arg.as_str();
        while let Some(start) = rest.find('%') {
            let tail = &rest[start + 1..];
            let Some(end) = tail.find('%') else {
                break;
            };
            let name = &tail[..end];
            if is_placeholder_name(name) {
                names.push(name.to_string());
                rest = &tail[end + 1..];
            } else {
                rest = tail;
            }
        }
    }
    names
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}
