//! Per-step option overrides forwarded to the external tools.
//!
//! Operators pass options without leading dashes, grouped under a flag named
//! after the step index: `--9 resolution-level 2 cuda-device 0`. Names of one
//! character become `-n`, longer names become `--name`. An override replaces
//! the step's default option of the same name and is appended after the
//! surviving defaults.

use std::collections::BTreeMap;

use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::warn;

/// Help heading under which the per-step flags are listed.
pub const HELP_HEADING: &str = "Passthrough";

/// A single option forwarded to a step's command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PassthroughOption {
    /// Canonical flag, dashes included.
    pub flag: String,
    /// `None` only for a trailing name given without a value.
    pub value: Option<String>,
}

impl PassthroughOption {
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            flag: canonical_flag(name),
            value: Some(value.into()),
        }
    }

    fn push_tokens(&self, args: &mut Vec<String>) {
        args.push(self.flag.clone());
        if let Some(value) = &self.value {
            args.push(value.clone());
        }
    }
}

/// Prefix an option name with `-` (single character) or `--` (longer).
pub fn canonical_flag(name: &str) -> String {
    if name.chars().count() < 2 {
        format!("-{name}")
    } else {
        format!("--{name}")
    }
}

/// Pair a flat `name value name value ..` token list into options.
pub fn parse_tokens<S: AsRef<str>>(tokens: &[S]) -> Vec<PassthroughOption> {
    tokens
        .chunks(2)
        .map(|pair| PassthroughOption {
            flag: canonical_flag(pair[0].as_ref()),
            value: pair.get(1).map(|value| value.as_ref().to_string()),
        })
        .collect()
}

/// Overrides for every step, keyed by step index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Passthrough {
    by_step: BTreeMap<usize, Vec<PassthroughOption>>,
}

impl Passthrough {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append overrides parsed from a flat token list to `step`.
    pub fn extend_tokens<S: AsRef<str>>(&mut self, step: usize, tokens: &[S]) {
        let options = parse_tokens(tokens);
        if let Some(last) = options.last().filter(|option| option.value.is_none()) {
            warn!(
                "Passthrough option {} for step {step} has no value; forwarding it alone",
                last.flag
            );
        }
        if !options.is_empty() {
            self.by_step.entry(step).or_default().extend(options);
        }
    }

    pub fn with_tokens<S: AsRef<str>>(mut self, step: usize, tokens: &[S]) -> Self {
        self.extend_tokens(step, tokens);
        self
    }

    pub fn for_step(&self, step: usize) -> &[PassthroughOption] {
        self.by_step.get(&step).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.by_step.is_empty()
    }

    /// Add one `--<index>` flag per step to `command`.
    pub fn augment_command(command: Command, labels: &[&str]) -> Command {
        labels
            .iter()
            .enumerate()
            .fold(command, |command, (index, label)| {
                command.arg(
                    Arg::new(arg_id(index))
                        .long(index.to_string())
                        .value_name("OPTION VALUE")
                        .num_args(1..)
                        .allow_negative_numbers(true)
                        .action(ArgAction::Append)
                        .value_parser(clap::value_parser!(String))
                        .help_heading(HELP_HEADING)
                        .help(format!("Options forwarded to step {index} ({label})")),
                )
            })
    }

    /// Collect the flags added by [`Passthrough::augment_command`].
    pub fn from_matches(matches: &ArgMatches, step_count: usize) -> Self {
        let mut passthrough = Self::new();
        for index in 0..step_count {
            let id = arg_id(index);
            let tokens: Vec<&String> = matches
                .try_get_many::<String>(&id)
                .ok()
                .flatten()
                .map(|values| values.collect())
                .unwrap_or_default();
            passthrough.extend_tokens(index, tokens.as_slice());
        }
        passthrough
    }
}

fn arg_id(index: usize) -> String {
    format!("passthrough-{index}")
}

/// Final argument list for a step: surviving defaults, then the overrides.
///
/// For each override the first default option with the same flag is removed
/// together with the value that follows it. A default written as
/// `--flag=value` is removed as a single token.
pub fn merge(defaults: &[String], overrides: &[PassthroughOption]) -> Vec<String> {
    let mut args = defaults.to_vec();
    for option in overrides {
        let inline_prefix = format!("{}=", option.flag);
        if let Some(position) = args
            .iter()
            .position(|arg| is_option_token(arg) && *arg == option.flag)
        {
            let end = (position + 2).min(args.len());
            args.drain(position..end);
        } else if let Some(position) = args.iter().position(|arg| arg.starts_with(&inline_prefix)) {
            args.remove(position);
        }
    }
    for option in overrides {
        option.push_tokens(&mut args);
    }
    args
}

/// Whether `token` looks like an option rather than a value such as `-1`.
fn is_option_token(token: &str) -> bool {
    let name = token.trim_start_matches('-');
    token.starts_with('-') && !name.is_empty() && !name.starts_with(|c: char| c.is_ascii_digit())
}
