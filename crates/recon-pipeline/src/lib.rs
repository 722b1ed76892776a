//! COLMAP + OpenMVS reconstruction pipeline.
//!
//! A run is a fixed catalog of tool invocations ([`StepRegistry`]), a chosen
//! ordered subset of it ([`preset::select`]), `%name%` placeholders filled from
//! the [`RunConfig`], per-step passthrough overrides merged into the default
//! arguments, and an [`Executor`] that spawns the tools one after another and
//! stops at the first failure.

pub mod catalog;
pub mod config;
pub mod error;
pub mod executor;
pub mod passthrough;
pub mod placeholder;
pub mod plan;
pub mod preset;
pub mod report;
pub mod rules;
pub mod state;
pub mod telemetry;

pub use catalog::{STEP_COUNT, Step, StepRegistry, ToolPaths};
pub use config::{CameraModel, PipelineCliArgs, RunConfig, TelemetryOptions};
pub use error::{EXIT_INTERRUPTED, EXIT_USAGE, PipelineError};
pub use executor::{DryRunner, Execution, Executor};
pub use passthrough::{Passthrough, PassthroughOption};
pub use placeholder::Placeholders;
pub use plan::RunPlan;
pub use preset::Preset;
pub use report::{RunOutcome, RunReport, StepRecord};
pub use state::StepState;
pub use telemetry::{TelemetryGuard, enter_runtime};
