//! # gentoo-update-core
//!
//! Core library for gentoo-update providing:
//! - Configuration loading (embedded defaults, system file, environment)
//! - Line matching and `emerge` pretend listing parsing
//! - The sync / confirm / apply upgrade workflow
//! - Startup checks, distfile cleanup and the kernel helper

pub mod config;
pub mod distfiles;
pub mod error;
pub mod identity;
pub mod kernel;
pub mod matcher;
pub mod missed;
pub mod patterns;
pub mod plan;
pub mod preflight;
pub mod prompt;
pub mod runner;
pub mod workflow;

pub use config::{AppConfig, ExternalCommand, HierarchicalConfigLoader, Settings};
pub use error::{Error, Result};
pub use identity::{ProgramIdentity, Revision};
pub use plan::{parse_plan, PlanParser, RawOutput, UpdatePlan};
pub use runner::{CapturedOutput, CommandRunner, CommandStatus, SystemRunner};
pub use workflow::{Orchestrator, Phase, WorkflowOutcome};
