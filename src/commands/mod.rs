//! Command-line interface and orchestration for repo-pulse
//!
//! This module implements the CLI commands and wires configuration, metric collection
//! and report generation together.
//!
//! # Implementation Model
//!
//! ## Commands
//!
//! - **collect**: Load the configuration, resolve the analysis window, collect every
//!   configured repository and write the requested reports
//! - **init**: Write the default configuration file
//! - **validate**: Load a configuration file and check it
//!
//! ## Execution Flow
//!
//! The `run` function parses command-line arguments using clap and routes to the
//! matching handler. All output goes through the [`Host`] trait so commands can be
//! exercised in tests without touching the real process streams or exiting.
//!
//! Startup failures (missing token, invalid configuration) and report write failures
//! fail the command. Failures of individual repositories never do; they are listed in
//! the report instead.

mod collect;
mod common;
mod host;
mod init;
mod progress_reporter;
mod run;
mod validate;

pub use collect::{CollectArgs, collect_metrics};
pub use common::{ColorMode, LogLevel};
pub use host::Host;
pub use init::{InitArgs, init_config};
pub use progress_reporter::ProgressReporter;
pub use run::run;
pub use validate::{ValidateArgs, validate_config};
