//! repo-pulse crate
//!
//! This crate is an implementation detail of the `repo-pulse` tool. It polls the GitHub REST API to compute
//! engineering-process metrics for a fleet of repositories grouped by area, and renders them as reports.
//!
//! # Module Organization
//!
//! - [`commands`]: Command-line interface and orchestration
//! - [`config`]: Configuration file loading and validation
//! - [`facts`]: Metric collection from the hosting platform
//! - [`reports`]: Report generation in multiple formats
//!
//! This crate's API is fluid and may change without warning and in a semver-incompatible way.

/// Result type alias using `ohno::AppError` as the default error type.
pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

#[doc(hidden)]
pub mod commands;

#[doc(hidden)]
pub mod config;

#[doc(hidden)]
pub mod facts;

#[doc(hidden)]
pub mod reports;

pub use crate::commands::{Host, run};
