//! Metric collection from the hosting platform
//!
//! This module turns a set of repositories into per-repository metric records by
//! walking the GitHub REST API.
//!
//! # Implementation Model
//!
//! The work is layered, leaves first:
//! - [`hosting`]: the HTTP client, lazy paginated listings, and the rate governor that
//!   pauses callers when the API quota runs low
//! - [`probes`]: one async function per metric, each folding one or more listings into
//!   a value wrapped in a [`ProviderResult`]
//! - [`Collector`]: runs every probe of one repository concurrently and merges their
//!   results into a [`RepoReport`], recording failed probes instead of propagating them
//! - [`Fleet`]: spawns one task per repository under a global concurrency cap and
//!   gathers all records into a sorted [`RunReport`]

mod collector;
mod fleet;
pub mod hosting;
mod metric;
pub mod probes;
mod progress;
mod provider_result;
mod repo_metrics;
mod repo_spec;
mod throttler;
mod time_window;

pub use collector::Collector;
pub use fleet::Fleet;
pub use metric::Metric;
pub use progress::{NoProgress, Progress};
pub use provider_result::ProviderResult;
pub use repo_metrics::{RepoMetrics, RepoReport, RunReport};
pub use repo_spec::RepoSpec;
pub use throttler::{Permit, Throttler};
pub use time_window::TimeWindow;
