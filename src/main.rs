//! Engineering-process metrics for a fleet of GitHub repositories.
//!
//! `repo-pulse` walks the pull requests, issues, commits, workflow runs and git trees of every
//! repository listed in its configuration and reports, per repository and over a fixed time window:
//!
//! - branch size and file count of the default branch
//! - unique contributors and commit distribution
//! - merge-conflict rate, average merge time and reviewers per pull request
//! - churn by file and by directory
//! - integration and rollback issues, revert rate
//! - workflow failures, first-try deploys and successful reruns
//! - average discussion thread depth
//!
//! # Quick Start
//!
//! ```bash
//! repo-pulse init
//! export GITHUB_TOKEN=...
//! repo-pulse collect --markdown output.md --json output.json
//! ```
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use repo_pulse::{Host, run};
use std::io::Write;
use std::io::{stderr, stdout};

/// Default host that talks to the real process environment.
#[derive(Debug, Clone, Default)]
pub struct RealHost;

#[cfg_attr(coverage_nightly, coverage(off))]
impl Host for RealHost {
    fn output(&mut self) -> impl Write {
        stdout()
    }

    fn error(&mut self) -> impl Write {
        stderr()
    }

    fn exit(&mut self, code: i32) {
        std::process::exit(code);
    }
}

#[tokio::main]
#[cfg_attr(coverage_nightly, coverage(off))]
async fn main() -> Result<(), ohno::AppError> {
    run(&mut RealHost, std::env::args()).await
}
