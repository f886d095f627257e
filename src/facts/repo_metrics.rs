use super::{Metric, RepoSpec, TimeWindow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Engineering-process metrics of one repository over the analysis window.
///
/// Every field starts at its zero value; a field stays there when the probe that
/// computes it fails.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoMetrics {
    pub unique_contributors: u64,

    /// Logins of everyone who authored a commit in the window, sorted.
    pub contributors: Vec<String>,

    /// Login to number of commits authored in the window.
    pub commit_distribution: BTreeMap<String, u64>,

    /// Percentage of pull requests that cannot be merged cleanly.
    pub conflict_rate: f64,
    pub conflict_count: u64,

    /// Mean time from creation to merge of merged pull requests, in days.
    pub avg_merge_time_days: f64,

    pub avg_reviewers_per_pr: f64,
    pub cross_team_reviews: u64,

    /// File path to number of commits touching it.
    pub churn_by_file: BTreeMap<String, u64>,

    /// Directory to number of file touches below it; `.` for the repository root.
    pub churn_by_dir: BTreeMap<String, u64>,

    pub integration_issues: u64,

    /// Percentage of commits whose message mentions a revert.
    pub revert_rate: f64,

    pub branch_size_bytes: u64,
    pub file_count: u64,

    pub successful_reruns: u64,
    pub rollback_issues: u64,
    pub workflow_failures: u64,
    pub successful_deploys: u64,

    /// Completed runs of the workflow in the window.
    pub workflow_runs: u64,

    /// Sum of attempts over successful runs.
    pub workflow_attempts: u64,
    pub avg_run_attempts: f64,

    pub avg_thread_depth: f64,
}

/// Outcome of collecting one repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoReport {
    pub area: String,
    pub repo: RepoSpec,
    pub metrics: RepoMetrics,

    /// Probes that produced no value, with the reason.
    pub failures: BTreeMap<Metric, String>,

    /// Set when no metric at all could be collected for the repository.
    pub error: Option<String>,
}

impl RepoReport {
    /// A record for a repository that could not be processed.
    #[must_use]
    pub fn failed(area: impl Into<String>, repo: RepoSpec, reason: impl Into<String>) -> Self {
        Self {
            area: area.into(),
            repo,
            metrics: RepoMetrics::default(),
            failures: BTreeMap::new(),
            error: Some(reason.into()),
        }
    }

    /// Whether the value(s) of `metric` are missing from this record.
    #[must_use]
    pub fn is_missing(&self, metric: Metric) -> bool {
        self.error.is_some() || self.failures.contains_key(&metric)
    }
}

/// Everything a run produced, ready to be rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub owner: String,
    pub branch: String,
    pub workflow: String,
    pub window: TimeWindow,
    pub generated_at: DateTime<Utc>,

    /// Browser address of the GitHub instance the repositories live on.
    pub web_url: String,

    /// Sorted by area, then by repository.
    pub repos: Vec<RepoReport>,
}

impl RunReport {
    /// Repositories grouped by area, in report order.
    pub fn by_area(&self) -> impl Iterator<Item = (&str, &[RepoReport])> {
        self.repos.chunk_by(|a, b| a.area == b.area).map(|chunk| (chunk[0].area.as_str(), chunk))
    }

    /// Number of repositories that failed entirely.
    #[must_use]
    pub fn failed_repos(&self) -> usize {
        self.repos.iter().filter(|r| r.error.is_some()).count()
    }
}
