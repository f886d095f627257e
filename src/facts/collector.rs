use super::hosting::GitHub;
use super::probes::{self, ProbeContext, ProbeSettings};
use super::{Metric, ProviderResult, RepoMetrics, RepoReport, RepoSpec, TimeWindow};
use std::collections::BTreeMap;
use strum::IntoEnumIterator;

const LOG_TARGET: &str = " collector";

/// Collects every metric of one repository.
#[derive(Debug)]
pub struct Collector {
    api: GitHub,
    window: TimeWindow,
    settings: ProbeSettings,
}

impl Collector {
    #[must_use]
    pub const fn new(api: GitHub, window: TimeWindow, settings: ProbeSettings) -> Self {
        Self { api, window, settings }
    }

    #[must_use]
    pub const fn api(&self) -> &GitHub {
        &self.api
    }

    #[must_use]
    pub const fn window(&self) -> &TimeWindow {
        &self.window
    }

    #[must_use]
    pub const fn settings(&self) -> &ProbeSettings {
        &self.settings
    }

    /// Produce the record of one repository.
    ///
    /// An inaccessible repository yields a record with `error` set. Otherwise all probes run
    /// concurrently to completion; a failed probe leaves its fields at zero and is listed in
    /// the record's `failures`.
    pub async fn collect(&self, area: &str, repo: RepoSpec) -> RepoReport {
        match self.api.repository(&repo).await {
            Ok(Some(found)) => {
                if found.archived {
                    log::warn!(target: LOG_TARGET, "Repository '{}' is archived, its metrics reflect past activity", found.full_name);
                }
            }
            Ok(None) => {
                log::warn!(target: LOG_TARGET, "Repository '{repo}' not found or not accessible, skipping");
                return RepoReport::failed(area, repo, "repository not found or not accessible");
            }
            Err(e) => {
                log::error!(target: LOG_TARGET, "Could not look up repository '{repo}': {e:#}");
                return RepoReport::failed(area, repo, format!("{e:#}"));
            }
        }

        log::info!(target: LOG_TARGET, "Collecting metrics for repository '{repo}'");

        let ctx = ProbeContext {
            api: &self.api,
            repo: &repo,
            window: &self.window,
            settings: &self.settings,
        };

        let (branch, contributors, distribution, conflicts, merge_time, reviewers, churn, integration, revert, rollback, workflow, threads) = tokio::join!(
            probes::branch_size(&ctx),
            probes::contributors(&ctx),
            probes::commit_distribution(&ctx),
            probes::conflicts(&ctx),
            probes::merge_time(&ctx),
            probes::reviewers(&ctx),
            probes::churn(&ctx),
            probes::integration_issues(&ctx),
            probes::revert_rate(&ctx),
            probes::rollback_issues(&ctx),
            probes::workflow(&ctx),
            probes::thread_depth(&ctx),
        );

        let mut metrics = RepoMetrics::default();
        let mut failures = BTreeMap::new();

        macro_rules! merge {
            ($result:expr, $metric:expr, |$value:ident| $apply:expr) => {
                match $result {
                    ProviderResult::Found($value) => $apply,
                    other => {
                        let reason = other.failure_reason().unwrap_or_default();
                        if matches!(other, ProviderResult::Unavailable(_)) {
                            log::warn!(target: LOG_TARGET, "No {} for '{repo}': {reason}", $metric.description());
                        } else {
                            log::error!(target: LOG_TARGET, "Could not compute {} for '{repo}': {reason}", $metric.description());
                        }
                        let _ = failures.insert($metric, reason);
                    }
                }
            };
        }

        merge!(branch, Metric::BranchSize, |size| {
            metrics.branch_size_bytes = size.bytes;
            metrics.file_count = size.files;
        });
        merge!(contributors, Metric::Contributors, |c| {
            metrics.unique_contributors = c.count;
            metrics.contributors = c.logins;
        });
        merge!(distribution, Metric::CommitDistribution, |d| metrics.commit_distribution = d);
        merge!(conflicts, Metric::Conflicts, |c| {
            metrics.conflict_count = c.count;
            metrics.conflict_rate = c.rate;
        });
        merge!(merge_time, Metric::MergeTime, |days| metrics.avg_merge_time_days = days);
        merge!(reviewers, Metric::Reviewers, |r| {
            metrics.avg_reviewers_per_pr = r.average;
            metrics.cross_team_reviews = r.cross_team;
        });
        merge!(churn, Metric::Churn, |c| {
            metrics.churn_by_file = c.by_file;
            metrics.churn_by_dir = c.by_dir;
        });
        merge!(integration, Metric::IntegrationIssues, |n| metrics.integration_issues = n);
        merge!(revert, Metric::RevertRate, |rate| metrics.revert_rate = rate);
        merge!(rollback, Metric::RollbackIssues, |n| metrics.rollback_issues = n);
        merge!(workflow, Metric::Workflow, |w| {
            metrics.workflow_failures = w.failures;
            metrics.successful_deploys = w.deploys;
            metrics.successful_reruns = w.reruns;
            metrics.workflow_runs = w.runs;
            metrics.workflow_attempts = w.attempts;
            metrics.avg_run_attempts = w.avg_attempts;
        });
        merge!(threads, Metric::ThreadDepth, |depth| metrics.avg_thread_depth = depth);

        log::debug!(
            target: LOG_TARGET,
            "Finished repository '{repo}' with {} of {} probes failed",
            failures.len(),
            Metric::iter().count()
        );

        RepoReport {
            area: area.to_string(),
            repo,
            metrics,
            failures,
            error: None,
        }
    }
}
