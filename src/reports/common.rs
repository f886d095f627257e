//! Field table and formatting shared by the report generators.

use crate::facts::{Metric, RepoMetrics, RepoReport};
use std::collections::BTreeMap;

/// Text shown in place of a value that could not be collected.
pub const ERROR_MARK: &str = "ERROR";

/// A scalar value of a metric record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Count(u64),
    Decimal(f64),
    Percent(f64),
    Megabytes(u64),
}

/// One scalar column of the report and the probe that produces it.
#[derive(Debug)]
pub struct Field {
    pub key: &'static str,
    pub label: &'static str,
    pub metric: Metric,
    pub extract: fn(&RepoMetrics) -> FieldValue,
}

/// Scalar fields in report order.
pub static FIELDS: &[Field] = &[
    Field {
        key: "branch_size_mb",
        label: "Branch size",
        metric: Metric::BranchSize,
        extract: |m| FieldValue::Megabytes(m.branch_size_bytes),
    },
    Field {
        key: "file_count",
        label: "Files on branch",
        metric: Metric::BranchSize,
        extract: |m| FieldValue::Count(m.file_count),
    },
    Field {
        key: "unique_contributors",
        label: "Unique contributors",
        metric: Metric::Contributors,
        extract: |m| FieldValue::Count(m.unique_contributors),
    },
    Field {
        key: "conflict_count",
        label: "Pull requests with merge conflicts",
        metric: Metric::Conflicts,
        extract: |m| FieldValue::Count(m.conflict_count),
    },
    Field {
        key: "conflict_rate",
        label: "Merge conflict rate",
        metric: Metric::Conflicts,
        extract: |m| FieldValue::Percent(m.conflict_rate),
    },
    Field {
        key: "avg_merge_time_days",
        label: "Average merge time (days)",
        metric: Metric::MergeTime,
        extract: |m| FieldValue::Decimal(m.avg_merge_time_days),
    },
    Field {
        key: "avg_reviewers_per_pr",
        label: "Average reviewers per pull request",
        metric: Metric::Reviewers,
        extract: |m| FieldValue::Decimal(m.avg_reviewers_per_pr),
    },
    Field {
        key: "cross_team_reviews",
        label: "Cross-team reviews",
        metric: Metric::Reviewers,
        extract: |m| FieldValue::Count(m.cross_team_reviews),
    },
    Field {
        key: "integration_issues",
        label: "Integration issues",
        metric: Metric::IntegrationIssues,
        extract: |m| FieldValue::Count(m.integration_issues),
    },
    Field {
        key: "revert_rate",
        label: "Revert rate",
        metric: Metric::RevertRate,
        extract: |m| FieldValue::Percent(m.revert_rate),
    },
    Field {
        key: "rollback_issues",
        label: "Rollback issues",
        metric: Metric::RollbackIssues,
        extract: |m| FieldValue::Count(m.rollback_issues),
    },
    Field {
        key: "workflow_runs",
        label: "Workflow runs",
        metric: Metric::Workflow,
        extract: |m| FieldValue::Count(m.workflow_runs),
    },
    Field {
        key: "workflow_failures",
        label: "Workflow failures",
        metric: Metric::Workflow,
        extract: |m| FieldValue::Count(m.workflow_failures),
    },
    Field {
        key: "successful_deploys",
        label: "Successful deploys on first attempt",
        metric: Metric::Workflow,
        extract: |m| FieldValue::Count(m.successful_deploys),
    },
    Field {
        key: "successful_reruns",
        label: "Successful reruns",
        metric: Metric::Workflow,
        extract: |m| FieldValue::Count(m.successful_reruns),
    },
    Field {
        key: "avg_run_attempts",
        label: "Average attempts per successful run",
        metric: Metric::Workflow,
        extract: |m| FieldValue::Decimal(m.avg_run_attempts),
    },
    Field {
        key: "avg_thread_depth",
        label: "Average comments per thread",
        metric: Metric::ThreadDepth,
        extract: |m| FieldValue::Decimal(m.avg_thread_depth),
    },
];

#[expect(clippy::cast_precision_loss, reason = "branch sizes are far below 2^52 bytes")]
pub fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

/// Format a field value for human readers.
pub fn format_value(value: FieldValue) -> String {
    match value {
        FieldValue::Count(n) => n.to_string(),
        FieldValue::Decimal(f) => format!("{f:.2}"),
        FieldValue::Percent(f) => format!("{f:.2}%"),
        FieldValue::Megabytes(bytes) => format!("{:.2} MB", megabytes(bytes)),
    }
}

/// Format a field value for machine-readable output, without units.
pub fn format_plain(value: FieldValue) -> String {
    match value {
        FieldValue::Count(n) => n.to_string(),
        FieldValue::Decimal(f) | FieldValue::Percent(f) => format!("{f:.2}"),
        FieldValue::Megabytes(bytes) => format!("{:.2}", megabytes(bytes)),
    }
}

/// The value of `field` for `repo`, or `None` when it could not be collected.
pub fn field_value(repo: &RepoReport, field: &Field) -> Option<FieldValue> {
    if repo.is_missing(field.metric) {
        None
    } else {
        Some((field.extract)(&repo.metrics))
    }
}

/// Entries of a count map with the highest counts first, ties by key.
pub fn top_entries(map: &BTreeMap<String, u64>, limit: usize) -> Vec<(&str, u64)> {
    let mut entries: Vec<_> = map.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries.truncate(limit);
    entries
}
