use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Identifies one metric probe.
///
/// Each probe fills one or more fields of [`RepoMetrics`](super::RepoMetrics); a probe
/// failure is recorded against its `Metric` and leaves those fields at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    BranchSize,
    Contributors,
    CommitDistribution,
    Conflicts,
    MergeTime,
    Reviewers,
    Churn,
    IntegrationIssues,
    RevertRate,
    RollbackIssues,
    Workflow,
    ThreadDepth,
}

impl Metric {
    /// Short human description used in logs and reports.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::BranchSize => "branch size and file count",
            Self::Contributors => "unique contributors",
            Self::CommitDistribution => "commit distribution",
            Self::Conflicts => "merge conflicts",
            Self::MergeTime => "average merge time",
            Self::Reviewers => "reviewers per pull request",
            Self::Churn => "code churn",
            Self::IntegrationIssues => "integration issues",
            Self::RevertRate => "revert rate",
            Self::RollbackIssues => "rollback issues",
            Self::Workflow => "workflow runs",
            Self::ThreadDepth => "discussion thread depth",
        }
    }
}
