use super::{ProbeContext, percentage};
use crate::Result;
use crate::facts::hosting::Commit;
use crate::facts::{ProviderResult, TimeWindow};
use futures::{TryStreamExt, future};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contributors {
    pub count: u64,

    /// Sorted, without duplicates.
    pub logins: Vec<String>,
}

/// Commits on the default branch authored inside the window.
///
/// The server filters by `since`/`until`; the author date is checked again here so the
/// window boundary is applied the same way everywhere.
pub(super) async fn commits_in_window(ctx: &ProbeContext<'_>) -> Result<Vec<Commit>> {
    let window = ctx.window;
    ctx.api
        .list_commits(ctx.repo, window)?
        .try_filter(|commit| future::ready(authored_in(window, commit)))
        .try_collect()
        .await
}

fn authored_in(window: &TimeWindow, commit: &Commit) -> bool {
    commit.commit.author.as_ref().is_none_or(|author| window.contains(author.date))
}

/// Login of the account that authored the commit, if GitHub could link one.
fn author_login(commit: &Commit) -> Option<&str> {
    commit.author.as_ref().map(|account| account.login.as_str())
}

pub async fn contributors(ctx: &ProbeContext<'_>) -> ProviderResult<Contributors> {
    commits_in_window(ctx).await.map(|commits| tally_contributors(&commits)).into()
}

pub async fn commit_distribution(ctx: &ProbeContext<'_>) -> ProviderResult<BTreeMap<String, u64>> {
    commits_in_window(ctx).await.map(|commits| tally_distribution(&commits)).into()
}

/// Percentage of commits in the window that revert an earlier change.
pub async fn revert_rate(ctx: &ProbeContext<'_>) -> ProviderResult<f64> {
    commits_in_window(ctx).await.map(|commits| tally_revert_rate(&commits)).into()
}

fn tally_contributors(commits: &[Commit]) -> Contributors {
    let logins: BTreeSet<&str> = commits.iter().filter_map(author_login).collect();

    Contributors {
        count: logins.len() as u64,
        logins: logins.into_iter().map(str::to_string).collect(),
    }
}

fn tally_distribution(commits: &[Commit]) -> BTreeMap<String, u64> {
    let mut distribution = BTreeMap::new();
    for login in commits.iter().filter_map(author_login) {
        *distribution.entry(login.to_string()).or_insert(0) += 1;
    }

    distribution
}

fn tally_revert_rate(commits: &[Commit]) -> f64 {
    let reverts = commits
        .iter()
        .filter(|commit| commit.commit.message.to_lowercase().contains("revert"))
        .count();

    percentage(reverts as u64, commits.len() as u64)
}
