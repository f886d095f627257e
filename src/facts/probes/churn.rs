use super::commits::commits_in_window;
use super::{ProbeContext, fan_out};
use crate::Result;
use crate::facts::ProviderResult;
use ohno::app_err;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Churn {
    pub by_file: BTreeMap<String, u64>,
    pub by_dir: BTreeMap<String, u64>,
}

/// How often each file and directory was touched by commits in the window.
pub async fn churn(ctx: &ProbeContext<'_>) -> ProviderResult<Churn> {
    measure(ctx).await.map(|by_file| Churn {
        by_dir: churn_by_dir(&by_file),
        by_file,
    })
    .into()
}

async fn measure(ctx: &ProbeContext<'_>) -> Result<BTreeMap<String, u64>> {
    let commits = commits_in_window(ctx).await?;

    let details = fan_out(commits, ctx.settings.max_concurrent_details, |commit| async move {
        ctx.api
            .commit_detail(ctx.repo, &commit.sha)
            .await?
            .ok_or_else(|| app_err!("commit {} not found", commit.sha))
    })
    .await;

    // Any failed detail fails the whole probe
    let mut by_file = BTreeMap::new();
    for detail in details {
        for file in detail?.files {
            *by_file.entry(file.filename).or_insert(0) += 1;
        }
    }

    Ok(by_file)
}

/// Fold per-file churn into per-directory churn.
///
/// Files at the repository root are attributed to `.`. The totals of both maps are equal.
#[must_use]
pub fn churn_by_dir(by_file: &BTreeMap<String, u64>) -> BTreeMap<String, u64> {
    let mut by_dir = BTreeMap::new();
    for (path, count) in by_file {
        let dir = path.rsplit_once('/').map_or(".", |(dir, _)| dir);
        *by_dir.entry(dir.to_string()).or_insert(0) += count;
    }

    by_dir
}
