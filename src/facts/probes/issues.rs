use super::{ProbeContext, resolved_in_window};
use crate::Result;
use crate::facts::hosting::Issue;
use crate::facts::{ProviderResult, TimeWindow};
use futures::{TryStreamExt, future};

/// Issues carrying the integration label that were opened and resolved inside the window.
pub async fn integration_issues(ctx: &ProbeContext<'_>) -> ProviderResult<u64> {
    count_integration_issues(ctx).await.into()
}

async fn count_integration_issues(ctx: &ProbeContext<'_>) -> Result<u64> {
    let window = ctx.window;
    ctx.api
        .list_issues(ctx.repo, window.start(), Some(&ctx.settings.integration_label))?
        .try_fold(0, |count, issue| future::ready(Ok(count + u64::from(resolved_in_window(window, &issue)))))
        .await
}

/// Issues with a rollback label that were closed inside the window.
pub async fn rollback_issues(ctx: &ProbeContext<'_>) -> ProviderResult<u64> {
    count_rollback_issues(ctx).await.into()
}

async fn count_rollback_issues(ctx: &ProbeContext<'_>) -> Result<u64> {
    let window = ctx.window;
    let label = ctx.settings.rollback_label.to_lowercase();
    ctx.api
        .list_issues(ctx.repo, window.start(), None)?
        .try_fold(0, |count, issue| {
            future::ready(Ok(count + u64::from(is_rollback(window, &label, &issue))))
        })
        .await
}

/// Matches any label whose name contains `label` (already lowercased), ignoring case.
fn is_rollback(window: &TimeWindow, label: &str, issue: &Issue) -> bool {
    !issue.is_pull_request()
        && issue.closed_at.is_some_and(|closed| window.contains(closed))
        && issue.labels.iter().any(|l| l.name.to_lowercase().contains(label))
}
