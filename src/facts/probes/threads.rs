use super::pulls::prs_in_window;
use super::{ProbeContext, average, count_items, fan_out, resolved_in_window};
use crate::Result;
use crate::facts::ProviderResult;
use futures::{TryStreamExt, future};

#[derive(Debug, Clone, Copy)]
enum Thread {
    Issue(u64),
    PullRequest(u64),
}

/// Mean number of comments per discussion thread started in the window.
///
/// Threads are the resolved issues and the pull requests created in the window.
pub async fn thread_depth(ctx: &ProbeContext<'_>) -> ProviderResult<f64> {
    measure(ctx).await.into()
}

async fn measure(ctx: &ProbeContext<'_>) -> Result<f64> {
    let window = ctx.window;
    let mut threads: Vec<Thread> = ctx
        .api
        .list_issues(ctx.repo, window.start(), None)?
        .try_filter(|issue| future::ready(resolved_in_window(window, issue)))
        .map_ok(|issue| Thread::Issue(issue.number))
        .try_collect()
        .await?;

    threads.extend(prs_in_window(ctx).await?.into_iter().map(|pr| Thread::PullRequest(pr.number)));

    let counts = fan_out(threads.iter().copied(), ctx.settings.max_concurrent_details, |thread| async move {
        match thread {
            Thread::Issue(number) => count_items(ctx.api.list_issue_comments(ctx.repo, number)?).await,
            Thread::PullRequest(number) => count_items(ctx.api.list_pull_request_comments(ctx.repo, number)?).await,
        }
    })
    .await;

    let mut total = 0;
    for count in counts {
        total += count?;
    }

    Ok(depth(total, threads.len() as u64))
}

#[expect(clippy::cast_precision_loss, reason = "counts are far below 2^52")]
fn depth(comments: u64, threads: u64) -> f64 {
    average(comments as f64, threads)
}
