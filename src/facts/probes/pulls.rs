use super::{ProbeContext, average, fan_out, percentage};
use crate::Result;
use crate::facts::hosting::PullRequest;
use crate::facts::{ProviderResult, TimeWindow};
use core::pin::pin;
use futures::{Stream, TryStreamExt, future};
use ohno::app_err;
use std::collections::BTreeSet;

const LOG_TARGET: &str = "     pulls";
const HOURS_PER_DAY: f64 = 24.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Conflicts {
    pub count: u64,

    /// Percentage of pull requests in the window that are not mergeable.
    pub rate: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Reviewers {
    pub average: f64,

    /// Always zero: there is no mapping from reviewer accounts to teams.
    pub cross_team: u64,
}

/// Pull requests created inside the window.
pub(super) async fn prs_in_window(ctx: &ProbeContext<'_>) -> Result<Vec<PullRequest>> {
    collect_newest_first(ctx.api.list_pull_requests(ctx.repo)?, ctx.window).await
}

/// Collect the items of a newest-first listing that were created in the window.
///
/// The walk stops at the first item created before the window, so older pages are never fetched.
async fn collect_newest_first(listing: impl Stream<Item = Result<PullRequest>>, window: &TimeWindow) -> Result<Vec<PullRequest>> {
    let mut listing = pin!(listing);
    let mut prs = Vec::new();

    while let Some(pr) = listing.try_next().await? {
        if pr.created_at < window.start() {
            break;
        }

        if window.contains(pr.created_at) {
            prs.push(pr);
        }
    }

    Ok(prs)
}

/// Number and percentage of pull requests in the window that have merge conflicts.
pub async fn conflicts(ctx: &ProbeContext<'_>) -> ProviderResult<Conflicts> {
    measure_conflicts(ctx).await.into()
}

async fn measure_conflicts(ctx: &ProbeContext<'_>) -> Result<Conflicts> {
    let prs = prs_in_window(ctx).await?;

    let mergeable = fan_out(prs, ctx.settings.max_concurrent_details, |pr| async move {
        let detail = ctx
            .api
            .pull_request_detail(ctx.repo, pr.number)
            .await?
            .ok_or_else(|| app_err!("pull request #{} not found", pr.number))?;
        Ok::<_, ohno::AppError>(detail.mergeable)
    })
    .await
    .into_iter()
    .collect::<Result<Vec<_>>>()?;

    Ok(tally_conflicts(&mergeable))
}

/// Only an explicit `false` counts; mergeability still being computed does not.
fn tally_conflicts(mergeable: &[Option<bool>]) -> Conflicts {
    let count = mergeable.iter().filter(|m| **m == Some(false)).count() as u64;

    Conflicts {
        count,
        rate: percentage(count, mergeable.len() as u64),
    }
}

/// Mean days from creation to merge over the merged pull requests created in the window.
pub async fn merge_time(ctx: &ProbeContext<'_>) -> ProviderResult<f64> {
    prs_in_window(ctx).await.map(|prs| average_merge_days(&prs)).into()
}

#[expect(clippy::cast_precision_loss, reason = "durations in seconds are far below 2^52")]
fn average_merge_days(prs: &[PullRequest]) -> f64 {
    let merge_hours: Vec<f64> = prs
        .iter()
        .filter_map(|pr| pr.merged_at.map(|merged| (merged - pr.created_at).num_seconds() as f64 / 3600.0))
        .collect();

    average(merge_hours.iter().sum::<f64>() / HOURS_PER_DAY, merge_hours.len() as u64)
}

/// Mean number of distinct reviewers per pull request created in the window.
///
/// Pull requests whose reviews cannot be listed are left out of the average.
pub async fn reviewers(ctx: &ProbeContext<'_>) -> ProviderResult<Reviewers> {
    measure_reviewers(ctx).await.into()
}

async fn measure_reviewers(ctx: &ProbeContext<'_>) -> Result<Reviewers> {
    let prs = prs_in_window(ctx).await?;

    let results = fan_out(prs, ctx.settings.max_concurrent_details, |pr| async move {
        let logins: BTreeSet<String> = ctx
            .api
            .list_pull_request_reviews(ctx.repo, pr.number)?
            .try_filter_map(|review| future::ready(Ok(review.user.map(|user| user.login))))
            .try_collect()
            .await?;
        Ok::<_, ohno::AppError>(logins.len() as u64)
    })
    .await;

    let mut counts = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(count) => counts.push(count),
            Err(e) => log::debug!(target: LOG_TARGET, "Skipping reviews of a pull request in '{}': {e:#}", ctx.repo),
        }
    }

    Ok(tally_reviewers(&counts))
}

#[expect(clippy::cast_precision_loss, reason = "counts are far below 2^52")]
fn tally_reviewers(reviewers_per_pr: &[u64]) -> Reviewers {
    Reviewers {
        average: average(reviewers_per_pr.iter().sum::<u64>() as f64, reviewers_per_pr.len() as u64),
        cross_team: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::probes::test_support::{at, january};
    use chrono::{DateTime, Utc};
    use futures::stream;

    fn pr(number: u64, created: DateTime<Utc>, merged: Option<DateTime<Utc>>) -> PullRequest {
        PullRequest {
            number,
            created_at: created,
            merged_at: merged,
        }
    }

    #[test]
    fn test_ten_prs_with_three_conflicts() {
        let mut mergeable = vec![Some(true); 7];
        mergeable.extend([Some(false); 3]);

        let conflicts = tally_conflicts(&mergeable);

        assert_eq!(conflicts.count, 3);
        assert!((conflicts.rate - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_mergeability_is_not_a_conflict() {
        let conflicts = tally_conflicts(&[None, None, Some(false), Some(true)]);

        assert_eq!(conflicts.count, 1);
        assert!((conflicts.rate - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_no_prs_gives_zero_rate() {
        assert_eq!(tally_conflicts(&[]), Conflicts::default());
    }

    #[test]
    fn test_average_merge_days() {
        let prs = vec![
            pr(1, at(1, 1), Some(at(1, 2))),
            pr(2, at(1, 1), Some(at(1, 4))),
            pr(3, at(1, 5), None),
        ];

        assert!((average_merge_days(&prs) - 2.0).abs() < 1e-9);
        assert!(average_merge_days(&[pr(4, at(1, 5), None)]).abs() < f64::EPSILON);
    }

    #[test]
    fn test_tally_reviewers() {
        let reviewers = tally_reviewers(&[2, 1, 0, 3]);

        assert!((reviewers.average - 1.5).abs() < f64::EPSILON);
        assert_eq!(reviewers.cross_team, 0);
        assert_eq!(tally_reviewers(&[]), Reviewers::default());
    }

    #[tokio::test]
    async fn test_collect_newest_first_stops_before_window() {
        let listing = stream::iter(vec![
            Ok(pr(5, at(2, 3), None)),
            Ok(pr(4, at(1, 20), None)),
            Ok(pr(3, at(1, 2), None)),
            Ok(pr(2, at(12, 30) - chrono::Duration::days(366), None)),
            Err(app_err!("older pages must not be fetched")),
        ]);

        let prs = collect_newest_first(listing, &january()).await.unwrap();

        let numbers: Vec<u64> = prs.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![4, 3]);
    }

    #[tokio::test]
    async fn test_collect_newest_first_surfaces_errors() {
        let listing = stream::iter(vec![Ok(pr(4, at(1, 20), None)), Err(app_err!("page 2 failed"))]);

        let _ = collect_newest_first(listing, &january()).await.unwrap_err();
    }
}
