//! Metric probes
//!
//! Each probe computes one metric (or a small group of fields that come from the same
//! API walk) for one repository by driving paginated listings and folding their items.
//! Probes never fail the repository as a whole: every outcome is a [`ProviderResult`].

mod branch;
mod churn;
mod commits;
mod issues;
mod pulls;
mod threads;
mod workflows;

pub use branch::{BranchSize, branch_size};
pub use churn::{Churn, churn, churn_by_dir};
pub use commits::{Contributors, commit_distribution, contributors, revert_rate};
pub use issues::{integration_issues, rollback_issues};
pub use pulls::{Conflicts, Reviewers, conflicts, merge_time, reviewers};
pub use threads::thread_depth;
pub use workflows::{WorkflowStats, workflow};

use crate::Result;
use crate::facts::hosting::{GitHub, Issue};
use crate::facts::throttler::Throttler;
use crate::facts::{ProviderResult, RepoSpec, TimeWindow};
use futures::{Stream, TryStreamExt};
use futures_util::future::join_all;

/// Settings shared by every probe of a run.
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub default_branch: String,

    /// Workflow name or numeric id.
    pub workflow: String,

    pub integration_label: String,
    pub rollback_label: String,

    /// Cap on concurrent per-item detail requests within one probe.
    pub max_concurrent_details: usize,
}

/// Everything a probe needs to know about the repository it measures.
#[derive(Debug, Clone, Copy)]
pub struct ProbeContext<'a> {
    pub api: &'a GitHub,
    pub repo: &'a RepoSpec,
    pub window: &'a TimeWindow,
    pub settings: &'a ProbeSettings,
}

/// Run `fetch` for every item with at most `max_concurrent` calls in flight.
///
/// Results come back in item order.
pub async fn fan_out<I, T, F, Fut>(items: impl IntoIterator<Item = I>, max_concurrent: usize, fetch: F) -> Vec<Result<T>>
where
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let throttler = Throttler::new(max_concurrent);

    join_all(items.into_iter().map(|item| {
        let throttler = &throttler;
        let request = fetch(item);
        async move {
            let _permit = throttler.acquire().await;
            request.await
        }
    }))
    .await
}

/// Drain a listing, counting its items.
async fn count_items<T>(items: impl Stream<Item = Result<T>>) -> Result<u64> {
    items.try_fold(0_u64, |count, _| async move { Ok(count + 1) }).await
}

/// Issues (not pull requests) created in the window and closed before it ends.
fn resolved_in_window(window: &TimeWindow, issue: &Issue) -> bool {
    !issue.is_pull_request() && window.contains(issue.created_at) && issue.closed_at.is_some_and(|closed| closed < window.end())
}

/// Percentage of `part` in `total`; zero when there is nothing to divide by.
#[expect(clippy::cast_precision_loss, reason = "counts are far below 2^52")]
fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 { 0.0 } else { part as f64 / total as f64 * 100.0 }
}

/// Mean of `sum` over `count` items; zero when there are no items.
#[expect(clippy::cast_precision_loss, reason = "counts are far below 2^52")]
fn average(sum: f64, count: u64) -> f64 {
    if count == 0 { 0.0 } else { sum / count as f64 }
}

impl<T> ProviderResult<T> {
    /// A probe outcome where `None` means the probe's prerequisite does not exist.
    fn from_lookup(result: Result<Option<T>>, missing: impl FnOnce() -> String) -> Self {
        match result {
            Ok(Some(value)) => Self::Found(value),
            Ok(None) => Self::Unavailable(missing().into()),
            Err(e) => Self::Error(std::sync::Arc::new(e)),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::facts::hosting::{Issue, Label};
    use chrono::{DateTime, TimeZone, Utc};

    pub fn at(month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, month, day, 12, 0, 0).unwrap()
    }

    pub fn january() -> crate::facts::TimeWindow {
        crate::facts::TimeWindow::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap())
            .unwrap()
    }

    pub fn issue(created: DateTime<Utc>, closed: Option<DateTime<Utc>>, labels: &[&str]) -> Issue {
        Issue {
            number: 1,
            created_at: created,
            closed_at: closed,
            labels: labels.iter().map(|name| Label { name: (*name).to_string() }).collect(),
            pull_request: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{at, issue, january};
    use super::*;
    use crate::facts::hosting::PullRequestMarker;
    use core::sync::atomic::{AtomicUsize, Ordering};
    use core::time::Duration;
    use futures::stream;
    use ohno::app_err;

    #[tokio::test]
    async fn test_fan_out_respects_cap_and_keeps_order() {
        let active = AtomicUsize::new(0);
        let max_seen = AtomicUsize::new(0);

        let results = fan_out(0..30_u32, 10, |n| {
            let active = &active;
            let max_seen = &max_seen;
            async move {
                let current = active.fetch_add(1, Ordering::SeqCst) + 1;
                _ = max_seen.fetch_max(current, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                _ = active.fetch_sub(1, Ordering::SeqCst);
                Ok(n * 2)
            }
        })
        .await;

        assert!(max_seen.load(Ordering::SeqCst) <= 10);
        let doubled: Vec<u32> = results.into_iter().map(Result::unwrap).collect();
        assert_eq!(doubled, (0..30).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_count_items_stops_at_error() {
        let ok = stream::iter(vec![Ok(1), Ok(2), Ok(3)]);
        assert_eq!(count_items(ok).await.unwrap(), 3);

        let failing = stream::iter(vec![Ok(1), Err(app_err!("page 2 failed")), Ok(3)]);
        let _ = count_items(failing).await.unwrap_err();
    }

    #[test]
    fn test_resolved_in_window() {
        let window = january();

        assert!(resolved_in_window(&window, &issue(at(1, 3), Some(at(1, 20)), &[])));
        assert!(!resolved_in_window(&window, &issue(at(1, 3), None, &[])));
        assert!(!resolved_in_window(&window, &issue(at(1, 3), Some(at(2, 3)), &[])));
        assert!(!resolved_in_window(&window, &issue(at(12, 3) - chrono::Duration::days(365), Some(at(1, 5)), &[])));

        let mut pr = issue(at(1, 3), Some(at(1, 20)), &[]);
        pr.pull_request = Some(PullRequestMarker {});
        assert!(!resolved_in_window(&window, &pr));
    }

    #[test]
    fn test_zero_denominators_give_zero() {
        assert!(percentage(0, 0).abs() < f64::EPSILON);
        assert!(average(10.0, 0).abs() < f64::EPSILON);
        assert!((percentage(3, 10) - 30.0).abs() < f64::EPSILON);
        assert!((average(9.0, 4) - 2.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_lookup() {
        let missing = ProviderResult::<u32>::from_lookup(Ok(None), || "branch 'main' not found".to_string());
        assert_eq!(missing.failure_reason().as_deref(), Some("branch 'main' not found"));

        let found = ProviderResult::from_lookup(Ok(Some(5)), String::new);
        assert!(matches!(found, ProviderResult::Found(5)));

        let error = ProviderResult::<u32>::from_lookup(Err(app_err!("boom")), String::new);
        assert!(matches!(error, ProviderResult::Error(_)));
    }
}
