use super::collector::Collector;
use super::progress::Progress;
use super::throttler::Throttler;
use super::{RepoReport, RepoSpec, RunReport};
use chrono::Utc;
use core::sync::atomic::{AtomicU64, Ordering};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::task::JoinSet;

const LOG_TARGET: &str = "     fleet";

/// Runs the collector over every configured repository with bounded parallelism.
pub struct Fleet {
    collector: Arc<Collector>,
    owner: String,
    throttler: Arc<Throttler>,
    progress: Arc<dyn Progress>,
}

impl core::fmt::Debug for Fleet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Fleet")
            .field("collector", &self.collector)
            .field("owner", &self.owner)
            .field("throttler", &self.throttler)
            .field("progress", &"<dyn Progress>")
            .finish()
    }
}

impl Fleet {
    pub fn new(collector: Collector, owner: impl Into<String>, max_concurrent_repos: usize, progress: impl Progress + 'static) -> Self {
        Self {
            collector: Arc::new(collector),
            owner: owner.into(),
            throttler: Throttler::new(max_concurrent_repos),
            progress: Arc::new(progress),
        }
    }

    /// Highest number of repositories that were processed at the same time.
    #[must_use]
    pub fn peak_concurrency(&self) -> usize {
        self.throttler.peak()
    }

    /// Collect every repository of every area.
    ///
    /// Each repository becomes exactly one record, also when its task fails. Records are
    /// sorted by area, then by repository.
    pub async fn run(&self, areas: &BTreeMap<String, Vec<RepoSpec>>) -> RunReport {
        let work: Vec<(String, RepoSpec)> = areas
            .iter()
            .flat_map(|(area, repos)| repos.iter().map(move |repo| (area.clone(), repo.clone())))
            .collect();

        let total = work.len() as u64;
        let completed = Arc::new(AtomicU64::new(0));

        self.progress.set_phase("Collecting");
        {
            let completed = Arc::clone(&completed);
            self.progress.set_determinate(Box::new(move || {
                let done = completed.load(Ordering::Relaxed);
                (total, done, format!("{done}/{total} repositories"))
            }));
        }

        log::info!(
            target: LOG_TARGET,
            "Collecting {total} repositories across {} area(s), at most {} at a time",
            areas.len(),
            self.throttler.max_concurrent()
        );

        let mut tasks = JoinSet::new();
        let mut pending = HashMap::with_capacity(work.len());

        for (area, repo) in work {
            let collector = Arc::clone(&self.collector);
            let throttler = Arc::clone(&self.throttler);
            let completed = Arc::clone(&completed);
            let task_area = area.clone();
            let task_repo = repo.clone();

            let handle = tasks.spawn(async move {
                let report = {
                    let _permit = throttler.acquire().await;
                    log::debug!(target: LOG_TARGET, "Starting '{task_repo}' ({} in flight)", throttler.in_flight());
                    collector.collect(&task_area, task_repo).await
                };
                let _ = completed.fetch_add(1, Ordering::Relaxed);
                report
            });

            let _ = pending.insert(handle.id(), (area, repo));
        }

        let mut repos = Vec::with_capacity(pending.len());
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, report)) => {
                    let _ = pending.remove(&id);
                    repos.push(report);
                }
                Err(e) => {
                    let _ = completed.fetch_add(1, Ordering::Relaxed);
                    if let Some((area, repo)) = pending.remove(&e.id()) {
                        log::error!(target: LOG_TARGET, "Collection task for '{repo}' failed: {e}");
                        repos.push(RepoReport::failed(area, repo, format!("collection task failed: {e}")));
                    }
                }
            }
        }

        self.progress.done();

        repos.sort_by(|a, b| a.area.cmp(&b.area).then_with(|| a.repo.cmp(&b.repo)));

        log::info!(
            target: LOG_TARGET,
            "Collected {} repositories ({} failed, peak concurrency {})",
            repos.len(),
            repos.iter().filter(|r| r.error.is_some()).count(),
            self.throttler.peak()
        );

        RunReport {
            owner: self.owner.clone(),
            branch: self.collector.settings().default_branch.clone(),
            workflow: self.collector.settings().workflow.clone(),
            window: *self.collector.window(),
            web_url: self.collector.api().web_url(),
            generated_at: Utc::now(),
            repos,
        }
    }
}
