use super::{ProbeContext, average};
use crate::Result;
use crate::facts::ProviderResult;
use crate::facts::hosting::{RunConclusion, Workflow, WorkflowRun};
use core::pin::pin;
use futures::{TryStreamExt, future};

/// Outcome tallies of one workflow's completed runs in the window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WorkflowStats {
    pub failures: u64,

    /// Successful on the first attempt.
    pub deploys: u64,

    /// Successful only after being re-run.
    pub reruns: u64,

    /// All completed runs, whatever their conclusion.
    pub runs: u64,

    /// Sum of attempts over successful runs.
    pub attempts: u64,

    /// Mean attempts per successful run.
    pub avg_attempts: f64,
}

/// Run statistics of the configured workflow.
///
/// When the repository has no workflow with the configured name or id, the result is
/// `Unavailable` and none of the workflow fields are filled.
pub async fn workflow(ctx: &ProbeContext<'_>) -> ProviderResult<WorkflowStats> {
    let wanted = &ctx.settings.workflow;
    ProviderResult::from_lookup(measure(ctx).await, || format!("workflow '{wanted}' not found"))
}

async fn measure(ctx: &ProbeContext<'_>) -> Result<Option<WorkflowStats>> {
    let wanted = ctx.settings.workflow.as_str();
    let workflows = ctx
        .api
        .list_workflows(ctx.repo)?
        .try_filter(|wf| future::ready(matches_workflow(wf, wanted)));

    let Some(workflow) = pin!(workflows).try_next().await? else {
        return Ok(None);
    };

    let window = ctx.window;
    let runs: Vec<WorkflowRun> = ctx
        .api
        .list_workflow_runs(ctx.repo, workflow.id, window)?
        .try_filter(|run| future::ready(window.contains(run.created_at)))
        .try_collect()
        .await?;

    Ok(Some(tally_runs(&runs)))
}

/// A workflow is selected by its exact display name or by its numeric id.
fn matches_workflow(workflow: &Workflow, wanted: &str) -> bool {
    workflow.name == wanted || workflow.id.to_string() == wanted
}

#[expect(clippy::cast_precision_loss, reason = "counts are far below 2^52")]
fn tally_runs(runs: &[WorkflowRun]) -> WorkflowStats {
    let mut stats = WorkflowStats {
        runs: runs.len() as u64,
        ..WorkflowStats::default()
    };

    for run in runs {
        match run.conclusion {
            Some(RunConclusion::Failure) => stats.failures += 1,
            Some(RunConclusion::Success) => {
                if run.run_attempt > 1 {
                    stats.reruns += 1;
                } else {
                    stats.deploys += 1;
                }
                stats.attempts += u64::from(run.run_attempt);
            }
            _ => {}
        }
    }

    stats.avg_attempts = average(stats.attempts as f64, stats.deploys + stats.reruns);
    stats
}
