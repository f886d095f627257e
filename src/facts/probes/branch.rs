use super::ProbeContext;
use crate::Result;
use crate::facts::ProviderResult;
use crate::facts::hosting::{Tree, TreeEntryKind};
use ohno::app_err;

const LOG_TARGET: &str = "    branch";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BranchSize {
    pub bytes: u64,
    pub files: u64,
}

/// Size in bytes and number of files at the head of the default branch.
pub async fn branch_size(ctx: &ProbeContext<'_>) -> ProviderResult<BranchSize> {
    let branch = &ctx.settings.default_branch;
    ProviderResult::from_lookup(measure(ctx).await, || format!("branch '{branch}' not found"))
}

async fn measure(ctx: &ProbeContext<'_>) -> Result<Option<BranchSize>> {
    let Some(sha) = ctx.api.branch_head(ctx.repo, &ctx.settings.default_branch).await? else {
        return Ok(None);
    };

    let tree = ctx
        .api
        .list_tree(ctx.repo, &sha)
        .await?
        .ok_or_else(|| app_err!("tree of commit {sha} not found"))?;

    if tree.truncated {
        log::warn!(target: LOG_TARGET, "Tree of '{}' is too large to list completely, branch size is a lower bound", ctx.repo);
    }

    Ok(Some(tally_tree(&tree)))
}

/// Sum the sizes of all blobs in a tree listing.
fn tally_tree(tree: &Tree) -> BranchSize {
    tree.tree
        .iter()
        .filter(|entry| entry.kind == TreeEntryKind::Blob)
        .fold(BranchSize::default(), |acc, entry| BranchSize {
            bytes: acc.bytes + entry.size.unwrap_or(0),
            files: acc.files + 1,
        })
}
