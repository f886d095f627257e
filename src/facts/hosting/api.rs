use super::client::Client;
use super::models::{
    Comment, Commit, CommitDetail, GitRef, Issue, PullRequest, PullRequestDetail, Repository, Review, Tree, Workflow, WorkflowList,
    WorkflowRun, WorkflowRunList,
};
use super::pages::paginate;
use crate::Result;
use crate::facts::{RepoSpec, TimeWindow};
use chrono::{DateTime, Utc};
use futures::Stream;
use ohno::EnrichableExt;

const PAGE_SIZE: &str = "100";

/// The GitHub capabilities the metric probes are built on.
///
/// Single-resource lookups return `Ok(None)` when the resource does not exist.
/// Listings return lazy streams that fetch pages of 100 items on demand.
#[derive(Debug, Clone)]
pub struct GitHub {
    client: Client,
}

impl GitHub {
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    /// Browser address of the GitHub instance, used to link repositories in reports.
    #[must_use]
    pub fn web_url(&self) -> String {
        self.client.web_url()
    }

    fn repo_url(&self, repo: &RepoSpec, suffix: &str, params: &[(&str, String)]) -> Result<String> {
        self.client.url(&format!("/repos/{}/{}{suffix}", repo.owner(), repo.repo()), params)
    }

    fn page_params(extra: &[(&'static str, String)]) -> Vec<(&'static str, String)> {
        let mut params = extra.to_vec();
        params.push(("per_page", PAGE_SIZE.to_string()));
        params
    }

    pub async fn repository(&self, repo: &RepoSpec) -> Result<Option<Repository>> {
        let url = self.repo_url(repo, "", &[])?;
        let page = self
            .client
            .get_json::<Repository>(&url)
            .await
            .map_err(|e| e.enrich_with(|| format!("looking up repository '{repo}'")))?;

        Ok(page.map(|p| p.data))
    }

    /// Commit SHA at the head of `branch`.
    pub async fn branch_head(&self, repo: &RepoSpec, branch: &str) -> Result<Option<String>> {
        let url = self.repo_url(repo, &format!("/git/ref/heads/{branch}"), &[])?;
        let page = self.client.get_json::<GitRef>(&url).await?;

        Ok(page.map(|p| p.data.object.sha))
    }

    /// Recursive tree listing of the given commit.
    pub async fn list_tree(&self, repo: &RepoSpec, sha: &str) -> Result<Option<Tree>> {
        let url = self.repo_url(repo, &format!("/git/trees/{sha}"), &[("recursive", "1".to_string())])?;
        let page = self.client.get_json::<Tree>(&url).await?;

        Ok(page.map(|p| p.data))
    }

    pub fn list_workflows(&self, repo: &RepoSpec) -> Result<impl Stream<Item = Result<Workflow>> + Send + '_> {
        let url = self.repo_url(repo, "/actions/workflows", &Self::page_params(&[]))?;
        Ok(paginate::<WorkflowList>(&self.client, url))
    }

    /// Completed runs of one workflow created inside the window.
    pub fn list_workflow_runs(
        &self,
        repo: &RepoSpec,
        workflow_id: u64,
        window: &TimeWindow,
    ) -> Result<impl Stream<Item = Result<WorkflowRun>> + Send + '_> {
        let params = Self::page_params(&[("status", "completed".to_string()), ("created", window.created_range_param())]);
        let url = self.repo_url(repo, &format!("/actions/workflows/{workflow_id}/runs"), &params)?;
        Ok(paginate::<WorkflowRunList>(&self.client, url))
    }

    /// All pull requests, newest first.
    pub fn list_pull_requests(&self, repo: &RepoSpec) -> Result<impl Stream<Item = Result<PullRequest>> + Send + '_> {
        let params = Self::page_params(&[
            ("state", "all".to_string()),
            ("sort", "created".to_string()),
            ("direction", "desc".to_string()),
        ]);
        let url = self.repo_url(repo, "/pulls", &params)?;
        Ok(paginate::<Vec<PullRequest>>(&self.client, url))
    }

    pub async fn pull_request_detail(&self, repo: &RepoSpec, number: u64) -> Result<Option<PullRequestDetail>> {
        let url = self.repo_url(repo, &format!("/pulls/{number}"), &[])?;
        let page = self.client.get_json::<PullRequestDetail>(&url).await?;

        Ok(page.map(|p| p.data))
    }

    pub fn list_pull_request_reviews(&self, repo: &RepoSpec, number: u64) -> Result<impl Stream<Item = Result<Review>> + Send + '_> {
        let url = self.repo_url(repo, &format!("/pulls/{number}/reviews"), &Self::page_params(&[]))?;
        Ok(paginate::<Vec<Review>>(&self.client, url))
    }

    /// Review comments on the diff of a pull request.
    pub fn list_pull_request_comments(&self, repo: &RepoSpec, number: u64) -> Result<impl Stream<Item = Result<Comment>> + Send + '_> {
        let url = self.repo_url(repo, &format!("/pulls/{number}/comments"), &Self::page_params(&[]))?;
        Ok(paginate::<Vec<Comment>>(&self.client, url))
    }

    /// Issues (and pull requests, which the endpoint mixes in) updated since `since`.
    ///
    /// When `label` is given only issues carrying exactly that label are listed.
    pub fn list_issues(
        &self,
        repo: &RepoSpec,
        since: DateTime<Utc>,
        label: Option<&str>,
    ) -> Result<impl Stream<Item = Result<Issue>> + Send + '_> {
        let mut extra = vec![
            ("state", "all".to_string()),
            ("since", since.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)),
        ];
        if let Some(label) = label {
            extra.push(("labels", label.to_string()));
        }

        let url = self.repo_url(repo, "/issues", &Self::page_params(&extra))?;
        Ok(paginate::<Vec<Issue>>(&self.client, url))
    }

    pub fn list_issue_comments(&self, repo: &RepoSpec, number: u64) -> Result<impl Stream<Item = Result<Comment>> + Send + '_> {
        let url = self.repo_url(repo, &format!("/issues/{number}/comments"), &Self::page_params(&[]))?;
        Ok(paginate::<Vec<Comment>>(&self.client, url))
    }

    /// Commits on the default branch authored inside the window.
    pub fn list_commits(&self, repo: &RepoSpec, window: &TimeWindow) -> Result<impl Stream<Item = Result<Commit>> + Send + '_> {
        let params = Self::page_params(&[("since", window.start_param()), ("until", window.end_param())]);
        let url = self.repo_url(repo, "/commits", &params)?;
        Ok(paginate::<Vec<Commit>>(&self.client, url))
    }

    pub async fn commit_detail(&self, repo: &RepoSpec, sha: &str) -> Result<Option<CommitDetail>> {
        let url = self.repo_url(repo, &format!("/commits/{sha}"), &[])?;
        let page = self.client.get_json::<CommitDetail>(&url).await?;

        Ok(page.map(|p| p.data))
    }
}
