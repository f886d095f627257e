use crate::Result;
use core::fmt::{Display, Formatter};
use ohno::bail;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RepoSpec {
    owner: Arc<str>,
    repo: Arc<str>,
}

impl RepoSpec {
    /// Parse a configured repository entry.
    ///
    /// Entries are either a bare repository name, which is qualified with `default_owner`,
    /// or an `owner/repo` pair that overrides the default owner for that entry.
    pub fn parse(default_owner: &str, entry: &str) -> Result<Self> {
        let entry = entry.trim().trim_end_matches(".git");

        let (owner, repo) = match entry.split_once('/') {
            Some((owner, repo)) => (owner, repo),
            None => (default_owner, entry),
        };

        if owner.is_empty() || repo.is_empty() {
            bail!("invalid repository '{entry}': empty owner or repo name");
        }

        if repo.contains('/') {
            bail!("invalid repository '{entry}': expected 'repo' or 'owner/repo'");
        }

        Ok(Self {
            owner: Arc::from(owner),
            repo: Arc::from(repo),
        })
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Browser URL of the repository on the given web host.
    #[must_use]
    pub fn html_url(&self, web_url: &str) -> String {
        format!("{}/{}/{}", web_url.trim_end_matches('/'), self.owner, self.repo)
    }
}

impl Display for RepoSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_name_uses_default_owner() {
        let spec = RepoSpec::parse("raywall", "payment-service").unwrap();

        assert_eq!(spec.owner(), "raywall");
        assert_eq!(spec.repo(), "payment-service");
        assert_eq!(spec.to_string(), "raywall/payment-service");
    }

    #[test]
    fn test_parse_qualified_name_overrides_owner() {
        let spec = RepoSpec::parse("raywall", "tokio-rs/tokio").unwrap();

        assert_eq!(spec.owner(), "tokio-rs");
        assert_eq!(spec.repo(), "tokio");
    }

    #[test]
    fn test_parse_strips_git_extension_and_whitespace() {
        let spec = RepoSpec::parse("raywall", "  auth-service.git ").unwrap();
        assert_eq!(spec.repo(), "auth-service");
    }

    #[test]
    fn test_parse_invalid_entries() {
        let _ = RepoSpec::parse("raywall", "").unwrap_err();
        let _ = RepoSpec::parse("", "web-app").unwrap_err();
        let _ = RepoSpec::parse("raywall", "/web-app").unwrap_err();
        let _ = RepoSpec::parse("raywall", "owner/").unwrap_err();
        let _ = RepoSpec::parse("raywall", "a/b/c").unwrap_err();
    }

    #[test]
    fn test_html_url() {
        let spec = RepoSpec::parse("raywall", "web-app").unwrap();
        assert_eq!(spec.html_url("https://github.com"), "https://github.com/raywall/web-app");
        assert_eq!(spec.html_url("https://ghe.example.com/"), "https://ghe.example.com/raywall/web-app");
    }

    #[test]
    fn test_serializes_as_owner_and_repo() {
        let spec = RepoSpec::parse("raywall", "web-app").unwrap();

        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value, serde_json::json!({ "owner": "raywall", "repo": "web-app" }));

        let back: RepoSpec = serde_json::from_value(value).unwrap();
        assert_eq!(back, spec);
    }

    #[test]
    fn test_ordering_is_by_owner_then_repo() {
        let a = RepoSpec::parse("acme", "zeta").unwrap();
        let b = RepoSpec::parse("beta", "alpha").unwrap();
        let c = RepoSpec::parse("acme", "alpha").unwrap();

        let mut specs = vec![a.clone(), b.clone(), c.clone()];
        specs.sort();
        assert_eq!(specs, vec![c, a, b]);
    }
}
