use crate::Result;
use crate::facts::hosting::RateGovernor;
use crate::facts::probes::ProbeSettings;
use crate::facts::{RepoSpec, TimeWindow};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, NaiveDate, Utc};
use core::time::Duration;
use ohno::{EnrichableExt, IntoAppError, app_err, bail};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// File looked up in the current directory when no configuration path is given
pub const DEFAULT_CONFIG_FILE: &str = "pulse.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Organization or user owning the repositories
    pub owner: String,

    /// Branch whose size and file count are measured
    #[serde(default = "default_branch")]
    pub default_branch: String,

    /// Workflow whose runs are counted, by display name or numeric id
    pub workflow: String,

    /// First day of the analysis window
    #[serde(default)]
    pub start: Option<NaiveDate>,

    /// Day after the last day of the analysis window
    #[serde(default)]
    pub end: Option<NaiveDate>,

    /// Length of the window in months, used when no explicit `start` is set
    #[serde(default = "default_months_back")]
    pub months_back: u32,

    #[serde(default = "default_integration_label")]
    pub integration_label: String,

    #[serde(default = "default_rollback_label")]
    pub rollback_label: String,

    #[serde(default = "default_max_concurrent_repos")]
    pub max_concurrent_repos: usize,

    #[serde(default = "default_max_concurrent_details")]
    pub max_concurrent_details: usize,

    /// Remaining API quota below which requests pause
    #[serde(default = "default_quota_low_water_mark")]
    pub quota_low_water_mark: usize,

    #[serde(default = "default_quota_cooldown_secs")]
    pub quota_cooldown_secs: u64,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Area name to repositories in that area
    pub areas: BTreeMap<String, Vec<String>>,
}

fn default_branch() -> String {
    "main".to_string()
}

const fn default_months_back() -> u32 {
    1
}

fn default_integration_label() -> String {
    "bug-integration".to_string()
}

fn default_rollback_label() -> String {
    "rollback".to_string()
}

const fn default_max_concurrent_repos() -> usize {
    5
}

const fn default_max_concurrent_details() -> usize {
    10
}

const fn default_quota_low_water_mark() -> usize {
    100
}

const fn default_quota_cooldown_secs() -> u64 {
    5
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

impl Config {
    /// Load configuration from a file
    ///
    /// Without an explicit path, `pulse.toml` in the current directory is used.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation
    pub fn load(config_path: Option<&Utf8Path>) -> Result<Self> {
        let path = config_path.map_or_else(|| Utf8PathBuf::from(DEFAULT_CONFIG_FILE), Utf8Path::to_path_buf);

        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound && config_path.is_none() => {
                bail!("no configuration file '{path}' found, create one with `repo-pulse init`");
            }
            Err(e) => return Err(e).into_app_err_with(|| format!("reading repo-pulse configuration file '{path}'")),
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{path}'"))?;
        config.validate()?;

        Ok(config)
    }

    /// Save the default configuration to a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if a value is out of range, the window is empty, or a repository
    /// entry is malformed or listed twice
    pub fn validate(&self) -> Result<()> {
        if self.owner.trim().is_empty() {
            bail!("owner must not be empty");
        }

        if self.default_branch.trim().is_empty() {
            bail!("default_branch must not be empty");
        }

        if self.workflow.trim().is_empty() {
            bail!("workflow must not be empty");
        }

        if self.start.is_none() && self.months_back == 0 {
            bail!("months_back must be at least 1 when no start date is set");
        }

        if let (Some(start), Some(end)) = (self.start, self.end)
            && start >= end
        {
            bail!("start ({start}) must be before end ({end})");
        }

        if self.end.is_some() && self.start.is_none() {
            bail!("end is set without start");
        }

        if self.max_concurrent_repos == 0 {
            bail!("max_concurrent_repos must be at least 1");
        }

        if self.max_concurrent_details == 0 {
            bail!("max_concurrent_details must be at least 1");
        }

        let _ = url::Url::parse(&self.api_url).into_app_err_with(|| format!("api_url '{}' is not a valid URL", self.api_url))?;
        let _ = self.repositories()?;

        Ok(())
    }

    /// Configured repositories, grouped by area
    ///
    /// # Errors
    ///
    /// Returns an error if there are no repositories, an entry is malformed, or a
    /// repository appears more than once
    pub fn repositories(&self) -> Result<BTreeMap<String, Vec<RepoSpec>>> {
        let mut seen = BTreeSet::new();
        let mut areas = BTreeMap::new();

        for (area, entries) in &self.areas {
            if entries.is_empty() {
                bail!("area '{area}' lists no repositories");
            }

            let mut repos = Vec::with_capacity(entries.len());
            for entry in entries {
                let repo = RepoSpec::parse(&self.owner, entry).map_err(|e| e.enrich_with(|| format!("in area '{area}'")))?;
                if !seen.insert(repo.clone()) {
                    bail!("repository '{repo}' is listed more than once");
                }
                repos.push(repo);
            }

            let _ = areas.insert(area.clone(), repos);
        }

        if areas.is_empty() {
            return Err(app_err!("no areas configured, add repositories under [areas]"));
        }

        Ok(areas)
    }

    /// The analysis window, with optional command-line overrides of its bounds
    ///
    /// An explicit start without an end runs up to today. Without any start, the window
    /// spans the last `months_back` months up to today.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting window is empty
    pub fn window(&self, now: DateTime<Utc>, since: Option<NaiveDate>, until: Option<NaiveDate>) -> Result<TimeWindow> {
        let start = since.or(self.start);
        let end = until.or(self.end);

        match (start, end) {
            (Some(start), Some(end)) => TimeWindow::from_dates(start, end),
            (Some(start), None) => TimeWindow::from_dates(start, now.date_naive()),
            (None, Some(end)) => {
                let end = end.and_time(chrono::NaiveTime::MIN).and_utc();
                TimeWindow::months_back(end, self.months_back)
            }
            (None, None) => TimeWindow::months_back(now, self.months_back),
        }
    }

    #[must_use]
    pub fn probe_settings(&self) -> ProbeSettings {
        ProbeSettings {
            default_branch: self.default_branch.clone(),
            workflow: self.workflow.clone(),
            integration_label: self.integration_label.clone(),
            rollback_label: self.rollback_label.clone(),
            max_concurrent_details: self.max_concurrent_details,
        }
    }

    #[must_use]
    pub const fn rate_governor(&self) -> RateGovernor {
        RateGovernor::new(self.quota_low_water_mark, Duration::from_secs(self.quota_cooldown_secs))
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        config.validate().unwrap();

        assert_eq!(config.max_concurrent_repos, 5);
        assert_eq!(config.max_concurrent_details, 10);
        assert_eq!(config.integration_label, "bug-integration");
        assert_eq!(config.repositories().unwrap().len(), 3);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            owner = "acme"
            workflow = "ci"
            [areas]
            core = ["api"]
            "#,
        )
        .unwrap();

        config.validate().unwrap();
        assert_eq!(config.default_branch, "main");
        assert_eq!(config.rollback_label, "rollback");
        assert_eq!(config.quota_low_water_mark, 100);
        assert_eq!(config.rate_governor().cooldown(), Duration::from_secs(5));
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let result = toml::from_str::<Config>(
            r#"
            owner = "acme"
            workflow = "ci"
            max_concurrency = 3
            [areas]
            core = ["api"]
            "#,
        );

        let _ = result.unwrap_err();
    }

    #[test]
    fn test_validate_rejects_zero_caps() {
        let config = Config {
            max_concurrent_repos: 0,
            ..Config::default()
        };
        let _ = config.validate().unwrap_err();

        let config = Config {
            max_concurrent_details: 0,
            ..Config::default()
        };
        let _ = config.validate().unwrap_err();
    }

    #[test]
    fn test_validate_rejects_inverted_window() {
        let config = Config {
            start: Some(date(2024, 3, 1)),
            end: Some(date(2024, 1, 1)),
            ..Config::default()
        };

        let _ = config.validate().unwrap_err();
    }

    #[test]
    fn test_repositories_rejects_duplicates_across_areas() {
        let mut config = Config::default();
        let _ = config.areas.insert("Platform".to_string(), vec!["raywall/web-app".to_string()]);

        let _ = config.repositories().unwrap_err();
    }

    #[test]
    fn test_repositories_names_area_of_invalid_entry() {
        let mut config = Config::default();
        config.areas = BTreeMap::from([("Platform".to_string(), vec!["a/b/c".to_string()])]);

        let err = config.repositories().unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("in area 'Platform'"), "unexpected error: {message}");
        assert!(message.contains("expected 'repo' or 'owner/repo'"), "unexpected error: {message}");
    }

    #[test]
    fn test_repositories_allow_owner_override() {
        let mut config = Config::default();
        config.areas = BTreeMap::from([("Deps".to_string(), vec!["tokio-rs/tokio".to_string()])]);

        let repos = config.repositories().unwrap();
        assert_eq!(repos["Deps"][0].owner(), "tokio-rs");
    }

    #[test]
    fn test_window_from_months_back() {
        let config = Config::default();
        let now = Utc.with_ymd_and_hms(2024, 5, 20, 9, 30, 0).unwrap();

        let window = config.window(now, None, None).unwrap();

        assert_eq!(window.start(), Utc.with_ymd_and_hms(2024, 4, 20, 0, 0, 0).unwrap());
        assert_eq!(window.end(), Utc.with_ymd_and_hms(2024, 5, 20, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_window_overrides() {
        let config = Config {
            start: Some(date(2024, 1, 1)),
            end: Some(date(2024, 2, 1)),
            ..Config::default()
        };
        let now = Utc.with_ymd_and_hms(2024, 5, 20, 9, 30, 0).unwrap();

        let window = config.window(now, None, None).unwrap();
        assert_eq!(window.to_string(), "2024-01-01 to 2024-02-01");

        let window = config.window(now, Some(date(2024, 1, 15)), None).unwrap();
        assert_eq!(window.to_string(), "2024-01-15 to 2024-02-01");

        let window = Config::default().window(now, Some(date(2024, 5, 1)), None).unwrap();
        assert_eq!(window.to_string(), "2024-05-01 to 2024-05-20");

        let window = Config::default().window(now, None, Some(date(2024, 3, 1))).unwrap();
        assert_eq!(window.to_string(), "2024-02-01 to 2024-03-01");
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_save_default_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let output_path = Utf8PathBuf::try_from(tmp.path().join("pulse.toml")).unwrap();

        Config::save_default(&output_path).unwrap();
        let loaded = Config::load(Some(&output_path)).unwrap();

        assert_eq!(loaded.owner, "raywall");
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_missing_explicit_path_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::try_from(tmp.path().join("missing.toml")).unwrap();

        let _ = Config::load(Some(&path)).unwrap_err();
    }
}
