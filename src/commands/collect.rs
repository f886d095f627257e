use super::common::{ColorMode, LogLevel, init_logging};
use super::{Host, ProgressReporter};
use crate::Result;
use crate::config::Config;
use crate::facts::hosting::{Client, GitHub};
use crate::facts::{Collector, Fleet, RunReport};
use crate::reports::{generate_console, generate_csv, generate_json, generate_markdown};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{NaiveDate, Utc};
use clap::Args;
use core::time::Duration;
use ohno::{IntoAppError, bail};
use std::fs;
use std::io::{IsTerminal, Write, stderr, stdout};

const LOG_TARGET: &str = "   collect";

#[derive(Args, Debug)]
pub struct CollectArgs {
    /// Path to configuration file (default is `pulse.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// GitHub personal access token
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// First day of the analysis window, overriding the configuration
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub since: Option<NaiveDate>,

    /// Day after the last day of the analysis window, overriding the configuration
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub until: Option<NaiveDate>,

    /// Control when to use colored output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorMode,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none")]
    pub log_level: LogLevel,

    /// Write the report as Markdown
    #[arg(long, value_name = "PATH", help_heading = "Report Output")]
    pub markdown: Option<Utf8PathBuf>,

    /// Write the report as JSON
    #[arg(long, value_name = "PATH", help_heading = "Report Output")]
    pub json: Option<Utf8PathBuf>,

    /// Write the report as CSV, one row per repository
    #[arg(long, value_name = "PATH", help_heading = "Report Output")]
    pub csv: Option<Utf8PathBuf>,

    /// Print the report to the terminal. This is the default when no report file is requested.
    #[arg(long, help_heading = "Report Output")]
    pub console: bool,
}

impl CollectArgs {
    fn writes_files(&self) -> bool {
        self.markdown.is_some() || self.json.is_some() || self.csv.is_some()
    }
}

/// Collect metrics for every configured repository and emit the requested reports
///
/// # Errors
///
/// Returns an error if no token is available, the configuration is invalid, or a report
/// cannot be written. Failures of individual repositories are part of the report instead.
pub async fn collect_metrics<H: Host>(host: &mut H, args: &CollectArgs) -> Result<()> {
    init_logging(args.log_level);

    let report = match prepare_and_run(args).await {
        Ok(report) => report,
        Err(e) => {
            let _ = writeln!(host.error(), "❌ {e:#}");
            host.exit(1);
            return Err(e);
        }
    };

    if report.failed_repos() > 0 {
        let _ = writeln!(
            host.error(),
            "{} of {} repositories could not be collected",
            report.failed_repos(),
            report.repos.len()
        );
    }

    if args.console || !args.writes_files() {
        let mut text = String::new();
        generate_console(&report, args.color.use_colors(&stdout()), &mut text)?;
        let _ = write!(host.output(), "{text}");
    }

    if let Some(path) = &args.markdown {
        let mut text = String::new();
        generate_markdown(&report, &mut text)?;
        write_report(path, &text)?;
    }

    if let Some(path) = &args.json {
        let mut text = String::new();
        generate_json(&report, &mut text)?;
        write_report(path, &text)?;
    }

    if let Some(path) = &args.csv {
        let mut text = String::new();
        generate_csv(&report, &mut text)?;
        write_report(path, &text)?;
    }

    Ok(())
}

async fn prepare_and_run(args: &CollectArgs) -> Result<RunReport> {
    let Some(token) = args.github_token.as_deref().filter(|t| !t.trim().is_empty()) else {
        bail!("a GitHub token is required, pass --github-token or set GITHUB_TOKEN");
    };

    let config = Config::load(args.config.as_deref())?;
    let window = config.window(Utc::now(), args.since, args.until)?;
    let areas = config.repositories()?;

    let governor = config.rate_governor();
    let client = Client::new(Some(token), config.api_url.as_str(), governor)?;
    log::debug!(
        target: LOG_TARGET,
        "Using API at '{}', pausing {}s whenever fewer than {} requests remain",
        client.base_url(),
        governor.cooldown().as_secs(),
        governor.low_water_mark()
    );
    let collector = Collector::new(GitHub::new(client), window, config.probe_settings());

    // The bar would interleave with log lines, so it only shows when logging is off
    let progress = if args.log_level == LogLevel::None && stderr().is_terminal() {
        ProgressReporter::new(Duration::from_millis(300), args.color.use_colors(&stderr()))
    } else {
        ProgressReporter::hidden()
    };

    log::info!(target: LOG_TARGET, "Analysis window is {window}");

    let fleet = Fleet::new(collector, config.owner.clone(), config.max_concurrent_repos, progress);
    Ok(fleet.run(&areas).await)
}

fn write_report(path: &Utf8Path, text: &str) -> Result<()> {
    fs::write(path, text).into_app_err_with(|| format!("writing report to '{path}'"))?;
    log::info!(target: LOG_TARGET, "Wrote report '{path}'");
    Ok(())
}
