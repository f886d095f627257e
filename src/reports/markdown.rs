use super::common::{self, ERROR_MARK, FIELDS};
use crate::Result;
use crate::facts::{Metric, RepoReport, RunReport};
use core::fmt::Write;

/// Most-touched files and most active contributors listed per repository.
const TOP_ENTRIES: usize = 5;

pub fn generate<W: Write>(report: &RunReport, writer: &mut W) -> Result<()> {
    writeln!(writer, "# Repository metrics for `{}`", report.owner)?;
    writeln!(writer)?;
    writeln!(writer, "- **Period**: {}", report.window)?;
    writeln!(writer, "- **Branch**: `{}`", report.branch)?;
    writeln!(writer, "- **Workflow**: `{}`", report.workflow)?;
    writeln!(writer, "- **Generated**: {}", report.generated_at.format("%Y-%m-%d %H:%M UTC"))?;
    writeln!(writer)?;

    for (area, repos) in report.by_area() {
        writeln!(writer, "### {area}")?;
        writeln!(writer)?;

        for repo in repos {
            write_repo(repo, &report.web_url, writer)?;
        }
    }

    Ok(())
}

fn write_repo<W: Write>(repo: &RepoReport, web_url: &str, writer: &mut W) -> Result<()> {
    if let Some(error) = &repo.error {
        writeln!(writer, "**Repository**: {} - **{ERROR_MARK}**: {}", repo.repo, escape(error))?;
        writeln!(writer)?;
        return Ok(());
    }

    writeln!(writer, "**Repository**: [{}]({})  ", repo.repo, repo.repo.html_url(web_url))?;
    for field in FIELDS {
        let value = common::field_value(repo, field).map_or_else(|| format!("**{ERROR_MARK}**"), common::format_value);
        writeln!(writer, "**{}**: {value}  ", field.label)?;
    }

    write_top(repo, Metric::CommitDistribution, "Most active contributors", writer, |r| {
        common::top_entries(&r.metrics.commit_distribution, TOP_ENTRIES)
    })?;
    write_top(repo, Metric::Churn, "Most changed files", writer, |r| {
        common::top_entries(&r.metrics.churn_by_file, TOP_ENTRIES)
    })?;

    for (metric, reason) in &repo.failures {
        writeln!(writer, "> {ERROR_MARK} in {}: {}  ", metric.description(), escape(reason))?;
    }

    writeln!(writer)?;
    Ok(())
}

fn write_top<'a, W: Write>(
    repo: &'a RepoReport,
    metric: Metric,
    label: &str,
    writer: &mut W,
    entries: impl FnOnce(&'a RepoReport) -> Vec<(&'a str, u64)>,
) -> Result<()> {
    if repo.is_missing(metric) {
        writeln!(writer, "**{label}**: **{ERROR_MARK}**  ")?;
        return Ok(());
    }

    let entries = entries(repo);
    if entries.is_empty() {
        writeln!(writer, "**{label}**: none  ")?;
    } else {
        let list = entries.iter().map(|(name, count)| format!("`{name}` ({count})")).collect::<Vec<_>>().join(", ");
        writeln!(writer, "**{label}**: {list}  ")?;
    }

    Ok(())
}

/// Keep error text on one line so it cannot break the surrounding Markdown.
fn escape(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}
