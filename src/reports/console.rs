use super::common::{self, ERROR_MARK, FIELDS};
use crate::Result;
use crate::facts::{RepoReport, RunReport};
use core::fmt::Write;
use owo_colors::OwoColorize;

pub fn generate<W: Write>(report: &RunReport, use_colors: bool, writer: &mut W) -> Result<()> {
    let title = format!("Repository metrics for {} ({})", report.owner, report.window);
    if use_colors {
        writeln!(writer, "{}", title.bold())?;
    } else {
        writeln!(writer, "{title}")?;
    }

    let width = FIELDS.iter().map(|f| f.label.len()).max().unwrap_or(0);

    for (area, repos) in report.by_area() {
        writeln!(writer)?;
        if use_colors {
            writeln!(writer, "{}", area.bold().cyan())?;
        } else {
            writeln!(writer, "{area}")?;
        }

        for repo in repos {
            write_repo(repo, width, use_colors, writer)?;
        }
    }

    let failed = report.failed_repos();
    if failed > 0 {
        writeln!(writer)?;
        let line = format!("{failed} of {} repositories could not be collected", report.repos.len());
        if use_colors {
            writeln!(writer, "{}", line.red())?;
        } else {
            writeln!(writer, "{line}")?;
        }
    }

    Ok(())
}

fn write_repo<W: Write>(repo: &RepoReport, width: usize, use_colors: bool, writer: &mut W) -> Result<()> {
    let error_mark = if use_colors {
        ERROR_MARK.red().bold().to_string()
    } else {
        ERROR_MARK.to_string()
    };

    if let Some(error) = &repo.error {
        writeln!(writer, "  {} : {error_mark} {error}", repo.repo)?;
        return Ok(());
    }

    if use_colors {
        writeln!(writer, "  {}", repo.repo.green())?;
    } else {
        writeln!(writer, "  {}", repo.repo)?;
    }

    for field in FIELDS {
        let value = common::field_value(repo, field).map_or_else(|| error_mark.clone(), common::format_value);
        writeln!(writer, "    {:<width$} : {value}", field.label)?;
    }

    for (metric, reason) in &repo.failures {
        if use_colors {
            writeln!(writer, "    {} {}", "!".yellow(), format!("{}: {reason}", metric.description()).dimmed())?;
        } else {
            writeln!(writer, "    ! {}: {reason}", metric.description())?;
        }
    }

    Ok(())
}
