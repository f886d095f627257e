use super::common::{self, ERROR_MARK, FIELDS};
use crate::Result;
use crate::facts::RunReport;
use core::fmt::Write;
use ohno::IntoAppError;

/// Write one row per repository, with a column per scalar field.
pub fn generate<W: Write>(report: &RunReport, writer: &mut W) -> Result<()> {
    let mut out = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["area", "repository", "status"];
    header.extend(FIELDS.iter().map(|f| f.key));
    header.extend(["contributors", "failures"]);
    out.write_record(&header).into_app_err("writing CSV header")?;

    for repo in &report.repos {
        let mut row = Vec::with_capacity(header.len());
        row.push(repo.area.clone());
        row.push(repo.repo.to_string());
        row.push(repo.error.as_ref().map_or_else(|| "ok".to_string(), |e| format!("{ERROR_MARK}: {e}")));

        for field in FIELDS {
            row.push(common::field_value(repo, field).map_or_else(|| ERROR_MARK.to_string(), common::format_plain));
        }

        row.push(repo.metrics.contributors.join(" "));
        row.push(
            repo.failures
                .iter()
                .map(|(metric, reason)| format!("{metric}: {reason}"))
                .collect::<Vec<_>>()
                .join("; "),
        );

        out.write_record(&row).into_app_err_with(|| format!("writing CSV row for '{}'", repo.repo))?;
    }

    let bytes = out.into_inner().into_app_err("flushing CSV output")?;
    write!(writer, "{}", String::from_utf8(bytes).into_app_err("CSV output is not UTF-8")?)?;
    Ok(())
}
