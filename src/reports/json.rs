use super::common::{self, FIELDS};
use crate::Result;
use crate::facts::RunReport;
use core::fmt::Write;
use serde_json::json;

/// Write the run as JSON.
///
/// Each repository carries its full metric record plus a `summary` object with the
/// scalar fields in report units, where uncollected values are `null`.
#[expect(unused_results, reason = "Map::insert on fresh keys")]
pub fn generate<W: Write>(report: &RunReport, writer: &mut W) -> Result<()> {
    let mut repos = Vec::with_capacity(report.repos.len());

    for repo in &report.repos {
        let mut summary = serde_json::Map::new();
        for field in FIELDS {
            let value = common::field_value(repo, field).map_or(serde_json::Value::Null, |v| match v {
                common::FieldValue::Count(n) => json!(n),
                common::FieldValue::Decimal(f) | common::FieldValue::Percent(f) => json!(f),
                common::FieldValue::Megabytes(bytes) => json!(common::megabytes(bytes)),
            });
            summary.insert(field.key.to_string(), value);
        }

        let mut entry = serde_json::to_value(repo)?;
        if let Some(obj) = entry.as_object_mut() {
            obj.insert("url".to_string(), json!(repo.repo.html_url(&report.web_url)));
            obj.insert("summary".to_string(), json!(summary));
        }
        repos.push(entry);
    }

    let output = json!({
        "owner": report.owner,
        "branch": report.branch,
        "workflow": report.workflow,
        "window": report.window,
        "generated_at": report.generated_at,
        "failed_repositories": report.failed_repos(),
        "repositories": repos,
    });

    write!(writer, "{}", serde_json::to_string_pretty(&output)?)?;
    Ok(())
}
