//! Delimited writer: one row per breakdown entry, or per daily user
//! metric when no breakdown was built, or per org day as a last resort.

use crate::model::{MetricsError, ReportModel, Result};
use crate::report::{artifact_name, write_atomic};
use std::path::{Path, PathBuf};

pub fn write(report: &ReportModel, output_dir: &Path) -> Result<PathBuf> {
    let (section, contents) = render(report)?;
    let path = output_dir.join(artifact_name(report, section, "csv"));
    write_atomic(&path, &contents)?;
    Ok(path)
}

fn render(report: &ReportModel) -> Result<(&'static str, Vec<u8>)> {
    let mut writer = csv::Writer::from_writer(vec![]);

    let section = if let Some(breakdown) = &report.breakdown {
        writer.write_record([
            "login",
            "interactions",
            "code_generations",
            "included_requests",
            "editor",
            "status",
        ])?;
        for row in breakdown {
            writer.write_record([
                row.login.as_str(),
                &row.interactions.to_string(),
                &row.code_generations.to_string(),
                &row.included_requests_cell(),
                row.editor.as_deref().unwrap_or(""),
                row.indicator.label(),
            ])?;
        }
        "breakdown"
    } else if let Some(user_metrics) = &report.user_metrics {
        writer.write_record([
            "date",
            "login",
            "interactions",
            "code_generations",
            "code_acceptances",
            "lines_suggested",
            "lines_accepted",
        ])?;
        for metric in user_metrics {
            writer.write_record([
                &metric.date.format("%Y-%m-%d").to_string(),
                metric.login.as_str(),
                &metric.interactions.to_string(),
                &metric.code_generations.to_string(),
                &metric.code_acceptances.to_string(),
                &metric.lines_suggested.to_string(),
                &metric.lines_accepted.to_string(),
            ])?;
        }
        "users"
    } else {
        writer.write_record([
            "date",
            "total_suggestions",
            "total_acceptances",
            "total_lines_suggested",
            "total_lines_accepted",
            "active_users",
            "engaged_users",
        ])?;
        for metric in &report.org_metrics {
            writer.write_record([
                &metric.date.format("%Y-%m-%d").to_string(),
                &metric.total_suggestions.to_string(),
                &metric.total_acceptances.to_string(),
                &metric.total_lines_suggested.to_string(),
                &metric.total_lines_accepted.to_string(),
                &metric.active_users.to_string(),
                &metric.engaged_users.to_string(),
            ])?;
        }
        "metrics"
    };

    let contents = writer
        .into_inner()
        .map_err(|error| MetricsError::Io(error.into_error()))?;
    Ok((section, contents))
}
