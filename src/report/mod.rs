mod builder;
pub mod csv;
pub mod json;
pub mod table;

pub use builder::build_report;

use crate::model::{ReportModel, RequestScope, Result};
use clap::ValueEnum;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "md",
        }
    }
}

/// Persists the report in the requested format, returning the artifact
/// path.
pub fn write_report(report: &ReportModel, format: OutputFormat, output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;
    match format {
        OutputFormat::Json => json::write(report, output_dir),
        OutputFormat::Csv => csv::write(report, output_dir),
        OutputFormat::Text => table::write(report, output_dir),
    }
}

/// `{scope-kind}_{section}_{day-or-window}_{timestamp}.{ext}`.
pub fn artifact_name(report: &ReportModel, section: &str, extension: &str) -> String {
    let RequestScope { owner, range, .. } = &report.scope;
    format!(
        "{}_{}_{}_{}.{}",
        owner.label(),
        section,
        range.label(),
        report.generated_at.format("%Y%m%d_%H%M%S"),
        extension
    )
}

/// Content lands in a `.tmp` sibling first and is renamed into place, so a
/// cancelled run never leaves a partial artifact behind.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
