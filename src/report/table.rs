//! Human-readable writer: a markdown document with the daily metrics,
//! usage breakdown, and seat tables.

use crate::analyze::OrgSummary;
use crate::model::{ReportModel, Result};
use crate::report::{artifact_name, write_atomic};
use markdown_builder::Markdown;
use markdown_table::{Heading, HeadingAlignment, MarkdownTable};
use std::path::{Path, PathBuf};

const BAR_WIDTH: usize = 20;

pub fn write(report: &ReportModel, output_dir: &Path) -> Result<PathBuf> {
    let path = output_dir.join(artifact_name(report, "report", "md"));
    write_atomic(&path, render(report).as_bytes())?;
    Ok(path)
}

pub fn render(report: &ReportModel) -> String {
    let mut doc = Markdown::new();
    doc.header1(format!(
        "Copilot usage: {} `{}`",
        report.scope.owner.label(),
        report.scope.owner_name
    ));
    doc.paragraph(format!(
        "Period: {} to {} | generated at {} | price per premium request: ${}",
        report.scope.range.since().format("%Y-%m-%d"),
        report.scope.range.until().format("%Y-%m-%d"),
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.summary.price_per_premium_request,
    ));

    doc.add_org_metrics(report);
    if report.breakdown.is_some() {
        doc.add_breakdown(report);
    }
    if report.seats.is_some() && report.breakdown.is_none() {
        doc.add_seats(report);
    }

    doc.paragraph(format!(
        "**Totals**: {} seats | {} interactions | {} code generations",
        report.summary.total_users,
        report.summary.total_interactions,
        report.summary.total_code_generations,
    ));
    doc.render()
}

/// 20-glyph consumption bar driven by the aggregator's integer percent so
/// every format shows the same number.
pub fn usage_bar(percent: Option<u8>) -> String {
    let Some(percent) = percent else {
        return "unlimited".to_string();
    };
    let filled = (percent as usize * BAR_WIDTH) / 100;
    format!(
        "{}{} {}%",
        "█".repeat(filled),
        "░".repeat(BAR_WIDTH - filled),
        percent
    )
}

trait MarkdownExt {
    fn add_org_metrics(&mut self, report: &ReportModel);
    fn add_breakdown(&mut self, report: &ReportModel);
    fn add_seats(&mut self, report: &ReportModel);
    fn add_table(&mut self, headings: Vec<&str>, rows: Vec<Vec<String>>);
}

impl MarkdownExt for Markdown {
    fn add_org_metrics(&mut self, report: &ReportModel) {
        self.header2("Daily organization metrics");
        let rows = report
            .org_metrics
            .iter()
            .map(|metric| {
                vec![
                    metric.date.format("%Y-%m-%d").to_string(),
                    metric.total_suggestions.to_string(),
                    metric.total_acceptances.to_string(),
                    metric
                        .acceptance_rate()
                        .map(|rate| format!("{rate:.1}%"))
                        .unwrap_or_else(|| "N/A".to_string()),
                    metric.active_users.to_string(),
                    metric.engaged_users.to_string(),
                ]
            })
            .collect();
        self.add_table(
            vec!["Date", "Suggestions", "Acceptances", "Rate", "Active", "Engaged"],
            rows,
        );

        let summary = OrgSummary::from_metrics(report.org_metrics.iter());
        self.paragraph(format!(
            "{} days | {} suggestions | {} acceptances ({}) | peak {} active / {} engaged users",
            summary.days,
            summary.total_suggestions,
            summary.total_acceptances,
            summary
                .acceptance_rate()
                .map(|rate| format!("{rate:.1}%"))
                .unwrap_or_else(|| "N/A".to_string()),
            summary.peak_active_users,
            summary.peak_engaged_users,
        ));
    }

    fn add_breakdown(&mut self, report: &ReportModel) {
        let Some(breakdown) = &report.breakdown else {
            return;
        };
        self.header2("Usage breakdown");
        let rows = breakdown
            .iter()
            .map(|row| {
                let mut login = format!("{} {}", row.indicator.glyph(), row.login);
                if row.pending_cancellation {
                    login.push_str(" ⚠️");
                }
                vec![
                    login,
                    row.interactions.to_string(),
                    row.code_generations.to_string(),
                    row.included_requests_cell(),
                    row.editor.clone().unwrap_or_else(|| "N/A".to_string()),
                    usage_bar(row.percent_of_quota),
                ]
            })
            .collect();
        self.add_table(
            vec!["User", "Interactions", "Code gen", "Included req", "Editor", "Usage"],
            rows,
        );
    }

    fn add_seats(&mut self, report: &ReportModel) {
        let Some(seats) = &report.seats else {
            return;
        };
        self.header2("Seats");
        let rows = seats
            .iter()
            .map(|seat| {
                vec![
                    seat.login.clone(),
                    seat.assigned_at
                        .map(|at| at.format("%Y-%m-%d").to_string())
                        .unwrap_or_else(|| "N/A".to_string()),
                    seat.last_activity_at
                        .map(|at| at.format("%Y-%m-%d").to_string())
                        .unwrap_or_else(|| "no activity".to_string()),
                    seat.editor_short().unwrap_or_else(|| "N/A".to_string()),
                    if seat.pending_cancellation {
                        "pending cancellation".to_string()
                    } else {
                        String::new()
                    },
                ]
            })
            .collect();
        self.add_table(
            vec!["Login", "Assigned", "Last activity", "Editor", "Note"],
            rows,
        );
    }

    fn add_table(&mut self, headings: Vec<&str>, rows: Vec<Vec<String>>) {
        let headings = headings
            .into_iter()
            .map(|name| Heading::new(name.to_string(), Some(HeadingAlignment::Left)))
            .collect::<Vec<_>>();
        let mut table = MarkdownTable::new(rows);
        table.with_headings(headings);
        self.paragraph(
            table
                .as_markdown()
                .expect("report tables are rectangular"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ActivityIndicator, DateRange, OwnerKind, ReportSummary, RequestScope, UsageBreakdownRow,
    };
    use chrono::{NaiveDate, Utc};

    #[test]
    fn usage_bar_buckets_by_five_percent() {
        assert_eq!(usage_bar(Some(43)), format!("{}{} 43%", "█".repeat(8), "░".repeat(12)));
        assert_eq!(usage_bar(Some(0)), format!("{} 0%", "░".repeat(20)));
        assert_eq!(usage_bar(Some(100)), format!("{} 100%", "█".repeat(20)));
        assert_eq!(usage_bar(None), "unlimited");
    }

    #[test]
    fn rendered_document_contains_the_breakdown_row() {
        let scope = RequestScope::new(
            OwnerKind::Organization,
            "armblaorg",
            "token",
            DateRange::Day(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()),
        )
        .unwrap();
        let report = ReportModel {
            scope,
            generated_at: Utc::now(),
            org_metrics: vec![],
            user_metrics: None,
            seats: Some(vec![]),
            breakdown: Some(vec![UsageBreakdownRow {
                login: "armbla_abdemo".to_string(),
                indicator: ActivityIndicator::Green,
                interactions: 77,
                code_generations: 354,
                included_requests_used: 431,
                included_requests_quota: 1000,
                percent_of_quota: Some(43),
                editor: Some("GitHubCopilotChat".to_string()),
                pending_cancellation: false,
            }]),
            summary: ReportSummary {
                total_users: 2,
                total_interactions: 77,
                total_code_generations: 354,
                price_per_premium_request: 0.04,
            },
        };

        let document = render(&report);
        assert!(document.contains("Usage breakdown"));
        assert!(document.contains("🟢 armbla_abdemo"));
        assert!(document.contains("431/1,000"));
        assert!(document.contains("43%"));
        assert!(document.contains("2 seats | 77 interactions | 354 code generations"));
    }
}
