//! Structured-data writer. Field names are stable and mirror the data
//! model; the credential is never serialized.

use crate::model::{DailyOrgMetric, DailyUserMetric, ReportModel, Result, Seat, UsageBreakdownRow};
use crate::report::{artifact_name, write_atomic};
use chrono::{DateTime, FixedOffset};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};

pub fn write(report: &ReportModel, output_dir: &Path) -> Result<PathBuf> {
    let path = output_dir.join(artifact_name(report, "report", "json"));
    let document = to_value(report);
    write_atomic(&path, serde_json::to_string_pretty(&document)?.as_bytes())?;
    Ok(path)
}

pub fn to_value(report: &ReportModel) -> Value {
    json!({
        "scope": {
            "owner_kind": report.scope.owner.label(),
            "owner_name": report.scope.owner_name,
            "since": report.scope.range.since().format("%Y-%m-%d").to_string(),
            "until": report.scope.range.until().format("%Y-%m-%d").to_string(),
            "period": report.scope.range.label(),
        },
        "generated_at": report.generated_at.to_rfc3339(),
        "org_metrics": report.org_metrics.iter().map(org_metric).collect::<Vec<_>>(),
        "user_metrics": report
            .user_metrics
            .as_ref()
            .map(|metrics| metrics.iter().map(user_metric).collect::<Vec<_>>()),
        "seats": report
            .seats
            .as_ref()
            .map(|seats| seats.iter().map(seat).collect::<Vec<_>>()),
        "breakdown": report
            .breakdown
            .as_ref()
            .map(|rows| rows.iter().map(breakdown_row).collect::<Vec<_>>()),
        "summary": {
            "total_users": report.summary.total_users,
            "total_interactions": report.summary.total_interactions,
            "total_code_generations": report.summary.total_code_generations,
            "price_per_premium_request": report.summary.price_per_premium_request,
        },
    })
}

fn org_metric(metric: &DailyOrgMetric) -> Value {
    let by_editor: Map<String, Value> = metric
        .by_editor
        .iter()
        .map(|(editor, counts)| {
            (
                editor.clone(),
                json!({
                    "suggestions": counts.suggestions,
                    "acceptances": counts.acceptances,
                }),
            )
        })
        .collect();
    json!({
        "date": metric.date.format("%Y-%m-%d").to_string(),
        "total_suggestions": metric.total_suggestions,
        "total_acceptances": metric.total_acceptances,
        "total_lines_suggested": metric.total_lines_suggested,
        "total_lines_accepted": metric.total_lines_accepted,
        "active_users": metric.active_users,
        "engaged_users": metric.engaged_users,
        "acceptance_rate": metric.acceptance_rate(),
        "breakdown_by_editor": by_editor,
    })
}

fn user_metric(metric: &DailyUserMetric) -> Value {
    json!({
        "date": metric.date.format("%Y-%m-%d").to_string(),
        "login": metric.login,
        "interactions": metric.interactions,
        "code_generations": metric.code_generations,
        "code_acceptances": metric.code_acceptances,
        "lines_suggested": metric.lines_suggested,
        "lines_accepted": metric.lines_accepted,
        "last_activity_at": rfc3339(metric.last_activity_at),
    })
}

fn seat(seat: &Seat) -> Value {
    json!({
        "login": seat.login,
        "assigned_at": rfc3339(seat.assigned_at),
        "last_activity_at": rfc3339(seat.last_activity_at),
        "last_activity_editor": seat.last_activity_editor,
        "pending_cancellation": seat.pending_cancellation,
    })
}

fn breakdown_row(row: &UsageBreakdownRow) -> Value {
    json!({
        "login": row.login,
        "status": row.indicator.label(),
        "interactions": row.interactions,
        "code_generations": row.code_generations,
        "included_requests_used": row.included_requests_used,
        "included_requests_quota": row.included_requests_quota,
        "percent_of_quota": row.percent_of_quota,
        "editor": row.editor,
        "pending_cancellation": row.pending_cancellation,
    })
}

fn rfc3339(timestamp: Option<DateTime<FixedOffset>>) -> Option<String> {
    timestamp.map(|value| value.to_rfc3339())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DateRange, OwnerKind, ReportSummary, RequestScope};
    use chrono::{NaiveDate, Utc};

    fn report() -> ReportModel {
        let scope = RequestScope::new(
            OwnerKind::Organization,
            "armblaorg",
            "super-secret-token",
            DateRange::Day(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()),
        )
        .unwrap();
        ReportModel {
            scope,
            generated_at: Utc::now(),
            org_metrics: vec![],
            user_metrics: None,
            seats: None,
            breakdown: None,
            summary: ReportSummary {
                total_users: 2,
                total_interactions: 77,
                total_code_generations: 354,
                price_per_premium_request: 0.04,
            },
        }
    }

    #[test]
    fn document_has_stable_top_level_fields_and_no_credential() {
        let document = to_value(&report());
        assert_eq!(document["scope"]["owner_kind"], "org");
        assert_eq!(document["scope"]["owner_name"], "armblaorg");
        assert_eq!(document["scope"]["since"], "2026-01-15");
        assert_eq!(document["summary"]["total_interactions"], 77);
        assert!(document["user_metrics"].is_null());

        let rendered = serde_json::to_string(&document).unwrap();
        assert!(!rendered.contains("super-secret-token"));
    }

    #[test]
    fn writes_the_document_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&report(), dir.path()).unwrap();
        assert!(path.file_name().unwrap().to_str().unwrap().starts_with("org_report_2026-01-15_"));
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"total_users\": 2"));
    }
}
