use crate::analyze::{Analyzer, UsageAnalysis};
use crate::model::{
    DailyOrgMetric, DailyUserMetric, MetricsError, ReportModel, RequestScope, Result, Seat,
};
use chrono::Utc;

/// Assembles the final report from the fetched sections. Purely
/// structural: the aggregation itself lives in `analyze`.
///
/// A breakdown without a fetched seat list is a precondition violation,
/// rejected before any aggregation runs.
pub fn build_report(
    scope: RequestScope,
    mut org_metrics: Vec<DailyOrgMetric>,
    user_metrics: Option<Vec<DailyUserMetric>>,
    seats: Option<Vec<Seat>>,
    want_breakdown: bool,
) -> Result<ReportModel> {
    if want_breakdown && seats.is_none() {
        return Err(MetricsError::configuration(
            "a usage breakdown needs the seat list; fetch seats along with the breakdown",
        ));
    }

    // The normalizer preserves API order; the report is date-ordered.
    org_metrics.sort_by_key(|metric| metric.date);

    let mut analysis = UsageAnalysis::new(scope.clone());
    analysis.insert_org_metrics(org_metrics);
    if let Some(user_metrics) = &user_metrics {
        analysis.insert_user_metrics(user_metrics.clone());
    }
    if let Some(seats) = &seats {
        analysis.insert_seats(seats.clone());
    }

    let rows = if seats.is_some() {
        analysis.build_breakdown()
    } else {
        vec![]
    };
    let summary = analysis.summarize(&rows);

    Ok(ReportModel {
        scope,
        generated_at: Utc::now(),
        org_metrics: analysis.org_metrics,
        user_metrics,
        seats,
        breakdown: want_breakdown.then_some(rows),
        summary,
    })
}
