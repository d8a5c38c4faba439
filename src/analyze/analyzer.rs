use crate::analyze::{
    ActivityThresholds, UsageAnalysis, UserActivity, INCLUDED_REQUEST_QUOTA,
    PRICE_PER_PREMIUM_REQUEST,
};
use crate::model::{ActivityIndicator, ReportSummary, Seat, UsageBreakdownRow};
use chrono::NaiveDate;
use indexmap::IndexMap;
use itertools::Itertools;

pub trait Analyzer {
    fn build_breakdown(&self) -> Vec<UsageBreakdownRow>;
    fn summarize(&self, breakdown: &[UsageBreakdownRow]) -> ReportSummary;
}

impl Analyzer for UsageAnalysis {
    fn build_breakdown(&self) -> Vec<UsageBreakdownRow> {
        let activity = self.fold_user_activity();
        let as_of = self.scope.range.until();

        self.seats
            .iter()
            .map(|seat| {
                // A seat with no matching metrics still gets a row; the
                // join never fails.
                let totals = activity.get(seat.login.as_str()).cloned().unwrap_or_default();
                let used = totals.interactions + totals.code_generations;
                UsageBreakdownRow {
                    login: seat.login.clone(),
                    indicator: indicator_for(seat, &totals, as_of, &self.thresholds),
                    interactions: totals.interactions,
                    code_generations: totals.code_generations,
                    included_requests_used: used,
                    included_requests_quota: INCLUDED_REQUEST_QUOTA,
                    percent_of_quota: percent_of_quota(used, INCLUDED_REQUEST_QUOTA),
                    editor: seat.editor_short(),
                    pending_cancellation: seat.pending_cancellation,
                }
            })
            .sorted_by(|a, b| {
                b.interactions
                    .cmp(&a.interactions)
                    .then_with(|| a.login.to_lowercase().cmp(&b.login.to_lowercase()))
            })
            .collect()
    }

    fn summarize(&self, breakdown: &[UsageBreakdownRow]) -> ReportSummary {
        ReportSummary {
            total_users: self.seats.len(),
            total_interactions: breakdown.iter().map(|row| row.interactions).sum(),
            total_code_generations: breakdown.iter().map(|row| row.code_generations).sum(),
            price_per_premium_request: PRICE_PER_PREMIUM_REQUEST,
        }
    }
}

trait AnalyzerExtension {
    fn fold_user_activity(&self) -> IndexMap<String, UserActivity>;
}

impl AnalyzerExtension for UsageAnalysis {
    fn fold_user_activity(&self) -> IndexMap<String, UserActivity> {
        let mut by_login: IndexMap<String, UserActivity> = IndexMap::new();
        for metric in self
            .user_metrics
            .iter()
            .filter(|metric| self.scope.range.contains(metric.date))
        {
            by_login.entry(metric.login.clone()).or_default().absorb(metric);
        }
        by_login
    }
}

/// Quota consumption as a whole-number percentage, clamped to 0..=100.
/// Computed once here so every writer renders the identical number.
/// `None` when the quota is uncapped.
pub fn percent_of_quota(used: u64, quota: u64) -> Option<u8> {
    if quota == 0 {
        return None;
    }
    let percent = (used as f64 / quota as f64 * 100.0).round();
    Some(percent.clamp(0.0, 100.0) as u8)
}

fn indicator_for(
    seat: &Seat,
    totals: &UserActivity,
    as_of: NaiveDate,
    thresholds: &ActivityThresholds,
) -> ActivityIndicator {
    if totals.interactions > 0 || totals.code_generations > 0 {
        return ActivityIndicator::Green;
    }

    // Most recent signal wins: metric activity, then the seat's own
    // activity timestamp, then the assignment date.
    let last_seen = [totals.last_activity_at, seat.last_activity_at]
        .into_iter()
        .flatten()
        .max();
    let Some(reference) = last_seen.or(seat.assigned_at) else {
        return ActivityIndicator::Red;
    };
    if seat.pending_cancellation {
        return ActivityIndicator::Red;
    }

    let silent_days = (as_of - reference.date_naive()).num_days();
    if silent_days < thresholds.stale_after_days {
        // Recent activity is green; a freshly assigned seat that has never
        // been used is merely stale.
        if last_seen.is_some() {
            ActivityIndicator::Green
        } else {
            ActivityIndicator::Yellow
        }
    } else if silent_days < thresholds.inactive_after_days {
        ActivityIndicator::Yellow
    } else {
        ActivityIndicator::Red
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DailyUserMetric, DateRange, OwnerKind, RequestScope};
    use chrono::{DateTime, NaiveDate};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn analysis_for_day(day: &str) -> UsageAnalysis {
        let scope = RequestScope::new(
            OwnerKind::Organization,
            "armblaorg",
            "token",
            DateRange::Day(date(day)),
        )
        .unwrap();
        UsageAnalysis::new(scope)
    }

    fn seat(login: &str, last_activity: Option<&str>, assigned: Option<&str>) -> Seat {
        Seat {
            login: login.to_string(),
            assigned_at: assigned.map(|s| DateTime::parse_from_rfc3339(s).unwrap()),
            last_activity_at: last_activity.map(|s| DateTime::parse_from_rfc3339(s).unwrap()),
            last_activity_editor: None,
            pending_cancellation: false,
        }
    }

    fn user_day(login: &str, day: &str, interactions: u64, code_gen: u64) -> DailyUserMetric {
        DailyUserMetric {
            date: date(day),
            login: login.to_string(),
            interactions,
            code_generations: code_gen,
            code_acceptances: 0,
            lines_suggested: 0,
            lines_accepted: 0,
            last_activity_at: None,
        }
    }

    #[test]
    fn percent_of_quota_rounds_and_clamps() {
        assert_eq!(percent_of_quota(431, 1000), Some(43));
        assert_eq!(percent_of_quota(435, 1000), Some(44));
        assert_eq!(percent_of_quota(0, 1000), Some(0));
        assert_eq!(percent_of_quota(2500, 1000), Some(100));
        assert_eq!(percent_of_quota(431, 0), None);
    }

    #[test]
    fn breakdown_sorts_by_interactions_then_login_case_insensitively() {
        let mut analysis = analysis_for_day("2026-01-15");
        analysis.insert_seats(vec![
            seat("Armbla_ABDemo", None, None),
            seat("zeta_abdemo", None, None),
            seat("admin_abdemo", None, None),
        ]);
        analysis.insert_user_metrics(vec![user_day("zeta_abdemo", "2026-01-15", 9, 0)]);

        let rows = analysis.build_breakdown();
        let order: Vec<&str> = rows.iter().map(|row| row.login.as_str()).collect();
        assert_eq!(order, vec!["zeta_abdemo", "admin_abdemo", "Armbla_ABDemo"]);
    }

    #[test]
    fn ghost_seat_joins_to_an_all_zero_row() {
        let mut analysis = analysis_for_day("2026-01-15");
        analysis.insert_seats(vec![seat(
            "ghost_user",
            None,
            Some("2025-10-01T00:00:00Z"),
        )]);

        let rows = analysis.build_breakdown();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.interactions, 0);
        assert_eq!(row.code_generations, 0);
        assert_eq!(row.included_requests_used, 0);
        assert_eq!(row.percent_of_quota, Some(0));
        assert_eq!(row.indicator, ActivityIndicator::Red);
    }

    #[test]
    fn indicator_tiers_follow_silence_length() {
        let mut analysis = analysis_for_day("2026-01-28");
        analysis.insert_seats(vec![
            // Active two days before the reporting day.
            seat("recent", Some("2026-01-26T08:00:00Z"), None),
            // Silent for ten days.
            seat("stale", Some("2026-01-18T08:00:00Z"), None),
            // Silent for two months.
            seat("gone", Some("2025-11-20T08:00:00Z"), None),
            // Assigned three days ago, never used.
            seat("fresh", None, Some("2026-01-25T08:00:00Z")),
            // No signal at all.
            seat("void", None, None),
        ]);

        let by_login: IndexMap<String, ActivityIndicator> = analysis
            .build_breakdown()
            .into_iter()
            .map(|row| (row.login, row.indicator))
            .collect();
        assert_eq!(by_login["recent"], ActivityIndicator::Green);
        assert_eq!(by_login["stale"], ActivityIndicator::Yellow);
        assert_eq!(by_login["gone"], ActivityIndicator::Red);
        assert_eq!(by_login["fresh"], ActivityIndicator::Yellow);
        assert_eq!(by_login["void"], ActivityIndicator::Red);
    }

    #[test]
    fn most_recent_activity_wins_over_a_stale_seat_timestamp() {
        let mut analysis = analysis_for_day("2026-01-28");
        // The seat record is months out of date, but the metrics show use
        // on the reporting day itself.
        analysis.insert_seats(vec![seat(
            "armbla_abdemo",
            Some("2025-10-01T00:00:00Z"),
            None,
        )]);
        analysis.insert_user_metrics(vec![user_day("armbla_abdemo", "2026-01-28", 1, 0)]);

        let rows = analysis.build_breakdown();
        assert_eq!(rows[0].indicator, ActivityIndicator::Green);
    }

    #[test]
    fn pending_cancellation_without_usage_is_red() {
        let mut analysis = analysis_for_day("2026-01-28");
        let mut cancelled = seat("leaving", Some("2026-01-27T08:00:00Z"), None);
        cancelled.pending_cancellation = true;
        let mut active_cancelled = seat("busy_leaver", Some("2026-01-27T08:00:00Z"), None);
        active_cancelled.pending_cancellation = true;
        analysis.insert_seats(vec![cancelled, active_cancelled]);
        analysis.insert_user_metrics(vec![user_day("busy_leaver", "2026-01-28", 5, 0)]);

        let by_login: IndexMap<String, ActivityIndicator> = analysis
            .build_breakdown()
            .into_iter()
            .map(|row| (row.login, row.indicator))
            .collect();
        assert_eq!(by_login["leaving"], ActivityIndicator::Red);
        assert_eq!(by_login["busy_leaver"], ActivityIndicator::Green);
    }

    #[test]
    fn metrics_outside_the_range_do_not_count() {
        let mut analysis = analysis_for_day("2026-01-15");
        analysis.insert_seats(vec![seat("armbla_abdemo", None, None)]);
        analysis.insert_user_metrics(vec![
            user_day("armbla_abdemo", "2026-01-14", 50, 0),
            user_day("armbla_abdemo", "2026-01-15", 7, 3),
        ]);

        let rows = analysis.build_breakdown();
        assert_eq!(rows[0].interactions, 7);
        assert_eq!(rows[0].included_requests_used, 10);
    }

    #[test]
    fn summary_counts_all_seats_and_sums_breakdown() {
        let mut analysis = analysis_for_day("2026-01-15");
        analysis.insert_seats(vec![
            seat("armbla_abdemo", None, None),
            seat("admin_abdemo", None, None),
        ]);
        analysis.insert_user_metrics(vec![
            user_day("armbla_abdemo", "2026-01-15", 77, 354),
        ]);

        let breakdown = analysis.build_breakdown();
        let summary = analysis.summarize(&breakdown);
        assert_eq!(summary.total_users, 2);
        assert_eq!(summary.total_interactions, 77);
        assert_eq!(summary.total_code_generations, 354);
        assert_eq!(summary.price_per_premium_request, PRICE_PER_PREMIUM_REQUEST);
    }
}
