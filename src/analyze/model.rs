use crate::model::{DailyOrgMetric, DailyUserMetric, RequestScope, Seat};
use chrono::{DateTime, FixedOffset, NaiveTime};

/// Premium interactions included per user per billing period.
pub const INCLUDED_REQUEST_QUOTA: u64 = 1000;
/// Charge for each premium request beyond the included quota.
pub const PRICE_PER_PREMIUM_REQUEST: f64 = 0.04;

/// Day counts behind the three-tier activity indicator. Kept as data
/// rather than hard invariants until confirmed against live semantics.
#[derive(Debug, Clone, Copy)]
pub struct ActivityThresholds {
    pub stale_after_days: i64,
    pub inactive_after_days: i64,
}

impl Default for ActivityThresholds {
    fn default() -> Self {
        Self {
            stale_after_days: 7,
            inactive_after_days: 28,
        }
    }
}

/// Everything the aggregation stage works from: the resolved scope plus
/// the normalized record sets inserted after each fetch completes.
#[derive(Debug, Clone)]
pub struct UsageAnalysis {
    pub scope: RequestScope,
    pub thresholds: ActivityThresholds,
    pub org_metrics: Vec<DailyOrgMetric>,
    pub user_metrics: Vec<DailyUserMetric>,
    pub seats: Vec<Seat>,
}

impl UsageAnalysis {
    pub fn new(scope: RequestScope) -> Self {
        Self {
            scope,
            thresholds: ActivityThresholds::default(),
            org_metrics: Vec::new(),
            user_metrics: Vec::new(),
            seats: Vec::new(),
        }
    }

    pub fn insert_org_metrics(&mut self, metrics: Vec<DailyOrgMetric>) {
        self.org_metrics = metrics;
    }

    pub fn insert_user_metrics(&mut self, metrics: Vec<DailyUserMetric>) {
        self.user_metrics = metrics;
    }

    pub fn insert_seats(&mut self, seats: Vec<Seat>) {
        self.seats = seats;
    }
}

/// Organization totals over the reporting period. Counter fields are
/// summed; active/engaged users are distinct-per-day counts, so the
/// summary keeps the peak day instead of a double-counting sum.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrgSummary {
    pub days: usize,
    pub total_suggestions: u64,
    pub total_acceptances: u64,
    pub total_lines_suggested: u64,
    pub total_lines_accepted: u64,
    pub peak_active_users: u64,
    pub peak_engaged_users: u64,
}

impl OrgSummary {
    pub fn from_metrics<'a>(metrics: impl Iterator<Item = &'a DailyOrgMetric>) -> Self {
        metrics.fold(Self::default(), |mut acc, metric| {
            acc.days += 1;
            acc.total_suggestions += metric.total_suggestions;
            acc.total_acceptances += metric.total_acceptances;
            acc.total_lines_suggested += metric.total_lines_suggested;
            acc.total_lines_accepted += metric.total_lines_accepted;
            acc.peak_active_users = acc.peak_active_users.max(metric.active_users);
            acc.peak_engaged_users = acc.peak_engaged_users.max(metric.engaged_users);
            acc
        })
    }

    pub fn acceptance_rate(&self) -> Option<f64> {
        if self.total_suggestions == 0 {
            return None;
        }
        Some(self.total_acceptances as f64 / self.total_suggestions as f64 * 100.0)
    }
}

/// Per-login fold of the in-range daily user metrics.
#[derive(Debug, Clone, Default)]
pub struct UserActivity {
    pub interactions: u64,
    pub code_generations: u64,
    pub last_activity_at: Option<DateTime<FixedOffset>>,
}

impl UserActivity {
    pub fn absorb(&mut self, metric: &DailyUserMetric) {
        self.interactions += metric.interactions;
        self.code_generations += metric.code_generations;

        let active_day = metric.interactions > 0
            || metric.code_generations > 0
            || metric.code_acceptances > 0;
        let seen = metric.last_activity_at.or_else(|| {
            active_day.then(|| {
                metric
                    .date
                    .and_time(NaiveTime::MIN)
                    .and_utc()
                    .fixed_offset()
            })
        });
        self.last_activity_at = self.last_activity_at.max(seen);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn metric(date: &str, interactions: u64) -> DailyUserMetric {
        DailyUserMetric {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            login: "armbla_abdemo".to_string(),
            interactions,
            code_generations: 0,
            code_acceptances: 0,
            lines_suggested: 0,
            lines_accepted: 0,
            last_activity_at: None,
        }
    }

    fn org_day(day: &str, suggestions: u64, acceptances: u64, active: u64) -> DailyOrgMetric {
        DailyOrgMetric {
            date: NaiveDate::parse_from_str(day, "%Y-%m-%d").unwrap(),
            total_suggestions: suggestions,
            total_acceptances: acceptances,
            total_lines_suggested: suggestions * 3,
            total_lines_accepted: acceptances * 3,
            active_users: active,
            engaged_users: active / 2,
            by_editor: indexmap::IndexMap::new(),
        }
    }

    #[test]
    fn org_summary_sums_counters_and_keeps_peak_users() {
        let days = vec![
            org_day("2026-01-14", 100, 40, 12),
            org_day("2026-01-15", 50, 10, 20),
        ];
        let summary = OrgSummary::from_metrics(days.iter());
        assert_eq!(summary.days, 2);
        assert_eq!(summary.total_suggestions, 150);
        assert_eq!(summary.total_acceptances, 50);
        assert_eq!(summary.total_lines_suggested, 450);
        assert_eq!(summary.peak_active_users, 20);
        assert_eq!(summary.peak_engaged_users, 10);
        assert!((summary.acceptance_rate().unwrap() - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn empty_org_summary_has_no_acceptance_rate() {
        let summary = OrgSummary::from_metrics(std::iter::empty());
        assert_eq!(summary.days, 0);
        assert_eq!(summary.acceptance_rate(), None);
    }

    #[test]
    fn absorb_sums_counts_and_keeps_latest_activity() {
        let mut activity = UserActivity::default();
        activity.absorb(&metric("2026-01-14", 3));
        activity.absorb(&metric("2026-01-15", 4));
        activity.absorb(&metric("2026-01-16", 0));

        assert_eq!(activity.interactions, 7);
        assert_eq!(
            activity.last_activity_at.map(|t| t.date_naive()),
            Some(NaiveDate::parse_from_str("2026-01-15", "%Y-%m-%d").unwrap())
        );
    }
}
