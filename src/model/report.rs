use crate::model::{DailyOrgMetric, DailyUserMetric, RequestScope, Seat};
use chrono::{DateTime, Utc};

/// Three-tier activity signal for one seat, derived by the aggregator.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ActivityIndicator {
    /// Used the assistant within the reporting period (or just before it).
    Green,
    /// Seat assigned, but silent for a stretch.
    Yellow,
    /// No sign of life for the whole inactivity horizon, or a pending
    /// cancellation with no usage.
    Red,
}

impl ActivityIndicator {
    pub fn glyph(&self) -> &'static str {
        match self {
            ActivityIndicator::Green => "🟢",
            ActivityIndicator::Yellow => "🟡",
            ActivityIndicator::Red => "🔴",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActivityIndicator::Green => "active",
            ActivityIndicator::Yellow => "stale",
            ActivityIndicator::Red => "inactive",
        }
    }
}

/// One user's aggregated usage for the reporting period.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageBreakdownRow {
    pub login: String,
    pub indicator: ActivityIndicator,
    pub interactions: u64,
    pub code_generations: u64,
    pub included_requests_used: u64,
    pub included_requests_quota: u64,
    /// Rounded used/quota percentage clamped to 0..=100; `None` means the
    /// quota is uncapped and renders as "unlimited".
    pub percent_of_quota: Option<u8>,
    pub editor: Option<String>,
    pub pending_cancellation: bool,
}

impl UsageBreakdownRow {
    /// `"431/1,000"`-style cell for the included-requests column.
    pub fn included_requests_cell(&self) -> String {
        if self.included_requests_quota == 0 {
            return format!("{}/unlimited", group_thousands(self.included_requests_used));
        }
        format!(
            "{}/{}",
            group_thousands(self.included_requests_used),
            group_thousands(self.included_requests_quota)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportSummary {
    pub total_users: usize,
    pub total_interactions: u64,
    pub total_code_generations: u64,
    pub price_per_premium_request: f64,
}

/// Final in-memory report, assembled once per invocation and handed to the
/// output writers.
#[derive(Debug, Clone)]
pub struct ReportModel {
    pub scope: RequestScope,
    pub generated_at: DateTime<Utc>,
    pub org_metrics: Vec<DailyOrgMetric>,
    pub user_metrics: Option<Vec<DailyUserMetric>>,
    pub seats: Option<Vec<Seat>>,
    pub breakdown: Option<Vec<UsageBreakdownRow>>,
    pub summary: ReportSummary,
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::new();
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
