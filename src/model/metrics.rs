use chrono::{DateTime, FixedOffset, NaiveDate};
use indexmap::IndexMap;

/// Suggestion/acceptance counters for one editor.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct EditorCounts {
    pub suggestions: u64,
    pub acceptances: u64,
}

/// One day of organization-level activity.
///
/// Invariants (enforced by the normalizer): `total_acceptances` never
/// exceeds `total_suggestions`, `engaged_users` never exceeds
/// `active_users`.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyOrgMetric {
    pub date: NaiveDate,
    pub total_suggestions: u64,
    pub total_acceptances: u64,
    pub total_lines_suggested: u64,
    pub total_lines_accepted: u64,
    pub active_users: u64,
    pub engaged_users: u64,
    pub by_editor: IndexMap<String, EditorCounts>,
}

impl DailyOrgMetric {
    /// Acceptances as a percentage of suggestions, `None` on an empty day.
    pub fn acceptance_rate(&self) -> Option<f64> {
        if self.total_suggestions == 0 {
            return None;
        }
        Some(self.total_acceptances as f64 / self.total_suggestions as f64 * 100.0)
    }
}

/// One day of activity for one user.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyUserMetric {
    pub date: NaiveDate,
    pub login: String,
    pub interactions: u64,
    pub code_generations: u64,
    pub code_acceptances: u64,
    pub lines_suggested: u64,
    pub lines_accepted: u64,
    pub last_activity_at: Option<DateTime<FixedOffset>>,
}
