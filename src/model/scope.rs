use crate::model::{MetricsError, Result};
use chrono::{Days, NaiveDate};

pub const TRAILING_WINDOW_DAYS: u64 = 28;

#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
pub enum OwnerKind {
    Organization,
    Enterprise,
}

impl OwnerKind {
    pub fn url_segment(&self) -> &'static str {
        match self {
            OwnerKind::Organization => "orgs",
            OwnerKind::Enterprise => "enterprises",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OwnerKind::Organization => "org",
            OwnerKind::Enterprise => "enterprise",
        }
    }
}

/// Reporting period: a fixed single day, or the trailing 28-day window
/// ending yesterday (the API never has same-day data).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DateRange {
    Day(NaiveDate),
    Trailing28 { until: NaiveDate },
}

// Create
impl DateRange {
    pub fn trailing_28(today: NaiveDate) -> Self {
        let until = today.pred_opt().unwrap_or(today);
        Self::Trailing28 { until }
    }

    /// Resolves the `--day`/`--window` flags. The two are mutually
    /// exclusive; absent both, the trailing window is the default.
    pub fn from_flags(day: Option<NaiveDate>, window: bool, today: NaiveDate) -> Result<Self> {
        match (day, window) {
            (Some(_), true) => Err(MetricsError::configuration(
                "`--day` and `--window` are mutually exclusive; pick one reporting period",
            )),
            (Some(day), false) => Ok(Self::Day(day)),
            (None, _) => Ok(Self::trailing_28(today)),
        }
    }
}

impl DateRange {
    pub fn since(&self) -> NaiveDate {
        match self {
            DateRange::Day(day) => *day,
            DateRange::Trailing28 { until } => until
                .checked_sub_days(Days::new(TRAILING_WINDOW_DAYS - 1))
                .unwrap_or(*until),
        }
    }

    pub fn until(&self) -> NaiveDate {
        match self {
            DateRange::Day(day) => *day,
            DateRange::Trailing28 { until } => *until,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.since() && date <= self.until()
    }

    /// Query parameters sent to the API. The trailing window sends none:
    /// it is the server-side default period.
    pub fn query(&self) -> Vec<(String, String)> {
        match self {
            DateRange::Day(day) => vec![
                ("since".to_string(), day.format("%Y-%m-%d").to_string()),
                ("until".to_string(), day.format("%Y-%m-%d").to_string()),
            ],
            DateRange::Trailing28 { .. } => vec![],
        }
    }

    pub fn label(&self) -> String {
        match self {
            DateRange::Day(day) => day.format("%Y-%m-%d").to_string(),
            DateRange::Trailing28 { .. } => "28day".to_string(),
        }
    }
}

/// Resolved invocation scope, constructed once and threaded through every
/// stage. No stage reads ambient configuration.
#[derive(Debug, Clone)]
pub struct RequestScope {
    pub owner: OwnerKind,
    pub owner_name: String,
    pub credential: String,
    pub range: DateRange,
}

// Create
impl RequestScope {
    pub fn new(
        owner: OwnerKind,
        owner_name: impl ToString,
        credential: impl ToString,
        range: DateRange,
    ) -> Result<Self> {
        let owner_name = owner_name.to_string();
        let credential = credential.to_string();
        if owner_name.is_empty() {
            return Err(MetricsError::configuration(match owner {
                OwnerKind::Organization => {
                    "no organization given; set GITHUB_ORG in `.env` or pass `--org`"
                }
                OwnerKind::Enterprise => {
                    "no enterprise given; set GITHUB_ENTERPRISE in `.env` or pass `--enterprise`"
                }
            }));
        }
        if credential.is_empty() {
            return Err(MetricsError::configuration(
                "no credential given; set GITHUB_TOKEN in `.env` or pass `--token`",
            ));
        }
        Ok(Self {
            owner,
            owner_name,
            credential,
            range,
        })
    }
}

// Resolver
impl RequestScope {
    /// `/orgs/{name}` or `/enterprises/{name}`.
    pub fn base_path(&self) -> String {
        format!("/{}/{}", self.owner.url_segment(), self.owner_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn trailing_window_ends_yesterday() {
        let range = DateRange::trailing_28(date("2026-02-10"));
        assert_eq!(range.until(), date("2026-02-09"));
        assert_eq!(range.since(), date("2026-01-13"));
        assert!(range.contains(date("2026-01-13")));
        assert!(!range.contains(date("2026-02-10")));
    }

    #[test]
    fn day_and_window_are_mutually_exclusive() {
        let result = DateRange::from_flags(Some(date("2026-01-15")), true, date("2026-02-10"));
        assert!(matches!(result, Err(MetricsError::Configuration(_))));
    }

    #[test]
    fn day_mode_sends_since_and_until() {
        let range =
            DateRange::from_flags(Some(date("2026-01-15")), false, date("2026-02-10")).unwrap();
        assert_eq!(
            range.query(),
            vec![
                ("since".to_string(), "2026-01-15".to_string()),
                ("until".to_string(), "2026-01-15".to_string()),
            ]
        );
        assert_eq!(range.label(), "2026-01-15");
    }

    #[test]
    fn window_mode_sends_no_period_params() {
        let range = DateRange::from_flags(None, false, date("2026-02-10")).unwrap();
        assert!(range.query().is_empty());
        assert_eq!(range.label(), "28day");
    }

    #[test]
    fn scope_paths() {
        let range = DateRange::trailing_28(date("2026-02-10"));
        let org = RequestScope::new(OwnerKind::Organization, "armblaorg", "tok", range).unwrap();
        assert_eq!(org.base_path(), "/orgs/armblaorg");

        let ent = RequestScope::new(OwnerKind::Enterprise, "armblacorp", "tok", range).unwrap();
        assert_eq!(ent.base_path(), "/enterprises/armblacorp");
    }

    #[test]
    fn scope_rejects_missing_pieces() {
        let range = DateRange::trailing_28(date("2026-02-10"));
        assert!(matches!(
            RequestScope::new(OwnerKind::Organization, "", "tok", range),
            Err(MetricsError::Configuration(_))
        ));
        assert!(matches!(
            RequestScope::new(OwnerKind::Organization, "armblaorg", "", range),
            Err(MetricsError::Configuration(_))
        ));
    }
}
