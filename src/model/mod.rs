mod error;
mod metrics;
mod report;
mod scope;
mod seat;

pub use error::MetricsError;
pub use error::Result;
pub use metrics::DailyOrgMetric;
pub use metrics::DailyUserMetric;
pub use metrics::EditorCounts;
pub use report::ActivityIndicator;
pub use report::ReportModel;
pub use report::ReportSummary;
pub use report::UsageBreakdownRow;
pub use scope::DateRange;
pub use scope::OwnerKind;
pub use scope::RequestScope;
pub use seat::Seat;
