pub mod analyzer;
mod model;

pub use analyzer::Analyzer;
pub use model::ActivityThresholds;
pub use model::OrgSummary;
pub use model::UsageAnalysis;
pub use model::UserActivity;
pub use model::INCLUDED_REQUEST_QUOTA;
pub use model::PRICE_PER_PREMIUM_REQUEST;
