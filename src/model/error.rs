use thiserror::Error;

pub type Result<T> = std::result::Result<T, MetricsError>;

/// Every failure the pipeline can surface. Lower layers propagate these
/// unchanged; nothing substitutes default data for a fatal error.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(
        "authorization failed (HTTP {status}): the token lacks a required scope \
         (organization metrics need `read:org`, enterprise metrics need \
         `manage_billing:copilot` or `read:enterprise`)"
    )]
    Authorization { status: u16 },

    #[error("no data available: {0}")]
    NotFound(String),

    #[error("transient failure (HTTP {status}) persisted after {attempts} attempts")]
    TransientFetch { status: u16, attempts: u32 },

    #[error("request rejected (HTTP {status}): {body}")]
    Request { status: u16, body: String },

    #[error("malformed record `{identity}`: {reason}")]
    Schema { identity: String, reason: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("background fetch task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl MetricsError {
    pub fn schema(identity: impl ToString, reason: impl ToString) -> Self {
        Self::Schema {
            identity: identity.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn configuration(message: impl ToString) -> Self {
        Self::Configuration(message.to_string())
    }
}
