//! Failure classification.
//!
//! Every content-source error passes through here before propagating.
//! The policy separates three outcomes: the remote is unreachable (worth
//! retrying, unboundedly so during seeding since a missed page corrupts
//! the whole listing), the connector is misconfigured (fail fast, never
//! retry), and the operator cancelled (stop now, never masked by retry).

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;

use crate::error::AppError;

/// Delay before the host should retry after a transient failure.
pub const RETRY_INTERVAL_SECS: i64 = 5 * 60;

/// Give-up horizon for the generic I/O retry path.
pub const FAIL_INTERVAL_SECS: i64 = 3 * 60 * 60;

/// Retry ceiling for the generic I/O path.
pub const IO_RETRY_LIMIT: i32 = 3;

/// Sentinel for an unlimited retry ceiling.
pub const UNLIMITED_RETRIES: i32 = -1;

/// Structured retry signal for a transient remote failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInterruption {
    /// Human-readable cause
    pub message: String,

    /// Do not retry before this time
    pub retry_at: DateTime<Utc>,

    /// Give up entirely after this time, when bounded
    pub fail_at: Option<DateTime<Utc>>,

    /// Maximum retries; [`UNLIMITED_RETRIES`] means no ceiling
    pub retry_limit: i32,

    /// Whether the job is still fresh during the retry window and does
    /// not require a full restart
    pub job_still_fresh: bool,
}

impl ServiceInterruption {
    /// Signal for a server that appears down during seeding.
    ///
    /// Retried without a ceiling: seeding must observe every listing page,
    /// so giving up mid-listing is worse than waiting the outage out.
    pub fn server_down(cause: &AppError, context: &str) -> Self {
        Self {
            message: format!("Server appears down during {context}: {cause}"),
            retry_at: Utc::now() + TimeDelta::seconds(RETRY_INTERVAL_SECS),
            fail_at: None,
            retry_limit: UNLIMITED_RETRIES,
            job_still_fresh: true,
        }
    }

    /// Signal for a generic I/O failure during document processing.
    pub fn io_failure(cause: &AppError, context: &str) -> Self {
        let now = Utc::now();
        Self {
            message: format!("I/O failure during {context}: {cause}"),
            retry_at: now + TimeDelta::seconds(RETRY_INTERVAL_SECS),
            fail_at: Some(now + TimeDelta::seconds(FAIL_INTERVAL_SECS)),
            retry_limit: IO_RETRY_LIMIT,
            job_still_fresh: false,
        }
    }

    /// Whether the retry ceiling is unlimited.
    pub fn unlimited(&self) -> bool {
        self.retry_limit == UNLIMITED_RETRIES
    }
}

impl fmt::Display for ServiceInterruption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (retry not before {})", self.message, self.retry_at)
    }
}

/// Classified, host-facing connector error.
#[derive(Error, Debug)]
pub enum ConnectorError {
    /// Transient remote failure; retry per the carried signal
    #[error("{0}")]
    Retry(ServiceInterruption),

    /// Unrecoverable error; never retried
    #[error(transparent)]
    Fatal(AppError),

    /// Cooperative cancellation; propagate promptly, never retry
    #[error("Interrupted: {0}")]
    Interrupted(String),
}

/// Result type alias for classified connector operations.
pub type ConnectorResult<T> = std::result::Result<T, ConnectorError>;

/// Classify an error raised while seeding.
pub fn classify_seeding(err: AppError) -> ConnectorError {
    classify_with(err, "seeding", ServiceInterruption::server_down)
}

/// Classify an error raised during per-document processing.
pub fn classify(err: AppError, context: &str) -> ConnectorError {
    classify_with(err, context, ServiceInterruption::io_failure)
}

fn classify_with(
    err: AppError,
    context: &str,
    retryable: fn(&AppError, &str) -> ServiceInterruption,
) -> ConnectorError {
    match err {
        AppError::Interrupted(message) => ConnectorError::Interrupted(message),
        err if err.is_config() => ConnectorError::Fatal(err),
        err => {
            log::warn!("Transient failure during {context}: {err}");
            ConnectorError::Retry(retryable(&err, context))
        }
    }
}
