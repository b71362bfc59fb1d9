//! Report period limit - caps the length of a searched time window

use crate::error::ValidationError;
use crate::services::collaborators::PeriodLimiter;
use chrono::{DateTime, Utc};
use tracing::warn;

/// Period limiter driven by `report.period_limit_secs` (0 disables it)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodLimit {
    limit_secs: u64,
}

impl PeriodLimit {
    pub fn new(limit_secs: u64) -> Self {
        Self { limit_secs }
    }
}

impl PeriodLimiter for PeriodLimit {
    fn check(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<(), ValidationError> {
        if self.limit_secs == 0 {
            return Ok(());
        }

        // Millisecond precision: a fraction of a second over the limit still counts
        let span = to - from;
        let limit_ms = i64::try_from(self.limit_secs.saturating_mul(1000)).unwrap_or(i64::MAX);
        if span.num_milliseconds() > limit_ms {
            let span_secs = span.num_seconds();
            warn!(span_secs = %span_secs, limit_secs = %self.limit_secs, "period_limit_exceeded");
            return Err(ValidationError::PeriodLimitExceeded { span_secs, limit_secs: self.limit_secs });
        }

        Ok(())
    }
}
