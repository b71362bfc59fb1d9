//! Error types for reverse searches

use crate::domain::types::{DeviceId, GroupId};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

/// Query parameters rejected before any scanning starts
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("time window is inverted: from {from} is after to {to}")]
    WindowInverted { from: DateTime<Utc>, to: DateTime<Utc> },

    #[error("time period of {span_secs}s exceeds the limit of {limit_secs}s")]
    PeriodLimitExceeded { span_secs: i64, limit_secs: u64 },

    #[error("radius must be a finite, non-negative number of meters, got {0}")]
    InvalidRadius(f64),

    #[error("latitude must be within [-90, 90], got {0}")]
    LatitudeOutOfRange(f64),

    #[error("longitude must be within [-180, 180], got {0}")]
    LongitudeOutOfRange(f64),
}

/// Failure reported by a storage collaborator
#[derive(Debug, Error)]
pub enum DataAccessError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed fleet data: {0}")]
    Malformed(String),

    #[error("unknown device {0}")]
    UnknownDevice(DeviceId),

    #[error("unknown group {0}")]
    UnknownGroup(GroupId),

    #[error("{0}")]
    Backend(String),
}

/// Top-level error returned by a reverse search
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid query: {0}")]
    Validation(#[from] ValidationError),

    #[error("data access failed: {0}")]
    DataAccess(#[from] DataAccessError),

    #[error("scan task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T, E = SearchError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_wraps() {
        let err: SearchError = ValidationError::InvalidRadius(-1.0).into();
        assert!(matches!(err, SearchError::Validation(ValidationError::InvalidRadius(_))));
        assert!(err.to_string().contains("invalid query"));
    }

    #[test]
    fn test_data_access_error_message() {
        let err: SearchError = DataAccessError::UnknownDevice(DeviceId(42)).into();
        assert_eq!(err.to_string(), "data access failed: unknown device 42");
    }
}
