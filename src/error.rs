//! Error types for the parametrization service.
//!
//! All errors are represented by the `ParamError` enum. Lookups that find
//! nothing are not errors: the service returns `None` and only the API
//! layer turns that into [`ParamError::NotFound`].

use std::io::ErrorKind;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all parametrization operations.
#[derive(Deserialize, Serialize, Error, Debug, Clone, PartialEq)]
pub enum ParamError {
    /// Configuration parsing or validation errors.
    #[error("{0}")]
    Config(String),

    /// A write would break the uniqueness of `key`.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// The record store or the cache backend cannot be reached.
    #[error("unavailable: {0}")]
    StoreUnavailable(String),

    /// Any other storage failure.
    #[error("{0}")]
    Store(String),

    /// Any other cache failure.
    #[error("{0}")]
    Cache(String),

    /// Data conversion errors (JSON, rows).
    #[error("{0}")]
    Convert(String),

    /// A requested record does not exist. Raised by the API layer only.
    #[error("{0} not found")]
    NotFound(String),

    /// I/O operation errors.
    #[error("{0}")]
    IoError(String),

    /// HTTP server errors.
    #[error("{0}")]
    Server(String),
}

impl From<ParamError> for String {
    fn from(val: ParamError) -> Self {
        val.to_string()
    }
}

impl From<std::io::Error> for ParamError {
    fn from(error: std::io::Error) -> Self {
        ParamError::IoError(error.to_string())
    }
}

impl From<ParamError> for std::io::Error {
    fn from(val: ParamError) -> Self {
        #[allow(clippy::io_other_error)]
        std::io::Error::new(ErrorKind::Other, val.to_string())
    }
}

impl From<serde_json::Error> for ParamError {
    fn from(error: serde_json::Error) -> Self {
        ParamError::Convert(error.to_string())
    }
}

impl From<toml::de::Error> for ParamError {
    fn from(error: toml::de::Error) -> Self {
        ParamError::Config(error.to_string())
    }
}

impl From<sqlx::Error> for ParamError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ParamError::ConstraintViolation(db.constraint().map(|c| format!("{}: {}", c, db.message())).unwrap_or_else(|| db.message().to_string()))
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => ParamError::StoreUnavailable(error.to_string()),
            _ => ParamError::Store(error.to_string()),
        }
    }
}

impl From<redis::RedisError> for ParamError {
    fn from(error: redis::RedisError) -> Self {
        if error.is_io_error() || error.is_connection_refusal() || error.is_timeout() || error.is_connection_dropped() {
            ParamError::StoreUnavailable(error.to_string())
        } else {
            ParamError::Cache(error.to_string())
        }
    }
}

#[cfg(test)]
mod test {
    use super::ParamError;

    #[test]
    fn test_io_error_round_trip_keeps_message() {
        let err: ParamError = std::io::Error::other("disk gone").into();
        assert_eq!(err, ParamError::IoError("disk gone".to_string()));

        let io: std::io::Error = err.into();
        assert_eq!(io.to_string(), "disk gone");
    }

    #[test]
    fn test_sqlx_pool_timeout_is_unavailable() {
        let err: ParamError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, ParamError::StoreUnavailable(_)));
    }

    #[test]
    fn test_sqlx_row_not_found_is_store_error() {
        let err: ParamError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ParamError::Store(_)));
    }

    #[test]
    fn test_json_error_is_convert() {
        let err: ParamError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, ParamError::Convert(_)));
    }

    #[test]
    fn test_display() {
        assert_eq!(ParamError::NotFound("parametrization 7".into()).to_string(), "parametrization 7 not found");
        assert_eq!(ParamError::ConstraintViolation("key DARK_MODE".into()).to_string(), "constraint violation: key DARK_MODE");
    }
}
