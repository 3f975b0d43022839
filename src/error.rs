//! Error handling module.
use thiserror::Error;

/// ARGO dashboard error enum.
#[derive(Error, Debug)]
pub enum ArgoError {
    /// malformed identifier or unsupported request value, e.g. a non-numeric profile id
    #[error("InvalidInput: {0}")]
    InvalidInput(String),

    /// start date after end date, or a date bound that is not a calendar date
    #[error("InvalidDateRange: {0}")]
    InvalidDateRange(String),

    /// a requested singular resource does not exist
    #[error("NotFound: {0}")]
    NotFound(String),

    /// the warehouse failed to execute a query
    #[error("UpstreamQueryFailure: {0}")]
    UpstreamQueryFailure(String),

    #[error("NetworkError: {0}")]
    NetworkError(#[from] reqwest::Error),
}

impl ArgoError {
    /// Whether the error was caused by the request itself rather than by the warehouse.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ArgoError::InvalidInput(_) | ArgoError::InvalidDateRange(_) | ArgoError::NotFound(_)
        )
    }
}

#[cfg(feature = "backend")]
impl From<sqlx::Error> for ArgoError {
    fn from(e: sqlx::Error) -> Self {
        ArgoError::UpstreamQueryFailure(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors() {
        assert!(ArgoError::InvalidInput("x".to_string()).is_client_error());
        assert!(ArgoError::InvalidDateRange("x".to_string()).is_client_error());
        assert!(ArgoError::NotFound("x".to_string()).is_client_error());
        assert!(!ArgoError::UpstreamQueryFailure("x".to_string()).is_client_error());
    }

    #[test]
    fn test_message_passthrough() {
        let err = ArgoError::UpstreamQueryFailure("no such table: profiles".to_string());
        assert_eq!(
            err.to_string(),
            "UpstreamQueryFailure: no such table: profiles"
        );
    }
}
