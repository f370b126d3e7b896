use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::core::error::AppError;

/// Failure of a place search or of resolving an address to coordinates
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeocodeError {
    #[error("Address is too short to geocode")]
    TooShort,

    #[error("No matching location found")]
    NotFound,

    #[error("Location ({lat}, {lon}) is outside the Indonesia bounding box")]
    OutOfBounds { lat: f64, lon: f64 },

    #[error("Place search timed out")]
    Timeout,

    #[error("Place search connection failed: {0}")]
    Connection(String),

    #[error("Place search returned HTTP {0}")]
    HttpStatus(u16),

    #[error("Place search provider error: {0}")]
    Provider(String),
}

/// Reason reported to callers and logs, one per failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GeocodeFailureReason {
    TooShort,
    NotFound,
    OutOfBounds,
    Timeout,
    ConnectionError,
    ProviderError,
}

impl GeocodeError {
    pub fn reason(&self) -> GeocodeFailureReason {
        match self {
            GeocodeError::TooShort => GeocodeFailureReason::TooShort,
            GeocodeError::NotFound => GeocodeFailureReason::NotFound,
            GeocodeError::OutOfBounds { .. } => GeocodeFailureReason::OutOfBounds,
            GeocodeError::Timeout => GeocodeFailureReason::Timeout,
            GeocodeError::Connection(_) => GeocodeFailureReason::ConnectionError,
            GeocodeError::HttpStatus(_) | GeocodeError::Provider(_) => {
                GeocodeFailureReason::ProviderError
            }
        }
    }

    /// Whether a second attempt after a short delay might succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            GeocodeError::TooShort | GeocodeError::OutOfBounds { .. }
        )
    }
}

impl From<reqwest::Error> for GeocodeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GeocodeError::Timeout
        } else if e.is_connect() || e.is_request() {
            GeocodeError::Connection(e.to_string())
        } else if let Some(status) = e.status() {
            GeocodeError::HttpStatus(status.as_u16())
        } else {
            GeocodeError::Provider(e.to_string())
        }
    }
}

impl From<GeocodeError> for AppError {
    fn from(e: GeocodeError) -> Self {
        match e {
            GeocodeError::TooShort => AppError::BadRequest(e.to_string()),
            GeocodeError::NotFound => AppError::NotFound(e.to_string()),
            GeocodeError::OutOfBounds { .. } => AppError::Unprocessable(e.to_string()),
            GeocodeError::Timeout
            | GeocodeError::Connection(_)
            | GeocodeError::HttpStatus(_)
            | GeocodeError::Provider(_) => AppError::ExternalServiceError(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_mapping() {
        assert_eq!(
            GeocodeError::HttpStatus(429).reason(),
            GeocodeFailureReason::ProviderError
        );
        assert_eq!(
            GeocodeError::Connection("refused".to_string()).reason(),
            GeocodeFailureReason::ConnectionError
        );
        assert_eq!(
            GeocodeError::OutOfBounds { lat: 40.0, lon: 2.0 }.reason(),
            GeocodeFailureReason::OutOfBounds
        );
    }

    #[test]
    fn test_retryable() {
        assert!(GeocodeError::Timeout.is_retryable());
        assert!(GeocodeError::NotFound.is_retryable());
        assert!(GeocodeError::HttpStatus(503).is_retryable());
        assert!(!GeocodeError::TooShort.is_retryable());
        assert!(!GeocodeError::OutOfBounds { lat: 0.0, lon: 0.0 }.is_retryable());
    }

    #[test]
    fn test_into_app_error() {
        assert!(matches!(
            AppError::from(GeocodeError::TooShort),
            AppError::BadRequest(_)
        ));
        assert!(matches!(
            AppError::from(GeocodeError::NotFound),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from(GeocodeError::OutOfBounds { lat: 0.0, lon: 0.0 }),
            AppError::Unprocessable(_)
        ));
        assert!(matches!(
            AppError::from(GeocodeError::Timeout),
            AppError::ExternalServiceError(_)
        ));
    }
}
