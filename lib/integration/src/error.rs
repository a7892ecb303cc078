//! Error types for the integration crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `ClassifierError`: Errors from intent classification
//! - `GeocodeError`: Errors from reverse geocoding (logged, then degraded)
//! - `DeliveryError`: Errors from message delivery and profile calls

use std::fmt;

/// Errors from the intent classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifierError {
    /// The request could not be sent or the connection failed.
    RequestFailed { reason: String },
    /// The service answered with a non-success status.
    Rejected { status: u16, body: String },
    /// The response body was not understood.
    ResponseParseFailed { reason: String },
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestFailed { reason } => {
                write!(f, "classifier request failed: {reason}")
            }
            Self::Rejected { status, body } => {
                write!(f, "classifier rejected query with status {status}: {body}")
            }
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse classifier response: {reason}")
            }
        }
    }
}

impl std::error::Error for ClassifierError {}

/// Errors from reverse geocoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeocodeError {
    /// The request could not be sent or the connection failed.
    RequestFailed { reason: String },
    /// The service answered with a non-success status.
    Rejected { status: u16, body: String },
    /// The response body was not understood.
    ResponseParseFailed { reason: String },
    /// The first result has no political address component.
    NoPlaceName,
}

impl fmt::Display for GeocodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestFailed { reason } => {
                write!(f, "geocode request failed: {reason}")
            }
            Self::Rejected { status, body } => {
                write!(f, "geocoder rejected lookup with status {status}: {body}")
            }
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse geocode response: {reason}")
            }
            Self::NoPlaceName => write!(f, "no political place name in geocode result"),
        }
    }
}

impl std::error::Error for GeocodeError {}

/// Errors from the messaging platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The request could not be sent or the connection failed.
    RequestFailed { reason: String },
    /// The platform answered with a non-success status.
    Rejected { status: u16, body: String },
    /// An image attachment could not be fetched.
    ImageFetchFailed { url: String, reason: String },
    /// The message could not be encoded.
    EncodingFailed { reason: String },
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestFailed { reason } => {
                write!(f, "messenger request failed: {reason}")
            }
            Self::Rejected { status, body } => {
                write!(f, "messenger rejected request with status {status}: {body}")
            }
            Self::ImageFetchFailed { url, reason } => {
                write!(f, "failed to fetch image '{url}': {reason}")
            }
            Self::EncodingFailed { reason } => {
                write!(f, "failed to encode message: {reason}")
            }
        }
    }
}

impl std::error::Error for DeliveryError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifier_error_display() {
        let err = ClassifierError::Rejected {
            status: 401,
            body: "bad token".to_string(),
        };
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("bad token"));
    }

    #[test]
    fn delivery_error_display() {
        let err = DeliveryError::ImageFetchFailed {
            url: "https://example.test/fish.png".to_string(),
            reason: "404".to_string(),
        };
        assert!(err.to_string().contains("fish.png"));
    }
}
