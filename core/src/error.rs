//! Error types for the RBS client.
//!
//! # Design
//! `Configuration` is the only variant raised before a request exists; every
//! other variant describes what happened to a request on the wire.
//! `Rejected` carries the backend's own message whenever one can be recovered,
//! including from failed HTTP statuses, so callers see the reason the
//! backend gave rather than a bare status code.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors returned by `RbsClient` and `ServiceClient`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A client-side precondition is unmet (missing merchant or user id).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The backend reported failure with a human-readable reason.
    #[error("{message}")]
    Rejected { message: String },

    /// Out-of-range status with no recoverable message in the body.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The request never completed (connection, DNS, timeout).
    #[error("transport failure: {0}")]
    Transport(String),

    /// The response body matches neither response dialect.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A bearer token could not be split or decoded.
    #[error("invalid token: {0}")]
    InvalidToken(String),
}

impl ApiError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        ApiError::Configuration(msg.into())
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        ApiError::Rejected {
            message: message.into(),
        }
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        ApiError::MalformedResponse(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_displays_backend_message_verbatim() {
        let err = ApiError::rejected("Product not found");
        assert_eq!(err.to_string(), "Product not found");
    }

    #[test]
    fn http_error_display_includes_status_and_body() {
        let err = ApiError::HttpError {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 502: bad gateway");
    }
}
