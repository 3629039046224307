//! The I/O seam: who executes requests, and who may watch them.

use std::fmt;

use crate::http::{HttpRequest, HttpResponse};

/// A request that never produced a usable `HttpResponse`.
///
/// `body` is set when the transport did receive a payload alongside the
/// failure (for example a proxy error page or a JSON error from a gateway).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub message: String,
    pub body: Option<String>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TransportError {}

/// Executes one HTTP round-trip.
///
/// Implementations must return 4xx/5xx responses as `Ok` and reserve `Err`
/// for requests that did not complete.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<F> Transport for F
where
    F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError>,
{
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self(request)
    }
}

/// Observe-only hook for requests and responses. Must not mutate anything
/// the client relies on.
pub trait Observer: Send + Sync {
    fn on_request(&self, _request: &HttpRequest) {}

    fn on_response(&self, _request: &HttpRequest, _response: &HttpResponse) {}

    fn on_transport_error(&self, _request: &HttpRequest, _error: &TransportError) {}
}

/// Logs every exchange through `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_request(&self, request: &HttpRequest) {
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            body = request.body.as_deref().unwrap_or(""),
            "rbs request"
        );
    }

    fn on_response(&self, request: &HttpRequest, response: &HttpResponse) {
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            status = response.status,
            body = %response.body,
            "rbs response"
        );
    }

    fn on_transport_error(&self, request: &HttpRequest, error: &TransportError) {
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            error = %error,
            "rbs transport error"
        );
    }
}
