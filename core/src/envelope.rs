//! Response unwrapping for the two RBS response dialects.
//!
//! The product service wraps every payload in `{success, data, message}`.
//! The token endpoints instead signal success through the HTTP status alone
//! and return the payload as the whole body.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::HttpResponse;
use crate::types::ServiceResponse;

/// Reason used when the backend fails without saying why.
pub const GENERIC_FAILURE: &str = "request failed";

/// Pull a non-empty `message` string out of a JSON body, if there is one.
pub fn extract_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// Envelope dialect: 2xx with `{success: true, data}` yields `data`.
pub fn unwrap_envelope<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    if !response.is_2xx() {
        return Err(failed_status(response));
    }
    let envelope: ServiceResponse<Value> = serde_json::from_str(&response.body)
        .map_err(|e| ApiError::malformed(format!("expected response envelope: {e}")))?;
    if !envelope.success {
        let message = envelope
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| GENERIC_FAILURE.to_string());
        tracing::warn!(status = response.status, %message, "backend rejected request");
        return Err(ApiError::Rejected { message });
    }
    serde_json::from_value(envelope.data.unwrap_or(Value::Null))
        .map_err(|e| ApiError::malformed(format!("unexpected data payload: {e}")))
}

/// Status-code dialect: any status in `[200, 400)` yields the whole body.
pub fn unwrap_status<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    if !(200..400).contains(&response.status) {
        return Err(failed_status(response));
    }
    serde_json::from_str(&response.body)
        .map_err(|e| ApiError::malformed(format!("unexpected response body: {e}")))
}

/// Prefer the backend's own message over the bare status.
fn failed_status(response: &HttpResponse) -> ApiError {
    match extract_message(&response.body) {
        Some(message) => {
            tracing::warn!(status = response.status, %message, "backend rejected request");
            ApiError::Rejected { message }
        }
        None => ApiError::HttpError {
            status: response.status,
            body: response.body.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse::new(status, body)
    }

    #[test]
    fn envelope_success_yields_data() {
        let data: Value =
            unwrap_envelope(&response(200, r#"{"success":true,"data":{"id":"p1"}}"#)).unwrap();
        assert_eq!(data, json!({"id": "p1"}));
    }

    #[test]
    fn envelope_failure_uses_backend_message() {
        let err = unwrap_envelope::<Value>(&response(200, r#"{"success":false,"message":"m"}"#))
            .unwrap_err();
        assert!(matches!(&err, ApiError::Rejected { message } if message == "m"));
        assert_eq!(err.to_string(), "m");
    }

    #[test]
    fn envelope_failure_without_message_is_generic() {
        let err = unwrap_envelope::<Value>(&response(200, r#"{"success":false}"#)).unwrap_err();
        assert!(!err.to_string().is_empty());
        assert_eq!(err.to_string(), GENERIC_FAILURE);
    }

    #[test]
    fn envelope_missing_data_accepts_unit_payloads() {
        unwrap_envelope::<()>(&response(200, r#"{"success":true}"#)).unwrap();
        let none: Option<bool> = unwrap_envelope(&response(200, r#"{"success":true}"#)).unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn service_response_values_unwrap() {
        let ok = serde_json::to_string(&ServiceResponse::ok(json!({"id": "p1"}))).unwrap();
        let data: Value = unwrap_envelope(&response(200, &ok)).unwrap();
        assert_eq!(data, json!({"id": "p1"}));

        let failed = serde_json::to_string(&ServiceResponse::<Value>::failed("nope")).unwrap();
        let err = unwrap_envelope::<Value>(&response(200, &failed)).unwrap_err();
        assert!(matches!(&err, ApiError::Rejected { message } if message == "nope"));
    }

    #[test]
    fn envelope_missing_success_is_malformed() {
        let err = unwrap_envelope::<Value>(&response(200, r#"{"data":1}"#)).unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
    }

    #[test]
    fn envelope_non_json_is_malformed() {
        let err = unwrap_envelope::<Value>(&response(200, "<html>")).unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
    }

    #[test]
    fn envelope_wrong_data_shape_is_malformed() {
        let err = unwrap_envelope::<bool>(&response(200, r#"{"success":true,"data":"yes"}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
    }

    #[test]
    fn envelope_error_status_recovers_message() {
        let err = unwrap_envelope::<Value>(&response(
            400,
            r#"{"success":false,"message":"MerchantId is invalid"}"#,
        ))
        .unwrap_err();
        assert_eq!(err.to_string(), "MerchantId is invalid");
    }

    #[test]
    fn envelope_error_status_without_message_is_http_error() {
        let err = unwrap_envelope::<Value>(&response(503, "unavailable")).unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 503, .. }));
    }

    #[test]
    fn status_dialect_created_yields_body() {
        let body: Value = unwrap_status(&response(201, r#"{"customToken":"t"}"#)).unwrap();
        assert_eq!(body, json!({"customToken": "t"}));
    }

    #[test]
    fn status_dialect_redirect_range_is_success() {
        let body: Value = unwrap_status(&response(399, "{}")).unwrap();
        assert_eq!(body, json!({}));
    }

    #[test]
    fn status_dialect_not_found_uses_message() {
        let err = unwrap_status::<Value>(&response(404, r#"{"message":"m"}"#)).unwrap_err();
        assert!(matches!(&err, ApiError::Rejected { message } if message == "m"));
    }

    #[test]
    fn status_dialect_failure_without_message() {
        let err = unwrap_status::<Value>(&response(500, "")).unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 500, .. }));
    }

    #[test]
    fn status_dialect_non_json_success_is_malformed() {
        let err = unwrap_status::<Value>(&response(200, "OK")).unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
    }
}
