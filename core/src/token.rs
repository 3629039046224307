//! Bearer token claim decoding.
//!
//! Claims are read, never verified: the signature segment is ignored. Use
//! this to inspect a token's owner and expiry on the client side only.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Claims carried by an RBS access, refresh or custom token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPayload {
    pub project_id: String,
    pub user_id: String,
    pub iat: i64,
    pub exp: i64,
}

impl TokenPayload {
    /// Decode the middle segment of `header.payload.signature`.
    pub fn decode(token: &str) -> Result<Self, ApiError> {
        let mut parts = token.split('.');
        let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(_), Some(payload), Some(_), None) => payload,
            _ => {
                return Err(ApiError::InvalidToken(
                    "expected three dot-separated segments".to_string(),
                ))
            }
        };
        let bytes = URL_SAFE_LENIENT
            .decode(payload)
            .or_else(|_| STANDARD_LENIENT.decode(payload))
            .map_err(|e| ApiError::InvalidToken(format!("payload is not base64: {e}")))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::InvalidToken(format!("payload is not valid claims JSON: {e}")))
    }

    /// True once `now` (seconds since the epoch) has reached `exp`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }
}

#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};

    use super::*;

    const CLAIMS: &str = r#"{"projectId":"prj","userId":"u1","iat":1700000000,"exp":1700003600}"#;

    #[test]
    fn decodes_url_safe_payload() {
        let token = format!("eyJhbGciOiJIUzI1NiJ9.{}.sig", URL_SAFE_NO_PAD.encode(CLAIMS));
        let payload = TokenPayload::decode(&token).unwrap();
        assert_eq!(payload.project_id, "prj");
        assert_eq!(payload.user_id, "u1");
        assert_eq!(payload.iat, 1_700_000_000);
        assert_eq!(payload.exp, 1_700_003_600);
    }

    #[test]
    fn decodes_padded_standard_payload() {
        let claims = r#"{"projectId":"p?>","userId":"u~","iat":1,"exp":2}"#;
        let token = format!("h.{}.s", STANDARD.encode(claims));
        let payload = TokenPayload::decode(&token).unwrap();
        assert_eq!(payload.project_id, "p?>");
    }

    #[test]
    fn rejects_wrong_segment_count() {
        assert!(matches!(
            TokenPayload::decode("only.two"),
            Err(ApiError::InvalidToken(_))
        ));
        assert!(matches!(
            TokenPayload::decode("a.b.c.d"),
            Err(ApiError::InvalidToken(_))
        ));
    }

    #[test]
    fn rejects_non_claims_payload() {
        let token = format!("h.{}.s", URL_SAFE_NO_PAD.encode("[1,2,3]"));
        assert!(matches!(
            TokenPayload::decode(&token),
            Err(ApiError::InvalidToken(_))
        ));
    }

    #[test]
    fn expiry_check() {
        let payload = TokenPayload {
            project_id: "p".to_string(),
            user_id: "u".to_string(),
            iat: 10,
            exp: 20,
        };
        assert!(!payload.is_expired_at(19));
        assert!(payload.is_expired_at(20));
    }
}
