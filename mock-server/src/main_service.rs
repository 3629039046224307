//! `MainService` token routes. These signal failure through the status
//! code and return bare payloads on success.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{AppState, PROJECT_ID};

const CUSTOM_TOKEN_TTL: i64 = 5 * 60;
const ACCESS_TOKEN_TTL: i64 = 15 * 60;
const REFRESH_TOKEN_TTL: i64 = 30 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Custom,
    Access,
    Refresh,
}

impl TokenKind {
    fn as_str(self) -> &'static str {
        match self {
            TokenKind::Custom => "custom",
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }

    fn ttl(self) -> i64 {
        match self {
            TokenKind::Custom => CUSTOM_TOKEN_TTL,
            TokenKind::Access => ACCESS_TOKEN_TTL,
            TokenKind::Refresh => REFRESH_TOKEN_TTL,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Claims {
    user_id: String,
    kind: String,
    exp: i64,
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// Unsigned `header.payload.signature` token. `jti` keeps tokens issued in
/// the same second distinct.
fn issue(user_id: &str, kind: TokenKind) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
    let iat = now();
    let claims = json!({
        "projectId": PROJECT_ID,
        "userId": user_id,
        "iat": iat,
        "exp": iat + kind.ttl(),
        "kind": kind.as_str(),
        "jti": Uuid::new_v4(),
    });
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.mock")
}

/// User id of a live token of the given kind.
fn verify(token: &str, kind: TokenKind) -> Option<String> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    (claims.kind == kind.as_str() && claims.exp > now()).then_some(claims.user_id)
}

fn status_failure(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"message": message}))).into_response()
}

async fn session(state: &AppState, user_id: &str) -> Response {
    let access_token = issue(user_id, TokenKind::Access);
    let refresh_token = issue(user_id, TokenKind::Refresh);
    state
        .db
        .write()
        .await
        .refresh_tokens
        .insert(refresh_token.clone());
    Json(json!({"accessToken": access_token, "refreshToken": refresh_token})).into_response()
}

pub(crate) async fn token(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(response) = state.authorize(&params) {
        return response;
    }
    match params.get("userId").filter(|u| !u.is_empty()) {
        Some(user_id) => Json(json!({"customToken": issue(user_id, TokenKind::Custom)}))
            .into_response(),
        None => status_failure(StatusCode::BAD_REQUEST, "userId is required"),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthenticateBody {
    custom_token: String,
}

pub(crate) async fn authenticate(
    State(state): State<AppState>,
    Json(body): Json<AuthenticateBody>,
) -> Response {
    match verify(&body.custom_token, TokenKind::Custom) {
        Some(user_id) => session(&state, &user_id).await,
        None => status_failure(StatusCode::UNAUTHORIZED, "Invalid custom token"),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshBody {
    refresh_token: String,
}

/// Refresh tokens are single-use.
pub(crate) async fn refresh_token(
    State(state): State<AppState>,
    Json(body): Json<RefreshBody>,
) -> Response {
    let known = state
        .db
        .write()
        .await
        .refresh_tokens
        .remove(&body.refresh_token);
    match verify(&body.refresh_token, TokenKind::Refresh).filter(|_| known) {
        Some(user_id) => session(&state, &user_id).await,
        None => status_failure(StatusCode::UNAUTHORIZED, "Invalid refresh token"),
    }
}
