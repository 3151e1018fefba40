//! Identity asserted by the upstream identity gateway.
//!
//! The gateway authenticates the user and forwards the id in `X-User-Id`.
//! When an identity secret is configured it also sends
//! `X-User-Signature: base64(HMAC-SHA1(secret, user_id))`, which is checked
//! here; with no secret (local development) the id header is taken as-is.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::errors::AppError;
use crate::state::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const SIGNATURE_HEADER: &str = "x-user-signature";

/// Authenticated caller. Handlers pass `user.id` explicitly into every core
/// operation; identity fields in request bodies are never consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        authenticate(&parts.headers, &state.config.identity_secret)
    }
}

pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthUser, AppError> {
    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Unauthorized("missing user identity".into()))?;

    if !secret.is_empty() {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !verify_signature(secret, user_id, signature) {
            tracing::warn!(user_id, "rejected identity with bad signature");
            return Err(AppError::Unauthorized("invalid identity signature".into()));
        }
    }

    Ok(AuthUser {
        id: user_id.to_string(),
    })
}

pub fn sign_user_id(secret: &str, user_id: &str) -> String {
    let mut mac = match Hmac::<Sha1>::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return String::new(),
    };
    mac.update(user_id.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}

fn verify_signature(secret: &str, user_id: &str, signature: &str) -> bool {
    let Ok(expected) = base64::engine::general_purpose::STANDARD.decode(signature) else {
        return false;
    };
    let mut mac = match Hmac::<Sha1>::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(user_id.as_bytes());
    mac.verify_slice(&expected).is_ok()
}
