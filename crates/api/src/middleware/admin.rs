//! Shared-token guard for the `/api/v1` surface.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use stockwatch_core::error::CoreError;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the admin token.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

type HmacSha256 = Hmac<Sha256>;

/// MAC key used only to bring both tokens to a fixed-length digest.
const TOKEN_MAC_KEY: &[u8] = b"stockwatch-admin-token";

/// Compare tokens in constant time. Both sides are MACed to fixed-length
/// digests, which `verify_slice` compares.
fn tokens_match(provided: &str, expected: &str) -> bool {
    let digest = |token: &str| {
        HmacSha256::new_from_slice(TOKEN_MAC_KEY).map(|mut mac| {
            mac.update(token.as_bytes());
            mac
        })
    };

    match (digest(expected), digest(provided)) {
        (Ok(expected), Ok(provided)) => provided
            .verify_slice(&expected.finalize().into_bytes())
            .is_ok(),
        _ => false,
    }
}

/// Rejects the request with 401 unless `x-admin-token` matches the
/// configured `ADMIN_TOKEN`. When no token is configured every request passes.
///
/// ```ignore
/// async fn handler(_admin: RequireAdmin, State(state): State<AppState>) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin;

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.admin_token.as_deref() else {
            return Ok(RequireAdmin);
        };

        let provided = parts
            .headers
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized("Missing x-admin-token header".into()))
            })?;

        if !tokens_match(provided, expected) {
            return Err(AppError::Core(CoreError::Unauthorized(
                "Invalid admin token".into(),
            )));
        }

        Ok(RequireAdmin)
    }
}
