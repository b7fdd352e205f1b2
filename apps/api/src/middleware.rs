use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use proofai_core::{AccountRole, AppError, AppResult, UserId, UserIdentity};
use subtle::ConstantTimeEq;

use crate::error::ApiResult;
use crate::state::AppState;

/// Account id forwarded by the identity gateway.
pub const USER_ID_HEADER: &str = "x-proofai-user-id";
/// Account role forwarded by the identity gateway.
pub const ROLE_HEADER: &str = "x-proofai-role";

pub async fn require_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = identity_from_headers(request.headers(), &state.identity_gateway_secret)?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

pub async fn require_billing_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    require_bearer_secret(request.headers(), &state.billing_events_secret)?;
    Ok(next.run(request).await)
}

/// Reads the gateway-asserted identity once the shared secret matches.
///
/// A missing role header means a regular user.
pub(crate) fn identity_from_headers(
    headers: &HeaderMap,
    gateway_secret: &str,
) -> AppResult<UserIdentity> {
    require_bearer_secret(headers, gateway_secret)?;

    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?
        .parse::<UserId>()
        .map_err(|_| AppError::Unauthorized("malformed user id header".to_owned()))?;

    let role = match headers.get(ROLE_HEADER) {
        None => AccountRole::User,
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|value| value.trim().parse::<AccountRole>().ok())
            .ok_or_else(|| AppError::Unauthorized("malformed role header".to_owned()))?,
    };

    Ok(UserIdentity::new(user_id, role))
}

pub(crate) fn require_bearer_secret(headers: &HeaderMap, secret: &str) -> AppResult<()> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_owned()))?;

    if !bool::from(token.as_bytes().ct_eq(secret.as_bytes())) {
        return Err(AppError::Unauthorized("invalid bearer token".to_owned()));
    }

    Ok(())
}
