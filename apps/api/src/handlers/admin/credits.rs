use crate::dto::parse_timestamp;

use super::*;

pub async fn grant_credits_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<String>,
    Json(payload): Json<GrantCreditsRequest>,
) -> ApiResult<(StatusCode, Json<CreditGrantResponse>)> {
    let expires_at = payload
        .expires_at
        .as_deref()
        .map(|value| parse_timestamp("expires_at", value))
        .transpose()?;

    let grant = state
        .admin_grant_service
        .grant_credits(
            &user,
            GrantCreditsInput {
                user_id: parse_user_id(user_id.as_str())?,
                amount: payload.amount,
                expires_at,
                reason: payload.reason,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(CreditGrantResponse::from(grant))))
}

pub async fn list_credit_grants_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<CreditGrantResponse>>> {
    let grants = state
        .admin_grant_service
        .list_credit_grants(&user, parse_user_id(user_id.as_str())?)
        .await?
        .into_iter()
        .map(CreditGrantResponse::from)
        .collect();

    Ok(Json(grants))
}
