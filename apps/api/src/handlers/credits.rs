use axum::Json;
use axum::extract::{Extension, State};

use proofai_core::UserIdentity;

use crate::dto::{CreditGrantResponse, SpendCreditRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn spend_credit_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    payload: Option<Json<SpendCreditRequest>>,
) -> ApiResult<Json<CreditGrantResponse>> {
    let Json(payload) = payload.unwrap_or_default();
    let grant = state
        .credit_service
        .spend_credit(user.user_id(), payload.recording_ref.as_deref())
        .await?;

    Ok(Json(CreditGrantResponse::from(grant)))
}
