use axum::Json;
use axum::extract::State;

use proofai_domain::BillingEvent;

use crate::dto::{BillingEventRequest, BillingEventResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// Applies one normalised billing event.
///
/// Ignored events still answer 200 so the billing edge does not redeliver them;
/// store failures answer 503 so it does.
pub async fn billing_event_handler(
    State(state): State<AppState>,
    Json(payload): Json<BillingEventRequest>,
) -> ApiResult<Json<BillingEventResponse>> {
    let event = BillingEvent::try_from(payload)?;
    let outcome = state.billing_service.apply_event(event).await?;

    Ok(Json(BillingEventResponse::from(outcome)))
}
