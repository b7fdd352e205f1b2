use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;

use proofai_core::UserIdentity;
use proofai_domain::AdmissionDecision;

use crate::dto::{
    RecordUsageRequest, RecordUsageResponse, RecordingAdmissionRequest,
    RecordingAdmissionResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn recording_admission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<RecordingAdmissionRequest>,
) -> ApiResult<Json<RecordingAdmissionResponse>> {
    let funding = state
        .entitlement_service
        .require_recording_admission(user.user_id(), payload.duration_seconds)
        .await?;

    Ok(Json(RecordingAdmissionResponse::from(
        AdmissionDecision::Allowed { funding },
    )))
}

/// Meters a finished session. A ledger failure never fails the request.
pub async fn record_usage_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<RecordUsageRequest>,
) -> (StatusCode, Json<RecordUsageResponse>) {
    let outcome = state
        .usage_ledger_service
        .record_usage(
            user.user_id(),
            payload.duration_seconds,
            payload.recording_ref,
        )
        .await;

    (
        StatusCode::CREATED,
        Json(RecordUsageResponse::from(outcome)),
    )
}
