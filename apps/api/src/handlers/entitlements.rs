use axum::Json;
use axum::extract::{Extension, State};

use proofai_core::UserIdentity;

use crate::dto::EntitlementSnapshotResponse;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn my_entitlements_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> Json<EntitlementSnapshotResponse> {
    let snapshot = state.entitlement_service.resolve(user.user_id()).await;

    Json(EntitlementSnapshotResponse::from(snapshot))
}

pub async fn report_access_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<EntitlementSnapshotResponse>> {
    let snapshot = state
        .entitlement_service
        .require_report_generation(user.user_id())
        .await?;

    Ok(Json(EntitlementSnapshotResponse::from(snapshot)))
}

pub async fn court_access_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<EntitlementSnapshotResponse>> {
    let snapshot = state
        .entitlement_service
        .require_court_features(user.user_id())
        .await?;

    Ok(Json(EntitlementSnapshotResponse::from(snapshot)))
}
