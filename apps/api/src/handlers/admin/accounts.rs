use super::*;

pub async fn user_entitlements_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<EntitlementSnapshotResponse>> {
    let snapshot = state
        .admin_grant_service
        .user_entitlements(&user, parse_user_id(user_id.as_str())?)
        .await?;

    Ok(Json(EntitlementSnapshotResponse::from(snapshot)))
}

pub async fn set_plan_override_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<String>,
    Json(payload): Json<UpdateFlagRequest>,
) -> ApiResult<StatusCode> {
    state
        .admin_grant_service
        .set_plan_override(&user, parse_user_id(user_id.as_str())?, payload.enabled)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_court_certification_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<String>,
    Json(payload): Json<UpdateFlagRequest>,
) -> ApiResult<StatusCode> {
    state
        .admin_grant_service
        .set_court_certification_flag(&user, parse_user_id(user_id.as_str())?, payload.enabled)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
