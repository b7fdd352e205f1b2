use super::*;

pub async fn grant_certification_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<String>,
    Json(payload): Json<GrantCertificationRequest>,
) -> ApiResult<(StatusCode, Json<CertificationGrantResponse>)> {
    let grant = state
        .admin_grant_service
        .grant_certification(
            &user,
            GrantCertificationInput {
                user_id: parse_user_id(user_id.as_str())?,
                reason: payload.reason,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CertificationGrantResponse::from(grant)),
    ))
}

pub async fn list_certification_grants_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<CertificationGrantResponse>>> {
    let grants = state
        .admin_grant_service
        .list_certification_grants(&user, parse_user_id(user_id.as_str())?)
        .await?
        .into_iter()
        .map(CertificationGrantResponse::from)
        .collect();

    Ok(Json(grants))
}

pub async fn invalidate_certification_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(grant_id): Path<String>,
    payload: Option<Json<InvalidateCertificationRequest>>,
) -> ApiResult<Json<CertificationGrantResponse>> {
    let Json(payload) = payload.unwrap_or_default();
    let grant = state
        .admin_grant_service
        .invalidate_certification(
            &user,
            parse_grant_id(grant_id.as_str())?,
            payload.reason.as_deref(),
        )
        .await?;

    Ok(Json(CertificationGrantResponse::from(grant)))
}
