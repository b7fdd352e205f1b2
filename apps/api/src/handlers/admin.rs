use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;

use proofai_application::{GrantCertificationInput, GrantCreditsInput};
use proofai_core::{AppError, AppResult, UserId, UserIdentity};
use uuid::Uuid;

use crate::dto::{
    CertificationGrantResponse, CreditGrantResponse, EntitlementSnapshotResponse,
    GrantCertificationRequest, GrantCreditsRequest, InvalidateCertificationRequest,
    UpdateFlagRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

mod accounts;
mod certifications;
mod credits;

pub use accounts::{
    set_court_certification_handler, set_plan_override_handler, user_entitlements_handler,
};
pub use certifications::{
    grant_certification_handler, invalidate_certification_handler,
    list_certification_grants_handler,
};
pub use credits::{grant_credits_handler, list_credit_grants_handler};

fn parse_user_id(value: &str) -> AppResult<UserId> {
    UserId::from_str(value)
}

fn parse_grant_id(value: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value.trim())
        .map_err(|error| AppError::Validation(format!("invalid grant id '{value}': {error}")))
}
