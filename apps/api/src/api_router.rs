use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use proofai_core::AppError;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

mod billing_internal;
mod cors;

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let cors_layer = cors::build_cors_layer(frontend_url)?;

    let protected_routes = Router::new()
        .route(
            "/api/entitlements/me",
            get(handlers::entitlements::my_entitlements_handler),
        )
        .route(
            "/api/recordings/admission",
            post(handlers::recordings::recording_admission_handler),
        )
        .route(
            "/api/recordings/usage",
            post(handlers::recordings::record_usage_handler),
        )
        .route(
            "/api/credits/spend",
            post(handlers::credits::spend_credit_handler),
        )
        .route(
            "/api/reports/access",
            get(handlers::entitlements::report_access_handler),
        )
        .route(
            "/api/court/access",
            get(handlers::entitlements::court_access_handler),
        )
        .route(
            "/api/admin/users/{user_id}/entitlements",
            get(handlers::admin::user_entitlements_handler),
        )
        .route(
            "/api/admin/users/{user_id}/credits",
            get(handlers::admin::list_credit_grants_handler)
                .post(handlers::admin::grant_credits_handler),
        )
        .route(
            "/api/admin/users/{user_id}/certifications",
            get(handlers::admin::list_certification_grants_handler)
                .post(handlers::admin::grant_certification_handler),
        )
        .route(
            "/api/admin/certifications/{grant_id}/invalidate",
            post(handlers::admin::invalidate_certification_handler),
        )
        .route(
            "/api/admin/users/{user_id}/plan-override",
            put(handlers::admin::set_plan_override_handler),
        )
        .route(
            "/api/admin/users/{user_id}/court-certification",
            put(handlers::admin::set_court_certification_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_identity,
        ));

    let billing_internal_routes =
        billing_internal::build_billing_internal_routes(app_state.clone());

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(billing_internal_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(app_state))
}
