use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::post;

use crate::state::AppState;
use crate::{handlers, middleware};

pub(super) fn build_billing_internal_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/internal/billing/events",
            post(handlers::billing::billing_event_handler),
        )
        .route_layer(from_fn_with_state(
            app_state,
            middleware::require_billing_auth,
        ))
}
