use super::checks::check_store;
use super::*;

pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let store = check_store(state.postgres_pool.clone()).await;

    let ready = store.status == "ok";
    let (status, http_status) = if ready {
        ("ok", StatusCode::OK)
    } else {
        ("degraded", StatusCode::SERVICE_UNAVAILABLE)
    };

    (
        http_status,
        Json(HealthResponse {
            status,
            ready,
            store,
        }),
    )
}
