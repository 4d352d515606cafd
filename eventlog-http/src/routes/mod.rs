pub mod correlation_links;
pub mod events;
pub mod health;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the full `/v1` router. Inbound auth (OAuth/API-key verification)
/// is treated as an external collaborator and has no middleware here, but
/// the request-tracing layer below is wired through `tower-http` exactly as
/// a future auth layer would be, so adding one later is a one-line change
/// rather than a restructure.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/events", post(events::insert_events))
        .route("/v1/events/batch", post(events::insert_batch))
        .route(
            "/v1/events/correlation/{id}",
            get(events::get_correlation_events),
        )
        .route("/v1/events/trace/{id}", get(events::get_trace_events))
        .route("/v1/events/account/{id}", get(events::get_account_events))
        .route("/v1/events/batch/{id}", get(events::get_batch_events))
        .route(
            "/v1/events/batch/{id}/summary",
            get(events::get_batch_summary),
        )
        .route("/v1/events/search", get(events::search_events))
        .route(
            "/v1/correlation-links",
            post(correlation_links::create_correlation_link),
        )
        .route("/v1/healthcheck", get(health::healthcheck))
        .route("/v1/healthcheck/ready", get(health::healthcheck_ready))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
