pub mod availability;
pub mod bookings;
pub mod events;
pub mod health;
pub mod resources;

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::errors::{AppError, EngineError};
use crate::services::identity::Principal;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/resources/:id/availability",
            get(availability::get_availability),
        )
        .route(
            "/api/resources/:id/starts",
            get(availability::get_bookable_starts),
        )
        .route("/api/bookings", post(bookings::create_booking))
        .route(
            "/api/bookings/:id/reschedule",
            post(bookings::reschedule_booking),
        )
        .route("/api/bookings/:id/cancel", post(bookings::cancel_booking))
        .route("/api/bookings/:id/finish", post(bookings::finish_booking))
        .route(
            "/api/businesses/:business_id/bookings",
            get(bookings::list_bookings),
        )
        .route(
            "/api/businesses/:business_id/events",
            get(events::events_stream),
        )
        .route("/api/resources", post(resources::create_resource))
        .route(
            "/api/resources/:id/working-hours",
            put(resources::set_working_hours),
        )
        .route("/api/resources/:id/time-off", post(resources::add_time_off))
        .route("/api/time-off/:id", delete(resources::delete_time_off))
        .route("/api/resources/:id/vacations", post(resources::add_vacation))
        .route(
            "/api/resources/:id/deactivate",
            post(resources::deactivate_resource),
        )
        .with_state(state)
}

/// Resolve the `Authorization: Bearer` header to a principal.
pub(crate) async fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Principal, AppError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("");
    resolve_token(state, token).await
}

pub(crate) async fn resolve_token(state: &AppState, token: &str) -> Result<Principal, AppError> {
    if token.is_empty() {
        return Err(AppError::Unauthorized);
    }
    match state.identity.resolve(token).await {
        Ok(Some(principal)) => Ok(principal),
        Ok(None) => Err(AppError::Unauthorized),
        Err(e) => {
            tracing::error!(error = %e, "identity lookup failed");
            Err(EngineError::Transient(e.to_string()).into())
        }
    }
}
