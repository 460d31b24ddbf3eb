use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{Booking, ProposalOutcome};
use crate::services::bookings::{self, CreateBookingRequest, RescheduleRequest};
use crate::state::AppState;

use super::authenticate;

/// Rejections are a 409 carrying the colliding booking id.
fn outcome_response(outcome: ProposalOutcome) -> (StatusCode, Json<ProposalOutcome>) {
    let status = if outcome.is_accepted() {
        StatusCode::OK
    } else {
        StatusCode::CONFLICT
    };
    (status, Json(outcome))
}

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ProposalOutcome>), AppError> {
    let principal = authenticate(&state, &headers).await?;
    let outcome = bookings::create_booking(&state, &principal, body)?;
    Ok(outcome_response(outcome))
}

// POST /api/bookings/:id/reschedule
pub async fn reschedule_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(booking_id): Path<String>,
    Json(body): Json<RescheduleRequest>,
) -> Result<(StatusCode, Json<ProposalOutcome>), AppError> {
    let principal = authenticate(&state, &headers).await?;
    let outcome = bookings::reschedule_booking(&state, &principal, &booking_id, body)?;
    Ok(outcome_response(outcome))
}

// POST /api/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(booking_id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let principal = authenticate(&state, &headers).await?;
    Ok(Json(bookings::cancel_booking(&state, &principal, &booking_id)?))
}

// POST /api/bookings/:id/finish
pub async fn finish_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(booking_id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let principal = authenticate(&state, &headers).await?;
    Ok(Json(bookings::finish_booking(&state, &principal, &booking_id)?))
}

#[derive(Deserialize)]
pub struct DayQuery {
    pub date: NaiveDate,
}

// GET /api/businesses/:business_id/bookings
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(business_id): Path<String>,
    Query(query): Query<DayQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let principal = authenticate(&state, &headers).await?;
    Ok(Json(bookings::list_bookings(
        &state,
        &principal,
        &business_id,
        query.date,
    )?))
}
