use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::time::GRID_MINUTES;
use crate::models::{ClockTime, Minutes, Slot};
use crate::services::bookings;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
    pub service_id: String,
    /// Comma-separated.
    #[serde(default)]
    pub addon_ids: Option<String>,
    #[serde(default)]
    pub step: Option<Minutes>,
}

impl AvailabilityQuery {
    fn addons(&self) -> Vec<String> {
        self.addon_ids
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }
}

// GET /api/resources/:id/availability
pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Path(resource_id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<Slot>>, AppError> {
    let view = bookings::availability(
        &state,
        &resource_id,
        query.date,
        &query.service_id,
        &query.addons(),
    )?;
    Ok(Json(view.slots))
}

// GET /api/resources/:id/starts
pub async fn get_bookable_starts(
    State(state): State<Arc<AppState>>,
    Path(resource_id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<ClockTime>>, AppError> {
    let step = query.step.unwrap_or(GRID_MINUTES);
    if step <= 0 {
        return Err(AppError::BadRequest("step must be positive".to_string()));
    }
    let starts = bookings::bookable_starts(
        &state,
        &resource_id,
        query.date,
        &query.service_id,
        &query.addons(),
        step,
    )?;
    Ok(Json(starts))
}
