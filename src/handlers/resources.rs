use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use crate::errors::AppError;
use crate::models::{Resource, TimeOffBlock, Vacation, WorkingHoursEntry};
use crate::services::resources::{self, NewResource, NewTimeOff, NewVacation};
use crate::state::AppState;

use super::authenticate;

// POST /api/resources
pub async fn create_resource(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<NewResource>,
) -> Result<(StatusCode, Json<Resource>), AppError> {
    let principal = authenticate(&state, &headers).await?;
    if body.name.trim().is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }
    let resource = resources::create_resource(&state, &principal, body)?;
    Ok((StatusCode::CREATED, Json(resource)))
}

// PUT /api/resources/:id/working-hours
pub async fn set_working_hours(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(resource_id): Path<String>,
    Json(body): Json<Vec<WorkingHoursEntry>>,
) -> Result<Json<Vec<WorkingHoursEntry>>, AppError> {
    let principal = authenticate(&state, &headers).await?;
    Ok(Json(resources::set_working_hours(
        &state,
        &principal,
        &resource_id,
        &body,
    )?))
}

// POST /api/resources/:id/time-off
pub async fn add_time_off(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(resource_id): Path<String>,
    Json(body): Json<NewTimeOff>,
) -> Result<(StatusCode, Json<TimeOffBlock>), AppError> {
    let principal = authenticate(&state, &headers).await?;
    let block = resources::add_time_off(&state, &principal, &resource_id, body)?;
    Ok((StatusCode::CREATED, Json(block)))
}

// DELETE /api/time-off/:id
pub async fn delete_time_off(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(time_off_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let principal = authenticate(&state, &headers).await?;
    resources::delete_time_off(&state, &principal, &time_off_id)?;
    Ok(StatusCode::NO_CONTENT)
}

// POST /api/resources/:id/vacations
pub async fn add_vacation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(resource_id): Path<String>,
    Json(body): Json<NewVacation>,
) -> Result<(StatusCode, Json<Vacation>), AppError> {
    let principal = authenticate(&state, &headers).await?;
    let vacation = resources::add_vacation(&state, &principal, &resource_id, body)?;
    Ok((StatusCode::CREATED, Json(vacation)))
}

// POST /api/resources/:id/deactivate
pub async fn deactivate_resource(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(resource_id): Path<String>,
) -> Result<Json<Resource>, AppError> {
    let principal = authenticate(&state, &headers).await?;
    Ok(Json(resources::deactivate_resource(
        &state,
        &principal,
        &resource_id,
    )?))
}
