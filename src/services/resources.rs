use chrono::NaiveDate;
use rusqlite::TransactionBehavior;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::EngineError;
use crate::models::{ClockTime, Resource, TimeOffBlock, Vacation, WorkingHoursEntry};
use crate::services::identity::Principal;
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct NewResource {
    pub business_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTimeOff {
    pub date: NaiveDate,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewVacation {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub reason: Option<String>,
}

fn load(db: &rusqlite::Connection, resource_id: &str) -> Result<Resource, EngineError> {
    queries::get_resource(db, resource_id)?
        .ok_or_else(|| EngineError::ResourceNotFound(resource_id.to_string()))
}

/// Business owner, or the employee the resource represents.
fn may_edit(principal: &Principal, resource: &Resource) -> bool {
    principal.is_owner_of_business(&resource.business_id) || principal.is_owner_of_resource(&resource.id)
}

pub fn create_resource(
    state: &AppState,
    principal: &Principal,
    new: NewResource,
) -> Result<Resource, EngineError> {
    if !principal.is_owner_of_business(&new.business_id) {
        return Err(EngineError::Unauthorized);
    }
    let resource = Resource {
        id: uuid::Uuid::new_v4().to_string(),
        business_id: new.business_id,
        name: new.name,
        active: true,
    };
    let db = state.conn()?;
    queries::create_resource(&db, &resource)?;
    tracing::info!(resource_id = %resource.id, business_id = %resource.business_id, "resource created");
    Ok(resource)
}

/// Replace the given weekdays' hours. All entries are validated before any write.
pub fn set_working_hours(
    state: &AppState,
    principal: &Principal,
    resource_id: &str,
    entries: &[WorkingHoursEntry],
) -> Result<Vec<WorkingHoursEntry>, EngineError> {
    for entry in entries {
        entry.validate()?;
    }

    let mut db = state.conn()?;
    let resource = load(&db, resource_id)?;
    if !may_edit(principal, &resource) {
        return Err(EngineError::Unauthorized);
    }

    let tx = db.transaction_with_behavior(TransactionBehavior::Immediate)?;
    for entry in entries {
        queries::upsert_working_hours(&tx, resource_id, entry)?;
    }
    let hours = queries::get_working_hours(&tx, resource_id)?;
    tx.commit()?;

    tracing::info!(%resource_id, updated = entries.len(), "working hours updated");
    Ok(hours)
}

pub fn add_time_off(
    state: &AppState,
    principal: &Principal,
    resource_id: &str,
    new: NewTimeOff,
) -> Result<TimeOffBlock, EngineError> {
    if new.start_time >= new.end_time {
        return Err(EngineError::InvalidTimeFormat(format!(
            "time off {}-{} ends before it starts",
            new.start_time, new.end_time
        )));
    }

    let db = state.conn()?;
    let resource = load(&db, resource_id)?;
    if !may_edit(principal, &resource) {
        return Err(EngineError::Unauthorized);
    }

    let block = TimeOffBlock {
        id: uuid::Uuid::new_v4().to_string(),
        resource_id: resource_id.to_string(),
        date: new.date,
        start_time: new.start_time,
        end_time: new.end_time,
        reason: new.reason,
    };
    queries::insert_time_off(&db, &block)?;
    tracing::info!(time_off_id = %block.id, %resource_id, date = %block.date, "time off added");
    Ok(block)
}

pub fn delete_time_off(
    state: &AppState,
    principal: &Principal,
    time_off_id: &str,
) -> Result<(), EngineError> {
    let db = state.conn()?;
    let block = queries::get_time_off(&db, time_off_id)?
        .ok_or_else(|| EngineError::NotFound(format!("time off {time_off_id}")))?;
    let resource = load(&db, &block.resource_id)?;
    if !may_edit(principal, &resource) {
        return Err(EngineError::Unauthorized);
    }
    queries::delete_time_off(&db, time_off_id)?;
    tracing::info!(%time_off_id, resource_id = %block.resource_id, "time off removed");
    Ok(())
}

pub fn add_vacation(
    state: &AppState,
    principal: &Principal,
    resource_id: &str,
    new: NewVacation,
) -> Result<Vacation, EngineError> {
    if new.start_date > new.end_date {
        return Err(EngineError::InvalidTimeFormat(format!(
            "vacation {} to {} ends before it starts",
            new.start_date, new.end_date
        )));
    }

    let db = state.conn()?;
    let resource = load(&db, resource_id)?;
    if !may_edit(principal, &resource) {
        return Err(EngineError::Unauthorized);
    }

    let vacation = Vacation {
        id: uuid::Uuid::new_v4().to_string(),
        resource_id: resource_id.to_string(),
        start_date: new.start_date,
        end_date: new.end_date,
        reason: new.reason,
    };
    queries::insert_vacation(&db, &vacation)?;
    tracing::info!(vacation_id = %vacation.id, %resource_id, "vacation added");
    Ok(vacation)
}

/// Resources are never deleted; existing bookings keep pointing at them.
pub fn deactivate_resource(
    state: &AppState,
    principal: &Principal,
    resource_id: &str,
) -> Result<Resource, EngineError> {
    let db = state.conn()?;
    let mut resource = load(&db, resource_id)?;
    if !principal.is_owner_of_business(&resource.business_id) {
        return Err(EngineError::Unauthorized);
    }
    queries::set_resource_active(&db, resource_id, false)?;
    resource.active = false;
    tracing::info!(%resource_id, "resource deactivated");
    Ok(resource)
}
