use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::EngineError;
use crate::models::{
    Booking, ChangeEvent, ChangeKind, ClockTime, Minutes, NewBooking, ProposalOutcome, Slot,
};
use crate::services::availability;
use crate::services::catalog::{booking_minutes, Catalog};
use crate::services::identity::Principal;
use crate::services::scheduling::{self, Proposal, ProposalTarget};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub resource_id: String,
    pub service_id: String,
    #[serde(default)]
    pub addon_ids: Vec<String>,
    pub date: NaiveDate,
    pub start_time: ClockTime,
    #[serde(default)]
    pub force: bool,
    /// Staff booking on behalf of a client. Defaults to the caller.
    #[serde(default)]
    pub requester_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RescheduleRequest {
    /// Target resource; the booking's current one when absent.
    #[serde(default)]
    pub resource_id: Option<String>,
    pub date: NaiveDate,
    pub start_time: ClockTime,
    #[serde(default)]
    pub addon_ids: Option<Vec<String>>,
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Availability {
    pub resource_id: String,
    pub date: NaiveDate,
    pub duration_minutes: Minutes,
    pub slots: Vec<Slot>,
}

/// Start + catalog duration, which must stay inside the day.
fn end_time(
    catalog: &dyn Catalog,
    service_id: &str,
    addon_ids: &[String],
    start: ClockTime,
) -> Result<ClockTime, EngineError> {
    let minutes = booking_minutes(catalog, service_id, addon_ids)?;
    start.checked_add(minutes).ok_or_else(|| {
        EngineError::InvalidDuration(format!("{minutes} minutes from {start} runs past midnight"))
    })
}

pub fn availability(
    state: &AppState,
    resource_id: &str,
    date: NaiveDate,
    service_id: &str,
    addon_ids: &[String],
) -> Result<Availability, EngineError> {
    let duration = booking_minutes(state.catalog.as_ref(), service_id, addon_ids)?;
    let slots = {
        let db = state.conn()?;
        availability::compute_availability(&db, resource_id, date, duration)?
    };
    Ok(Availability {
        resource_id: resource_id.to_string(),
        date,
        duration_minutes: duration,
        slots,
    })
}

/// Candidate start times for the service, `step` minutes apart.
pub fn bookable_starts(
    state: &AppState,
    resource_id: &str,
    date: NaiveDate,
    service_id: &str,
    addon_ids: &[String],
    step: Minutes,
) -> Result<Vec<ClockTime>, EngineError> {
    let view = availability(state, resource_id, date, service_id, addon_ids)?;
    Ok(availability::bookable_starts(
        &view.slots,
        view.duration_minutes,
        step,
    ))
}

pub fn create_booking(
    state: &AppState,
    principal: &Principal,
    req: CreateBookingRequest,
) -> Result<ProposalOutcome, EngineError> {
    let end = end_time(state.catalog.as_ref(), &req.service_id, &req.addon_ids, req.start_time)?;

    let mut db = state.conn()?;
    let resource = queries::get_resource(&db, &req.resource_id)?
        .ok_or_else(|| EngineError::ResourceNotFound(req.resource_id.clone()))?;

    let on_behalf = req.requester_id.as_deref().is_some_and(|id| id != principal.id);
    if on_behalf && !principal.is_staff_for_business(&resource.business_id) {
        return Err(EngineError::Unauthorized);
    }
    if req.force && !principal.may_force(&resource.business_id, &resource.id) {
        tracing::warn!(principal = %principal.id, resource_id = %resource.id, "force denied");
        return Err(EngineError::Unauthorized);
    }

    let proposal = Proposal {
        target: ProposalTarget::Create(NewBooking {
            requester_id: req.requester_id.unwrap_or_else(|| principal.id.clone()),
            service_id: req.service_id,
            addon_ids: req.addon_ids,
        }),
        resource_id: req.resource_id,
        date: req.date,
        start: req.start_time,
        end,
        force: req.force,
    };
    let outcome = scheduling::propose_booking(&mut db, &proposal)?;
    drop(db);

    if let ProposalOutcome::Accepted { booking } = &outcome {
        state
            .hub
            .publish(ChangeEvent::new(ChangeKind::Created, booking.clone()));
    }
    Ok(outcome)
}

/// The requester, business staff or the booked employee may change a booking.
fn may_mutate(principal: &Principal, booking: &Booking) -> bool {
    principal.id == booking.requester_id
        || principal.is_staff_for_business(&booking.business_id)
        || principal.is_owner_of_resource(&booking.resource_id)
}

pub fn reschedule_booking(
    state: &AppState,
    principal: &Principal,
    booking_id: &str,
    req: RescheduleRequest,
) -> Result<ProposalOutcome, EngineError> {
    let mut db = state.conn()?;
    let current = scheduling::get_booking(&db, booking_id)?;
    if !may_mutate(principal, &current) {
        return Err(EngineError::Unauthorized);
    }

    let resource_id = req
        .resource_id
        .unwrap_or_else(|| current.resource_id.clone());
    if req.force && !principal.may_force(&current.business_id, &resource_id) {
        tracing::warn!(principal = %principal.id, %booking_id, "force denied");
        return Err(EngineError::Unauthorized);
    }

    let addons = req.addon_ids.as_deref().unwrap_or(&current.addon_ids);
    let end = end_time(state.catalog.as_ref(), &current.service_id, addons, req.start_time)?;

    let proposal = Proposal {
        target: ProposalTarget::Reschedule {
            booking_id: booking_id.to_string(),
            addon_ids: req.addon_ids,
        },
        resource_id,
        date: req.date,
        start: req.start_time,
        end,
        force: req.force,
    };
    let outcome = scheduling::propose_booking(&mut db, &proposal)?;
    drop(db);

    if let ProposalOutcome::Accepted { booking } = &outcome {
        let event = ChangeEvent::new(ChangeKind::Updated, booking.clone())
            .with_previous(current.resource_id, current.date);
        state.hub.publish(event);
    }
    Ok(outcome)
}

pub fn cancel_booking(
    state: &AppState,
    principal: &Principal,
    booking_id: &str,
) -> Result<Booking, EngineError> {
    let mut db = state.conn()?;
    let current = scheduling::get_booking(&db, booking_id)?;
    if !may_mutate(principal, &current) {
        return Err(EngineError::Unauthorized);
    }
    let booking = scheduling::cancel_booking(&mut db, booking_id)?;
    drop(db);

    state
        .hub
        .publish(ChangeEvent::new(ChangeKind::Cancelled, booking.clone()));
    Ok(booking)
}

/// Staff only. Published as an update.
pub fn finish_booking(
    state: &AppState,
    principal: &Principal,
    booking_id: &str,
) -> Result<Booking, EngineError> {
    let mut db = state.conn()?;
    let current = scheduling::get_booking(&db, booking_id)?;
    if !principal.is_staff_for_business(&current.business_id)
        && !principal.is_owner_of_resource(&current.resource_id)
    {
        return Err(EngineError::Unauthorized);
    }
    let booking = scheduling::finish_booking(&mut db, booking_id)?;
    drop(db);

    state
        .hub
        .publish(ChangeEvent::new(ChangeKind::Updated, booking.clone()));
    Ok(booking)
}

/// Non-cancelled bookings of a business on one date. Used by calendar re-fetches.
pub fn list_bookings(
    state: &AppState,
    principal: &Principal,
    business_id: &str,
    date: NaiveDate,
) -> Result<Vec<Booking>, EngineError> {
    if !principal.is_staff_for_business(business_id) && principal.resource_id.is_none() {
        return Err(EngineError::Unauthorized);
    }
    let db = state.conn()?;
    let bookings = queries::get_bookings_for_business_date(&db, business_id, date)?;
    if principal.is_staff_for_business(business_id) {
        return Ok(bookings);
    }
    // An employee outside the staff list sees only their own column.
    Ok(bookings
        .into_iter()
        .filter(|b| principal.is_owner_of_resource(&b.resource_id))
        .collect())
}
