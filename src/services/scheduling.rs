use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, TransactionBehavior};

use crate::db::queries;
use crate::errors::EngineError;
use crate::models::{Booking, BookingStatus, ClockTime, NewBooking, ProposalOutcome, TimeRange};
use crate::services::constraints;

#[derive(Debug, Clone)]
pub enum ProposalTarget {
    Create(NewBooking),
    /// Move/resize an existing booking, optionally replacing its add-ons.
    Reschedule {
        booking_id: String,
        addon_ids: Option<Vec<String>>,
    },
}

/// A candidate placement on one resource's day.
#[derive(Debug, Clone)]
pub struct Proposal {
    pub target: ProposalTarget,
    pub resource_id: String,
    pub date: NaiveDate,
    pub start: ClockTime,
    pub end: ClockTime,
    /// Skip the overlap check. Staff override only; the result may double-book.
    pub force: bool,
}

impl Proposal {
    fn range(&self) -> Result<TimeRange, EngineError> {
        TimeRange::new(self.start, self.end).map_err(|_| {
            EngineError::InvalidDuration(format!("{}-{} is empty", self.start, self.end))
        })
    }
}

/// Run `op`, retrying once on a transient failure. Each attempt re-reads state.
fn with_retry<T>(
    conn: &mut Connection,
    op: impl Fn(&mut Connection) -> Result<T, EngineError>,
) -> Result<T, EngineError> {
    match op(conn) {
        Err(EngineError::Transient(reason)) => {
            tracing::warn!(%reason, "transaction failed transiently, retrying once");
            op(conn)
        }
        other => other,
    }
}

/// Check a proposal against the resource's current bookings and write it if it fits.
///
/// Runs inside one write-locked transaction, so decisions for a (resource, date)
/// are linearizable. A day-off, vacation or deactivated resource rejects the
/// proposal even when `force` is set.
///
/// Only other bookings count as conflicts. Working hours and time-off blocks are
/// not enforced here: a placement outside hours or over a blocked range is
/// accepted without `force`. Availability is where those show up.
pub fn propose_booking(
    conn: &mut Connection,
    proposal: &Proposal,
) -> Result<ProposalOutcome, EngineError> {
    proposal.range()?;
    with_retry(conn, |conn| try_propose(conn, proposal))
}

fn try_propose(conn: &mut Connection, p: &Proposal) -> Result<ProposalOutcome, EngineError> {
    let range = p.range()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let now = Utc::now().naive_utc();

    let resource = queries::get_resource(&tx, &p.resource_id)?
        .ok_or_else(|| EngineError::ResourceNotFound(p.resource_id.clone()))?;
    let window = constraints::day_constraints(&tx, &p.resource_id, p.date)?.window_for(p.date);
    if !resource.active || window.is_day_off() {
        return Err(EngineError::ResourceUnavailable {
            resource_id: p.resource_id.clone(),
            date: p.date,
        });
    }

    let existing = match &p.target {
        ProposalTarget::Create(_) => None,
        ProposalTarget::Reschedule { booking_id, .. } => {
            let booking = queries::get_booking_by_id(&tx, booking_id)?
                .ok_or_else(|| EngineError::BookingNotFound(booking_id.clone()))?;
            if booking.status.is_terminal() {
                return Err(EngineError::InvalidTransition {
                    id: booking.id,
                    status: booking.status,
                });
            }
            if booking.business_id != resource.business_id {
                // Bookings never move between businesses.
                return Err(EngineError::ResourceNotFound(p.resource_id.clone()));
            }
            Some(booking)
        }
    };

    let booked = queries::get_booked_for_resource_date(&tx, &p.resource_id, p.date)?;
    let collision = booked
        .iter()
        .filter(|b| existing.as_ref().map_or(true, |e| e.id != b.id))
        .find(|b| b.range().overlaps(&range));

    if let Some(conflict) = collision {
        if !p.force {
            tracing::info!(
                resource_id = %p.resource_id,
                date = %p.date,
                conflicting_booking_id = %conflict.id,
                "proposal rejected: overlap"
            );
            return Ok(ProposalOutcome::Rejected {
                conflicting_booking_id: conflict.id.clone(),
            });
        }
        tracing::warn!(
            resource_id = %p.resource_id,
            date = %p.date,
            conflicting_booking_id = %conflict.id,
            "force override: accepting overlapping booking"
        );
    }

    let booking = match &p.target {
        ProposalTarget::Create(new) => {
            let booking = Booking {
                id: uuid::Uuid::new_v4().to_string(),
                business_id: resource.business_id.clone(),
                resource_id: p.resource_id.clone(),
                requester_id: new.requester_id.clone(),
                service_id: new.service_id.clone(),
                addon_ids: new.addon_ids.clone(),
                date: p.date,
                start_time: p.start,
                end_time: p.end,
                status: BookingStatus::Booked,
                previous_date: None,
                previous_start: None,
                previous_end: None,
                changed_at: None,
                created_at: now,
                updated_at: now,
            };
            queries::insert_booking(&tx, &booking)?;
            booking
        }
        ProposalTarget::Reschedule {
            booking_id,
            addon_ids,
        } => {
            let mut booking =
                existing.ok_or_else(|| EngineError::BookingNotFound(booking_id.clone()))?;
            booking.previous_date = Some(booking.date);
            booking.previous_start = Some(booking.start_time);
            booking.previous_end = Some(booking.end_time);
            booking.changed_at = Some(now);
            booking.updated_at = now;
            booking.resource_id = p.resource_id.clone();
            booking.date = p.date;
            booking.start_time = p.start;
            booking.end_time = p.end;
            if let Some(addons) = addon_ids {
                booking.addon_ids = addons.clone();
            }
            queries::update_booking_placement(&tx, &booking)?;
            booking
        }
    };

    tx.commit()?;

    tracing::info!(
        booking_id = %booking.id,
        resource_id = %booking.resource_id,
        date = %booking.date,
        start = %booking.start_time,
        end = %booking.end_time,
        force = p.force,
        "proposal accepted"
    );
    Ok(ProposalOutcome::Accepted { booking })
}

pub fn cancel_booking(conn: &mut Connection, id: &str) -> Result<Booking, EngineError> {
    with_retry(conn, |conn| transition(conn, id, BookingStatus::Cancelled))
}

pub fn finish_booking(conn: &mut Connection, id: &str) -> Result<Booking, EngineError> {
    with_retry(conn, |conn| transition(conn, id, BookingStatus::Finished))
}

/// booked → cancelled | finished. Both targets are terminal.
fn transition(conn: &mut Connection, id: &str, to: BookingStatus) -> Result<Booking, EngineError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut booking = queries::get_booking_by_id(&tx, id)?
        .ok_or_else(|| EngineError::BookingNotFound(id.to_string()))?;
    if booking.status.is_terminal() {
        return Err(EngineError::InvalidTransition {
            id: booking.id,
            status: booking.status,
        });
    }

    let now = Utc::now().naive_utc();
    queries::update_booking_status(&tx, id, to, now)?;
    tx.commit()?;

    booking.status = to;
    booking.updated_at = now;
    tracing::info!(booking_id = %id, status = %to, "booking status changed");
    Ok(booking)
}

pub fn get_booking(conn: &Connection, id: &str) -> Result<Booking, EngineError> {
    queries::get_booking_by_id(conn, id)?.ok_or_else(|| EngineError::BookingNotFound(id.to_string()))
}
