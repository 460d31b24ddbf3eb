use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{
    Booking, BookingStatus, Resource, TimeOffBlock, Vacation, WorkingHoursEntry,
};

// ── Resources ──

pub fn create_resource(conn: &Connection, resource: &Resource) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO resources (id, business_id, name, active) VALUES (?1, ?2, ?3, ?4)",
        params![resource.id, resource.business_id, resource.name, resource.active],
    )?;
    Ok(())
}

pub fn get_resource(conn: &Connection, id: &str) -> rusqlite::Result<Option<Resource>> {
    conn.query_row(
        "SELECT id, business_id, name, active FROM resources WHERE id = ?1",
        params![id],
        |row| {
            Ok(Resource {
                id: row.get(0)?,
                business_id: row.get(1)?,
                name: row.get(2)?,
                active: row.get(3)?,
            })
        },
    )
    .optional()
}

pub fn set_resource_active(conn: &Connection, id: &str, active: bool) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE resources SET active = ?1 WHERE id = ?2",
        params![active, id],
    )?;
    Ok(count > 0)
}

// ── Working Hours ──

pub fn upsert_working_hours(
    conn: &Connection,
    resource_id: &str,
    entry: &WorkingHoursEntry,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO working_hours (resource_id, day_of_week, open_time, close_time, is_day_off)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(resource_id, day_of_week) DO UPDATE SET
           open_time = excluded.open_time,
           close_time = excluded.close_time,
           is_day_off = excluded.is_day_off",
        params![
            resource_id,
            entry.day_of_week,
            entry.open_time,
            entry.close_time,
            entry.is_day_off,
        ],
    )?;
    Ok(())
}

pub fn get_working_hours(
    conn: &Connection,
    resource_id: &str,
) -> rusqlite::Result<Vec<WorkingHoursEntry>> {
    let mut stmt = conn.prepare(
        "SELECT day_of_week, open_time, close_time, is_day_off
         FROM working_hours WHERE resource_id = ?1 ORDER BY day_of_week ASC",
    )?;

    let rows = stmt.query_map(params![resource_id], |row| {
        Ok(WorkingHoursEntry {
            day_of_week: row.get(0)?,
            open_time: row.get(1)?,
            close_time: row.get(2)?,
            is_day_off: row.get(3)?,
        })
    })?;

    rows.collect()
}

// ── Time Off ──

pub fn insert_time_off(conn: &Connection, block: &TimeOffBlock) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO time_off_blocks (id, resource_id, date, start_time, end_time, reason)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            block.id,
            block.resource_id,
            block.date,
            block.start_time,
            block.end_time,
            block.reason,
        ],
    )?;
    Ok(())
}

pub fn get_time_off(conn: &Connection, id: &str) -> rusqlite::Result<Option<TimeOffBlock>> {
    conn.query_row(
        "SELECT id, resource_id, date, start_time, end_time, reason
         FROM time_off_blocks WHERE id = ?1",
        params![id],
        parse_time_off_row,
    )
    .optional()
}

pub fn delete_time_off(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let count = conn.execute("DELETE FROM time_off_blocks WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn get_time_off_in_range(
    conn: &Connection,
    resource_id: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> rusqlite::Result<Vec<TimeOffBlock>> {
    let mut stmt = conn.prepare(
        "SELECT id, resource_id, date, start_time, end_time, reason
         FROM time_off_blocks WHERE resource_id = ?1 AND date >= ?2 AND date <= ?3
         ORDER BY date ASC, start_time ASC",
    )?;

    let rows = stmt.query_map(params![resource_id, from, to], parse_time_off_row)?;
    rows.collect()
}

fn parse_time_off_row(row: &rusqlite::Row) -> rusqlite::Result<TimeOffBlock> {
    Ok(TimeOffBlock {
        id: row.get(0)?,
        resource_id: row.get(1)?,
        date: row.get(2)?,
        start_time: row.get(3)?,
        end_time: row.get(4)?,
        reason: row.get(5)?,
    })
}

// ── Vacations ──

pub fn insert_vacation(conn: &Connection, vacation: &Vacation) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO vacations (id, resource_id, start_date, end_date, reason)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            vacation.id,
            vacation.resource_id,
            vacation.start_date,
            vacation.end_date,
            vacation.reason,
        ],
    )?;
    Ok(())
}

/// Vacations that intersect the inclusive `[from, to]` date range.
pub fn get_vacations_in_range(
    conn: &Connection,
    resource_id: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> rusqlite::Result<Vec<Vacation>> {
    let mut stmt = conn.prepare(
        "SELECT id, resource_id, start_date, end_date, reason
         FROM vacations WHERE resource_id = ?1 AND start_date <= ?3 AND end_date >= ?2
         ORDER BY start_date ASC",
    )?;

    let rows = stmt.query_map(params![resource_id, from, to], |row| {
        Ok(Vacation {
            id: row.get(0)?,
            resource_id: row.get(1)?,
            start_date: row.get(2)?,
            end_date: row.get(3)?,
            reason: row.get(4)?,
        })
    })?;
    rows.collect()
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "id, business_id, resource_id, requester_id, service_id, addon_ids, \
     date, start_time, end_time, status, previous_date, previous_start, previous_end, \
     changed_at, created_at, updated_at";

pub fn insert_booking(conn: &Connection, booking: &Booking) -> rusqlite::Result<()> {
    let addon_ids = encode_addons(&booking.addon_ids)?;
    conn.execute(
        &format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
        ),
        params![
            booking.id,
            booking.business_id,
            booking.resource_id,
            booking.requester_id,
            booking.service_id,
            addon_ids,
            booking.date,
            booking.start_time,
            booking.end_time,
            booking.status.as_str(),
            booking.previous_date,
            booking.previous_start,
            booking.previous_end,
            booking.changed_at,
            booking.created_at,
            booking.updated_at,
        ],
    )?;
    Ok(())
}

/// Rewrite where a booking sits, together with its single-slot history.
pub fn update_booking_placement(conn: &Connection, booking: &Booking) -> rusqlite::Result<bool> {
    let addon_ids = encode_addons(&booking.addon_ids)?;
    let count = conn.execute(
        "UPDATE bookings SET
           resource_id = ?1, addon_ids = ?2, date = ?3, start_time = ?4, end_time = ?5,
           previous_date = ?6, previous_start = ?7, previous_end = ?8,
           changed_at = ?9, updated_at = ?10
         WHERE id = ?11",
        params![
            booking.resource_id,
            addon_ids,
            booking.date,
            booking.start_time,
            booking.end_time,
            booking.previous_date,
            booking.previous_start,
            booking.previous_end,
            booking.changed_at,
            booking.updated_at,
            booking.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
    now: NaiveDateTime,
) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now, id],
    )?;
    Ok(count > 0)
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<Booking>> {
    conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        parse_booking_row,
    )
    .optional()
}

/// Active bookings for one (resource, date) partition; the conflict guard's re-read.
pub fn get_booked_for_resource_date(
    conn: &Connection,
    resource_id: &str,
    date: NaiveDate,
) -> rusqlite::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE resource_id = ?1 AND date = ?2 AND status = 'booked'
         ORDER BY start_time ASC"
    ))?;

    let rows = stmt.query_map(params![resource_id, date], parse_booking_row)?;
    rows.collect()
}

/// Everything a business calendar shows for a date: all non-cancelled bookings.
pub fn get_bookings_for_business_date(
    conn: &Connection,
    business_id: &str,
    date: NaiveDate,
) -> rusqlite::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE business_id = ?1 AND date = ?2 AND status != 'cancelled'
         ORDER BY resource_id ASC, start_time ASC"
    ))?;

    let rows = stmt.query_map(params![business_id, date], parse_booking_row)?;
    rows.collect()
}

fn parse_booking_row(row: &rusqlite::Row) -> rusqlite::Result<Booking> {
    let addon_json: String = row.get(5)?;
    let addon_ids: Vec<String> = serde_json::from_str(&addon_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

    let status_str: String = row.get(9)?;
    let status = BookingStatus::parse(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            9,
            Type::Text,
            format!("unknown booking status: {status_str}").into(),
        )
    })?;

    Ok(Booking {
        id: row.get(0)?,
        business_id: row.get(1)?,
        resource_id: row.get(2)?,
        requester_id: row.get(3)?,
        service_id: row.get(4)?,
        addon_ids,
        date: row.get(6)?,
        start_time: row.get(7)?,
        end_time: row.get(8)?,
        status,
        previous_date: row.get(10)?,
        previous_start: row.get(11)?,
        previous_end: row.get(12)?,
        changed_at: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

fn encode_addons(addon_ids: &[String]) -> rusqlite::Result<String> {
    serde_json::to_string(addon_ids).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}
